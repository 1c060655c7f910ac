//! Text-to-model parsing for calendar documents.

mod parser;
mod values;

pub use parser::parse;
