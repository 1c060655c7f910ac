//! Recurrence expansion.

mod occurrence;

pub use occurrence::expand;
