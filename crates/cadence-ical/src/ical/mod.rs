//! iCalendar document model, parser, and recurrence engine.
//!
//! This module provides calendar parsing, rendering, and queries:
//!
//! - `core`: value types for components, timestamps, periods, and rules
//! - `parse`: text-to-model document parsing
//! - `expand`: occurrence expansion for recurring components
//!
//! ## Example
//!
//! ```rust
//! use cadence_ical::ical::Calendar;
//!
//! let input = "BEGIN:VCALENDAR\r\n\
//!              VERSION:2.0\r\n\
//!              BEGIN:VEVENT\r\n\
//!              UID:demo-1\r\n\
//!              SUMMARY:Kickoff\r\n\
//!              DTSTART:20240115T090000Z\r\n\
//!              DTEND:20240115T100000Z\r\n\
//!              END:VEVENT\r\n\
//!              END:VCALENDAR\r\n";
//! let calendar = Calendar::parse(input)?;
//! assert!(calendar.has_event("demo-1"));
//! # Ok::<(), cadence_ical::error::CalendarError>(())
//! ```

mod calendar;
pub mod core;
pub mod expand;
pub mod parse;

#[cfg(test)]
mod tests;

pub use calendar::Calendar;
