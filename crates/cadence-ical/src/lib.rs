//! Calendar document parsing, rendering, and recurrence expansion.
//!
//! The crate models an iCalendar document as a [`ical::Calendar`] store of
//! events, todos, and journals keyed by UID, expands recurrence rules into
//! concrete occurrence periods, and renders everything back to CRLF wire
//! text.

pub mod error;
pub mod ical;
