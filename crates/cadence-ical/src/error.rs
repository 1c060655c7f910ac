use thiserror::Error;

/// Calendar-level errors.
///
/// Validation failures are raised at the point of assignment, parse failures
/// abort the document being parsed, and lookups by UID report misses
/// distinctly so callers can branch on them.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// A setter was handed a value outside its allowed domain.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Property or field that rejected the value.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A property line could not be applied to the component being built.
    #[error("{component}: bad {field} line: {raw_line}")]
    Parse {
        /// Component type being parsed (for example `VEVENT`).
        component: &'static str,
        /// Property the line was routed to.
        field: &'static str,
        /// The offending input line, verbatim.
        raw_line: String,
    },

    /// A lookup by UID found nothing.
    #[error("No component with uid {uid}")]
    NotFound {
        /// The UID that was requested.
        uid: String,
    },
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
