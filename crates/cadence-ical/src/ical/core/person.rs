//! Attendees and organizers attached to schedulable components.

use std::fmt;

use crate::error::{CalendarError, CalendarResult};

const ROLES: [&str; 4] = [
    "CHAIR",
    "REQ-PARTICIPANT",
    "OPT-PARTICIPANT",
    "NON-PARTICIPANT",
];

const PARTICIPATION_STATUSES: [&str; 7] = [
    "NEEDS-ACTION",
    "TENTATIVE",
    "ACCEPTED",
    "DECLINED",
    "DELEGATED",
    "IN-PROCESS",
    "COMPLETED",
];

/// Which property a person was carried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    Organizer,
    Attendee,
}

impl PersonKind {
    /// The property name this kind renders as.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizer => "ORGANIZER",
            Self::Attendee => "ATTENDEE",
        }
    }
}

/// One `ATTENDEE` or `ORGANIZER` entry.
///
/// People are identified by their mail address; the optional parameters
/// (`ROLE`, `PARTSTAT`, `CN`, `DIR`) refine the entry. Role and
/// participation status are validated against their enumerations at the
/// point of assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    kind: PersonKind,
    mailto: String,
    common_name: Option<String>,
    role: Option<String>,
    participation_status: Option<String>,
    directory: Option<String>,
}

impl Person {
    /// A person with just an address, no parameters.
    #[must_use]
    pub fn new(kind: PersonKind, mailto: String) -> Self {
        Self {
            kind,
            mailto,
            common_name: None,
            role: None,
            participation_status: None,
            directory: None,
        }
    }

    /// Parses a full `ATTENDEE`/`ORGANIZER` property line.
    ///
    /// Parameters are read up to their first colon, so a `CN` that precedes
    /// the `MAILTO:` value does not swallow the address. Unknown parameters
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the line has no `MAILTO:` value or
    /// carries a role or participation status outside its enumeration.
    pub fn parse(kind: PersonKind, line: &str) -> CalendarResult<Self> {
        let mailto_index = line.rfind("MAILTO:").ok_or_else(|| CalendarError::Validation {
            field: kind.as_str(),
            reason: format!("missing MAILTO value in {line}"),
        })?;
        let mailto = line
            .get(mailto_index + "MAILTO:".len()..)
            .unwrap_or("")
            .to_owned();
        let mut person = Self::new(kind, mailto);
        for param in line.split(';').skip(1) {
            let head = param.split_once(':').map_or(param, |(head, _)| head);
            if let Some(role) = head.strip_prefix("ROLE=") {
                person.set_role(role)?;
            } else if let Some(status) = head.strip_prefix("PARTSTAT=") {
                person.set_participation_status(status)?;
            } else if let Some(name) = head.strip_prefix("CN=") {
                person.common_name = Some(name.to_owned());
            } else if let Some(directory) = head.strip_prefix("DIR=") {
                person.directory = Some(directory.trim_matches('"').to_owned());
            } else {
                // Unknown parameters are ignored.
            }
        }
        Ok(person)
    }

    /// Sets the role.
    ///
    /// # Errors
    ///
    /// Returns a validation error for values outside the role enumeration.
    pub fn set_role(&mut self, role: &str) -> CalendarResult<()> {
        if !ROLES.contains(&role) {
            return Err(CalendarError::Validation {
                field: "ROLE",
                reason: format!("unknown role {role}"),
            });
        }
        self.role = Some(role.to_owned());
        Ok(())
    }

    /// Sets the participation status.
    ///
    /// # Errors
    ///
    /// Returns a validation error for values outside the participation
    /// status enumeration.
    pub fn set_participation_status(&mut self, status: &str) -> CalendarResult<()> {
        if !PARTICIPATION_STATUSES.contains(&status) {
            return Err(CalendarError::Validation {
                field: "PARTSTAT",
                reason: format!("unknown participation status {status}"),
            });
        }
        self.participation_status = Some(status.to_owned());
        Ok(())
    }

    pub fn set_common_name(&mut self, name: String) {
        self.common_name = Some(name);
    }

    pub fn set_directory(&mut self, directory: String) {
        self.directory = Some(directory);
    }

    #[must_use]
    pub fn kind(&self) -> PersonKind {
        self.kind
    }

    #[must_use]
    pub fn mailto(&self) -> &str {
        &self.mailto
    }

    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    #[must_use]
    pub fn participation_status(&self) -> Option<&str> {
        self.participation_status.as_deref()
    }

    #[must_use]
    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }
}

impl fmt::Display for Person {
    /// Renders the property line. The directory parameter is parse-only and
    /// never rendered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        if let Some(role) = &self.role {
            write!(f, ";ROLE={role}")?;
        }
        if let Some(status) = &self.participation_status {
            write!(f, ";PARTSTAT={status}")?;
        }
        if let Some(name) = &self.common_name {
            write!(f, ";CN={name}")?;
        }
        write!(f, ":MAILTO:{}", self.mailto)
    }
}
