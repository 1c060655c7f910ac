//! Alarm blocks nested inside events and todos.

use std::fmt;

use chrono_tz::Tz;

use super::duration::IcalDuration;
use super::timestamp::Timestamp;

/// When a trigger fires: at an absolute moment or relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerValue {
    DateTime(Timestamp),
    Duration(IcalDuration),
}

/// A `TRIGGER` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    value: TriggerValue,
    related: Option<String>,
}

impl Trigger {
    /// An absolute trigger.
    #[must_use]
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            value: TriggerValue::DateTime(timestamp),
            related: None,
        }
    }

    /// A relative trigger, negative durations firing before the parent.
    #[must_use]
    pub fn before_or_after(offset: IcalDuration) -> Self {
        Self {
            value: TriggerValue::Duration(offset),
            related: None,
        }
    }

    /// Parses a full `TRIGGER` line.
    ///
    /// The value shape decides the type: a leading digit reads as a
    /// date-time, anything else as a duration. A `VALUE=` parameter on the
    /// line is not consulted.
    #[must_use]
    pub fn parse(line: &str, tz: Tz) -> Option<Self> {
        let (head, value) = line.split_once(':')?;
        let mut related = None;
        for param in head.split(';').skip(1) {
            if let Some(rel) = param.strip_prefix("RELATED=") {
                related = Some(rel.to_owned());
            }
        }
        let parsed = if value.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
            TriggerValue::DateTime(Timestamp::parse(value, tz)?)
        } else {
            TriggerValue::Duration(IcalDuration::parse(value)?)
        };
        Some(Self {
            value: parsed,
            related,
        })
    }

    pub fn set_related(&mut self, related: String) {
        self.related = Some(related);
    }

    #[must_use]
    pub fn value(&self) -> TriggerValue {
        self.value
    }

    #[must_use]
    pub fn related(&self) -> Option<&str> {
        self.related.as_deref()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRIGGER")?;
        if let Some(related) = &self.related {
            write!(f, ";RELATED={related}")?;
        }
        match self.value {
            TriggerValue::DateTime(at) => {
                write!(f, ";VALUE=DATE-TIME:{}", at.to_utc_string())
            }
            TriggerValue::Duration(offset) => write!(f, ";VALUE=DURATION:{offset}"),
        }
    }
}

/// A `VALARM` block.
///
/// The repeat count is parsed and kept but never rendered back out,
/// matching how these blocks circulate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alarm {
    trigger: Option<Trigger>,
    duration: Option<IcalDuration>,
    action: Option<String>,
    description: Option<String>,
    repeat: u32,
    extended: Vec<String>,
}

impl Alarm {
    /// An empty alarm.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trigger(&mut self, trigger: Trigger) {
        self.trigger = Some(trigger);
    }

    pub fn set_duration(&mut self, duration: IcalDuration) {
        self.duration = Some(duration);
    }

    pub fn set_action(&mut self, action: String) {
        self.action = Some(action);
    }

    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub fn set_repeat(&mut self, repeat: u32) {
        self.repeat = repeat;
    }

    /// Keeps an `X-` extension line verbatim.
    pub fn add_extended(&mut self, line: String) {
        self.extended.push(line);
    }

    #[must_use]
    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    #[must_use]
    pub fn duration(&self) -> Option<IcalDuration> {
        self.duration
    }

    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    #[must_use]
    pub fn extended(&self) -> &[String] {
        &self.extended
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VALARM\r\n")?;
        if let Some(description) = &self.description {
            write!(f, "DESCRIPTION:{description}\r\n")?;
        }
        if let Some(trigger) = &self.trigger {
            write!(f, "{trigger}\r\n")?;
        }
        if let Some(duration) = &self.duration {
            write!(f, "DURATION:{duration}\r\n")?;
        }
        if let Some(action) = &self.action {
            write!(f, "ACTION:{action}\r\n")?;
        }
        for line in &self.extended {
            write!(f, "{line}\r\n")?;
        }
        write!(f, "END:VALARM\r\n")
    }
}
