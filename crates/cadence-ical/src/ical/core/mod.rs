//! Value types shared across the calendar model.

mod alarm;
mod component;
mod duration;
mod freebusy;
mod period;
mod person;
mod rrule;
mod timestamp;
mod timezone;

pub use alarm::{Alarm, Trigger, TriggerValue};
pub use component::{Schedulable, ScheduleKind};
pub use duration::IcalDuration;
pub use freebusy::VFreeBusy;
pub use period::Period;
pub use person::{Person, PersonKind};
pub use rrule::{Frequency, RecurrenceRule};
pub use timestamp::Timestamp;
pub use timezone::VTimeZone;

pub(crate) use rrule::by_day_parts;
