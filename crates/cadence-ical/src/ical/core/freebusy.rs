//! Free/busy blocks listing the busy intervals of a schedule.

use std::collections::BTreeMap;
use std::fmt;

use super::period::Period;
use super::person::Person;
use super::timestamp::Timestamp;

/// A `VFREEBUSY` block: query bounds, the people involved, and the busy
/// intervals found between those bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VFreeBusy {
    dtstart: Option<Timestamp>,
    dtend: Option<Timestamp>,
    attendees: BTreeMap<String, Person>,
    organizers: BTreeMap<String, Person>,
    busy: Vec<Period>,
}

impl VFreeBusy {
    /// An empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dtstart(&mut self, dtstart: Timestamp) {
        self.dtstart = Some(dtstart);
    }

    pub fn set_dtend(&mut self, dtend: Timestamp) {
        self.dtend = Some(dtend);
    }

    /// Adds an attendee, keyed (and deduplicated) by mail address.
    pub fn add_attendee(&mut self, person: Person) {
        self.attendees.insert(person.mailto().to_owned(), person);
    }

    /// Adds an organizer, keyed (and deduplicated) by mail address.
    pub fn add_organizer(&mut self, person: Person) {
        self.organizers.insert(person.mailto().to_owned(), person);
    }

    pub fn add_busy(&mut self, period: Period) {
        self.busy.push(period);
    }

    pub fn add_all_busy(&mut self, periods: Vec<Period>) {
        self.busy.extend(periods);
    }

    #[must_use]
    pub fn dtstart(&self) -> Option<Timestamp> {
        self.dtstart
    }

    #[must_use]
    pub fn dtend(&self) -> Option<Timestamp> {
        self.dtend
    }

    #[must_use]
    pub fn busy(&self) -> &[Period] {
        &self.busy
    }

    #[must_use]
    pub fn attendees(&self) -> &BTreeMap<String, Person> {
        &self.attendees
    }

    #[must_use]
    pub fn organizers(&self) -> &BTreeMap<String, Person> {
        &self.organizers
    }
}

impl fmt::Display for VFreeBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VFREEBUSY\r\n")?;
        for attendee in self.attendees.values() {
            write!(f, "{attendee}\r\n")?;
        }
        for organizer in self.organizers.values() {
            write!(f, "{organizer}\r\n")?;
        }
        if let Some(start) = self.dtstart {
            write!(f, "{}\r\n", start.to_zoned_property("DTSTART"))?;
        }
        if let Some(end) = self.dtend {
            write!(f, "{}\r\n", end.to_zoned_property("DTEND"))?;
        }
        for busy in &self.busy {
            write!(
                f,
                "FREEBUSY;FBTYPE=BUSY-UNAVAILABLE:{}/{}\r\n",
                busy.start().to_utc_string(),
                busy.end().to_utc_string()
            )?;
        }
        write!(f, "END:VFREEBUSY\r\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::super::person::PersonKind;
    use super::*;

    fn ts(value: &str) -> Timestamp {
        Timestamp::parse(value, Tz::UTC).expect("fixture timestamp should parse")
    }

    #[test]
    fn empty_block_renders_bare() {
        assert_eq!(
            VFreeBusy::new().to_string(),
            "BEGIN:VFREEBUSY\r\nEND:VFREEBUSY\r\n"
        );
    }

    #[test]
    fn render_lists_busy_intervals_in_utc() {
        let mut block = VFreeBusy::new();
        block.set_dtstart(ts("20240115"));
        block.set_dtend(ts("20240116"));
        block.add_attendee(Person::new(
            PersonKind::Attendee,
            "jane@example.com".to_owned(),
        ));
        block.add_busy(
            Period::new(ts("20240115T100000"), ts("20240115T110000")).expect("should build"),
        );

        assert_eq!(
            block.to_string(),
            "BEGIN:VFREEBUSY\r\n\
             ATTENDEE:MAILTO:jane@example.com\r\n\
             DTSTART;TZID=UTC:20240115\r\n\
             DTEND;TZID=UTC:20240116\r\n\
             FREEBUSY;FBTYPE=BUSY-UNAVAILABLE:20240115T100000Z/20240115T110000Z\r\n\
             END:VFREEBUSY\r\n"
        );
    }
}
