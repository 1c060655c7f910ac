//! The calendar's timezone block and its seasonal transition rules.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::{OffsetComponents, OffsetName, Tz};

use crate::error::{CalendarError, CalendarResult};

use super::rrule::{Frequency, RecurrenceRule, by_day_parts};
use super::timestamp::Timestamp;

/// A `VTIMEZONE` block: a zone identifier plus the yearly rules describing
/// when standard and daylight time begin.
///
/// Fresh blocks carry placeholder rules (standard time starting the last
/// Sunday of September, daylight time the last Sunday of March); parsed
/// documents overwrite them with whatever the document declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTimeZone {
    tz: Tz,
    standard_rule: RecurrenceRule,
    daylight_rule: RecurrenceRule,
}

impl VTimeZone {
    /// A timezone block for `tz` with the placeholder transition rules.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        let mut standard_rule = RecurrenceRule::new();
        standard_rule.set_frequency(Frequency::Yearly);
        standard_rule.add_by_month(9);
        standard_rule.add_by_day_entry(Some(-1), Weekday::Sun);

        let mut daylight_rule = RecurrenceRule::new();
        daylight_rule.set_frequency(Frequency::Yearly);
        daylight_rule.add_by_month(3);
        daylight_rule.add_by_day_entry(Some(-1), Weekday::Sun);

        Self {
            tz,
            standard_rule,
            daylight_rule,
        }
    }

    /// Looks up a zone by its identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the identifier is not a known zone.
    pub fn from_tzid(tzid: &str) -> CalendarResult<Self> {
        let tz = tzid
            .trim()
            .parse::<Tz>()
            .map_err(|_e| CalendarError::Validation {
                field: "TZID",
                reason: format!("unknown timezone {tzid}"),
            })?;
        Ok(Self::new(tz))
    }

    #[must_use]
    pub fn zone(&self) -> Tz {
        self.tz
    }

    #[must_use]
    pub fn standard_rule(&self) -> &RecurrenceRule {
        &self.standard_rule
    }

    #[must_use]
    pub fn daylight_rule(&self) -> &RecurrenceRule {
        &self.daylight_rule
    }

    pub fn set_standard_rule(&mut self, rule: RecurrenceRule) {
        self.standard_rule = rule;
    }

    pub fn set_daylight_rule(&mut self, rule: RecurrenceRule) {
        self.daylight_rule = rule;
    }

    /// The zone's base UTC offset in whole hours, daylight saving excluded.
    fn base_offset_hours(&self) -> i64 {
        let now = Utc::now().naive_utc();
        self.tz
            .offset_from_utc_datetime(&now)
            .base_utc_offset()
            .num_hours()
    }

    /// This year's first transition instant described by `rule`: the nth (or
    /// last, for ordinal -1) matching weekday of the rule's month, at 02:00
    /// local time.
    fn transition_start(&self, rule: &RecurrenceRule) -> Option<Timestamp> {
        if rule.frequency() != Frequency::Yearly {
            return None;
        }
        let month = rule.by_month().first().copied()?;
        let month = u32::try_from(month).ok().filter(|m| (1..=12).contains(m))?;
        let token = rule.by_day().first()?;
        let (ordinal, weekday) = by_day_parts(token)?;
        let year = Utc::now().year();
        let date = match ordinal {
            Some(-1) => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 5)
                .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4))?,
            Some(n) => {
                let nth = u8::try_from(n).ok()?;
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth)?
            }
            None => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 1)?,
        };
        Timestamp::from_local(self.tz, date.year(), date.month(), date.day(), 2, 0, 0)
    }

    /// Zone abbreviations for standard and daylight time, probed mid-winter
    /// and mid-summer. Zones without daylight saving fall back to the zone
    /// identifier for the daylight name.
    fn seasonal_names(&self) -> (String, String) {
        let fallback = self.tz.name().to_owned();
        let mut standard = fallback.clone();
        let mut daylight = fallback;
        let year = Utc::now().year();
        for (month, day) in [(1, 15), (7, 15)] {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            let offset = self.tz.offset_from_utc_datetime(&date.and_time(NaiveTime::MIN));
            let Some(name) = offset.abbreviation() else {
                continue;
            };
            if offset.dst_offset().is_zero() {
                standard = name.to_owned();
            } else {
                daylight = name.to_owned();
            }
        }
        (standard, daylight)
    }
}

impl Default for VTimeZone {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

fn offset_string(hours: i64) -> String {
    let sign = if hours < 0 { '-' } else { '+' };
    format!("{sign}{:02}00", hours.unsigned_abs())
}

impl fmt::Display for VTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base_offset_hours();
        let (standard_name, daylight_name) = self.seasonal_names();

        write!(f, "BEGIN:VTIMEZONE\r\n")?;
        write!(f, "TZID:{}\r\n", self.tz.name())?;

        write!(f, "BEGIN:DAYLIGHT\r\n")?;
        write!(f, "TZNAME:{daylight_name}\r\n")?;
        if let Some(start) = self.transition_start(&self.daylight_rule) {
            write!(f, "DTSTART:{}\r\n", start.to_local_string())?;
        }
        write!(f, "TZOFFSETFROM:{}\r\n", offset_string(base))?;
        write!(f, "TZOFFSETTO:{}\r\n", offset_string(base + 1))?;
        write!(f, "RRULE:{}\r\n", self.daylight_rule)?;
        write!(f, "END:DAYLIGHT\r\n")?;

        write!(f, "BEGIN:STANDARD\r\n")?;
        write!(f, "TZNAME:{standard_name}\r\n")?;
        if let Some(start) = self.transition_start(&self.standard_rule) {
            write!(f, "DTSTART:{}\r\n", start.to_local_string())?;
        }
        write!(f, "TZOFFSETFROM:{}\r\n", offset_string(base + 1))?;
        write!(f, "TZOFFSETTO:{}\r\n", offset_string(base))?;
        write!(f, "RRULE:{}\r\n", self.standard_rule)?;
        write!(f, "END:STANDARD\r\n")?;

        write!(f, "END:VTIMEZONE\r\n")
    }
}
