//! Zone-aware timestamps for calendar values.
//!
//! A [`Timestamp`] is an instant truncated to whole seconds, carrying the
//! timezone its calendar fields are interpreted in. Equality, ordering, and
//! hashing all operate on the instant, so the same moment compares equal
//! regardless of which zone it was parsed in.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

/// An instant with whole-second precision and an associated zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    inner: DateTime<Tz>,
}

impl Timestamp {
    /// Sub-second precision is always discarded on construction.
    fn new(inner: DateTime<Tz>) -> Self {
        let tz = inner.timezone();
        let utc = inner.naive_utc();
        let truncated = utc.with_nanosecond(0).unwrap_or(utc);
        Self {
            inner: tz.from_utc_datetime(&truncated),
        }
    }

    /// The current moment, in UTC.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Utc::now().with_timezone(&Tz::UTC))
    }

    /// Wraps a UTC instant.
    #[must_use]
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self::new(instant.with_timezone(&Tz::UTC))
    }

    /// Builds a timestamp from local calendar fields in the given zone.
    ///
    /// Returns `None` when the fields do not name a representable moment.
    #[must_use]
    pub fn from_local(
        tz: Tz,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        resolve_local(tz, NaiveDateTime::new(date, time)).map(Self::new)
    }

    /// Parses a compact calendar value: `YYYYMMDD` or `YYYYMMDD"T"HHMM[SS]`,
    /// optionally suffixed `Z`.
    ///
    /// A trailing `Z` forces UTC interpretation regardless of the ambient
    /// zone; otherwise the fields are read as local time in `tz`. The
    /// resulting timestamp always carries `tz` for rendering.
    #[must_use]
    pub fn parse(value: &str, tz: Tz) -> Option<Self> {
        let trimmed = value.trim();
        let (body, is_utc) = match trimmed.strip_suffix('Z') {
            Some(stripped) => (stripped, true),
            None => (trimmed, false),
        };
        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };
        if date_part.len() != 8 || !date_part.is_ascii() {
            return None;
        }
        let year = date_part[0..4].parse::<i32>().ok()?;
        let month = date_part[4..6].parse::<u32>().ok()?;
        let day = date_part[6..8].parse::<u32>().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = parse_time_digits(time_part)?;
        let local = NaiveDateTime::new(date, time);
        if is_utc {
            Some(Self::new(tz.from_utc_datetime(&local)))
        } else {
            resolve_local(tz, local).map(Self::new)
        }
    }

    /// The zone this timestamp renders its local fields in.
    #[must_use]
    pub fn zone(&self) -> Tz {
        self.inner.timezone()
    }

    /// Local year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    /// Local month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.inner.month()
    }

    /// Local day of month (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.inner.day()
    }

    /// Local hour (0-23).
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.inner.hour()
    }

    /// Local minute (0-59).
    #[must_use]
    pub fn minute(&self) -> u32 {
        self.inner.minute()
    }

    /// Local second (0-59).
    #[must_use]
    pub fn second(&self) -> u32 {
        self.inner.second()
    }

    /// Local weekday.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.inner.weekday()
    }

    /// Whether the local time-of-day is exactly midnight.
    #[must_use]
    pub fn is_midnight(&self) -> bool {
        self.hour() == 0 && self.minute() == 0 && self.second() == 0
    }

    /// Renders the instant in UTC as `YYYYMMDDTHHMMSSZ` (seconds always
    /// present).
    #[must_use]
    pub fn to_utc_string(&self) -> String {
        self.inner.naive_utc().format("%Y%m%dT%H%M%SZ").to_string()
    }

    /// Renders the local fields compactly, omitting the `T...` time suffix
    /// entirely when hour, minute, and second are all zero.
    #[must_use]
    pub fn to_local_string(&self) -> String {
        let local = self.inner.naive_local();
        if self.is_midnight() {
            local.format("%Y%m%d").to_string()
        } else {
            local.format("%Y%m%dT%H%M%S").to_string()
        }
    }

    /// Renders a full property line carrying the zone id, such as
    /// `DTSTART;TZID=Europe/Madrid:20240115T090000`.
    #[must_use]
    pub fn to_zoned_property(&self, name: &str) -> String {
        format!(
            "{name};TZID={}:{}",
            self.zone().name(),
            self.to_local_string()
        )
    }

    fn map_local<F>(&self, op: F) -> Option<Self>
    where
        F: FnOnce(NaiveDateTime) -> Option<NaiveDateTime>,
    {
        let mapped = op(self.inner.naive_local())?;
        resolve_local(self.zone(), mapped).map(Self::new)
    }

    /// Overrides the local month. `None` when the value is out of range or
    /// the current day does not exist in the target month.
    #[must_use]
    pub fn with_month(&self, month: i64) -> Option<Self> {
        let month = u32::try_from(month).ok()?;
        self.map_local(|local| local.with_month(month))
    }

    /// Overrides the local day of month.
    #[must_use]
    pub fn with_day(&self, day: i64) -> Option<Self> {
        let day = u32::try_from(day).ok()?;
        self.map_local(|local| local.with_day(day))
    }

    /// Overrides the local day of year. Non-positive days yield `None`.
    #[must_use]
    pub fn with_year_day(&self, day: i64) -> Option<Self> {
        let ordinal = u32::try_from(day).ok().filter(|value| *value >= 1)?;
        self.map_local(|local| local.with_ordinal(ordinal))
    }

    /// Overrides the local hour.
    #[must_use]
    pub fn with_hour(&self, hour: i64) -> Option<Self> {
        let hour = u32::try_from(hour).ok()?;
        self.map_local(|local| local.with_hour(hour))
    }

    /// Overrides the local minute.
    #[must_use]
    pub fn with_minute(&self, minute: i64) -> Option<Self> {
        let minute = u32::try_from(minute).ok()?;
        self.map_local(|local| local.with_minute(minute))
    }

    /// Moves to `target` within the week containing this timestamp, where
    /// weeks begin on `week_start`. The time-of-day is preserved.
    #[must_use]
    pub fn with_weekday(&self, target: Weekday, week_start: Weekday) -> Option<Self> {
        let offset = i64::from(target.days_since(week_start))
            - i64::from(self.weekday().days_since(week_start));
        self.shift_days(offset)
    }

    /// Week-of-year number, where week 1 is the week containing January 1st
    /// and weeks begin on `week_start`.
    #[must_use]
    pub fn week_of_year(&self, week_start: Weekday) -> i64 {
        let local = self.inner.naive_local().date();
        let Some(jan_first) = NaiveDate::from_ymd_opt(local.year(), 1, 1) else {
            return 0;
        };
        let lead = i64::from(jan_first.weekday().days_since(week_start));
        (i64::from(local.ordinal0()) + lead) / 7 + 1
    }

    /// Moves to the same weekday and time in week `week` of this year.
    /// Non-positive week numbers yield `None`.
    #[must_use]
    pub fn with_week_of_year(&self, week: i64, week_start: Weekday) -> Option<Self> {
        if week <= 0 {
            return None;
        }
        let offset = week - self.week_of_year(week_start);
        self.shift_days(offset * 7)
    }

    fn shift_days(&self, days: i64) -> Option<Self> {
        self.map_local(|local| {
            if days >= 0 {
                local.checked_add_days(Days::new(days.unsigned_abs()))
            } else {
                local.checked_sub_days(Days::new(days.unsigned_abs()))
            }
        })
    }

    /// Adds whole days, preserving the local wall-clock time across DST
    /// transitions.
    #[must_use]
    pub fn add_days(&self, days: u64) -> Option<Self> {
        self.map_local(|local| local.checked_add_days(Days::new(days)))
    }

    /// Adds calendar months, clamping the day when the target month is
    /// shorter.
    #[must_use]
    pub fn add_months(&self, months: u32) -> Option<Self> {
        self.map_local(|local| local.checked_add_months(Months::new(months)))
    }

    /// Adds an exact span to the underlying instant.
    #[must_use]
    pub fn checked_add_signed(&self, span: Duration) -> Option<Self> {
        self.inner.checked_add_signed(span).map(Self::new)
    }

    /// Truncates the local time-of-day to midnight.
    #[must_use]
    pub fn start_of_day(&self) -> Self {
        self.map_local(|local| local.date().and_hms_opt(0, 0, 0))
            .unwrap_or(*self)
    }

    /// Moves the local time to the last second of the day.
    #[must_use]
    pub fn end_of_day(&self) -> Self {
        self.map_local(|local| local.date().and_hms_opt(23, 59, 59))
            .unwrap_or(*self)
    }

    /// Signed span from `other` to `self`.
    #[must_use]
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.inner.signed_duration_since(other.inner)
    }
}

fn parse_time_digits(time_part: Option<&str>) -> Option<NaiveTime> {
    let Some(text) = time_part else {
        return Some(NaiveTime::MIN);
    };
    if !text.is_ascii() || (text.len() != 4 && text.len() != 6) {
        return None;
    }
    let hour = text[0..2].parse::<u32>().ok()?;
    let minute = text[2..4].parse::<u32>().ok()?;
    let second = if text.len() == 6 {
        text[4..6].parse::<u32>().ok()?
    } else {
        0
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Resolves local fields in a zone: ambiguous times take the earlier
/// mapping, times inside a DST gap are shifted forward one hour and retried.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(resolved) => Some(resolved),
        LocalResult::Ambiguous(earlier, _later) => Some(earlier),
        LocalResult::None => {
            let shifted = local.checked_add_signed(Duration::hours(1))?;
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(resolved) => Some(resolved),
                LocalResult::Ambiguous(earlier, _later) => Some(earlier),
                LocalResult::None => None,
            }
        }
    }
}
