//! Recurrence rules: frequency, bounds, and the BY-filter lists.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

use crate::error::{CalendarError, CalendarResult};

use super::timestamp::Timestamp;

/// How often a recurrence steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// The canonical rule keyword for this frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::Daily
    }
}

impl FromStr for Frequency {
    type Err = CalendarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MINUTELY" => Ok(Self::Minutely),
            "HOURLY" => Ok(Self::Hourly),
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(CalendarError::Validation {
                field: "FREQ",
                reason: format!("unknown frequency {value}"),
            }),
        }
    }
}

/// Maps a two-letter weekday code to its weekday.
pub(crate) fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Maps a weekday back to its two-letter code.
pub(crate) fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Splits a BYDAY token such as `MO`, `2TU`, or `-1SU` into its optional
/// ordinal prefix and weekday.
pub(crate) fn by_day_parts(token: &str) -> Option<(Option<i32>, Weekday)> {
    if !token.is_ascii() || token.len() < 2 {
        return None;
    }
    let (prefix, code) = token.split_at(token.len() - 2);
    let weekday = weekday_from_code(code)?;
    if prefix.is_empty() {
        return Some((None, weekday));
    }
    let ordinal = prefix.parse::<i32>().ok()?;
    Some((Some(ordinal), weekday))
}

/// A validated repetition pattern.
///
/// A zero count or interval means "unset"; the `has_*` predicates report
/// exactly that, so `COUNT=0` is indistinguishable from no count at all.
/// List-valued fields preserve insertion order, which is also their render
/// order within each field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    count: u32,
    until: Option<Timestamp>,
    week_start: Option<Weekday>,
    by_minute: Vec<i64>,
    by_hour: Vec<i64>,
    by_day: Vec<String>,
    by_month: Vec<i64>,
    by_month_day: Vec<i64>,
    by_week_no: Vec<i64>,
    by_year_day: Vec<i64>,
}

impl RecurrenceRule {
    /// An empty daily rule with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
    }

    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval;
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    pub fn set_until(&mut self, until: Timestamp) {
        self.until = Some(until);
    }

    /// Sets the day a week begins on from a two-letter code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for anything but the seven weekday codes.
    pub fn set_week_start(&mut self, code: &str) -> CalendarResult<()> {
        let weekday = weekday_from_code(code).ok_or_else(|| CalendarError::Validation {
            field: "WKST",
            reason: format!("unknown weekday code {code}"),
        })?;
        self.week_start = Some(weekday);
        Ok(())
    }

    /// Appends a BYDAY token, normalizing it to uppercase.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the token is not an optional signed
    /// ordinal followed by a weekday code.
    pub fn add_by_day(&mut self, token: &str) -> CalendarResult<()> {
        let normalized = token.trim().to_uppercase();
        if by_day_parts(&normalized).is_none() {
            return Err(CalendarError::Validation {
                field: "BYDAY",
                reason: format!("malformed day token {token}"),
            });
        }
        self.by_day.push(normalized);
        Ok(())
    }

    /// Appends an already-typed BYDAY entry.
    pub fn add_by_day_entry(&mut self, ordinal: Option<i32>, weekday: Weekday) {
        let code = weekday_code(weekday);
        let token = match ordinal {
            Some(n) => format!("{n}{code}"),
            None => code.to_owned(),
        };
        self.by_day.push(token);
    }

    pub fn add_by_minute(&mut self, minute: i64) {
        self.by_minute.push(minute);
    }

    pub fn add_by_hour(&mut self, hour: i64) {
        self.by_hour.push(hour);
    }

    pub fn add_by_month(&mut self, month: i64) {
        self.by_month.push(month);
    }

    pub fn add_by_month_day(&mut self, day: i64) {
        self.by_month_day.push(day);
    }

    pub fn add_by_week_no(&mut self, week: i64) {
        self.by_week_no.push(week);
    }

    pub fn add_by_year_day(&mut self, day: i64) {
        self.by_year_day.push(day);
    }

    #[must_use]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// The configured interval, or 1 when unset or clamped from zero.
    #[must_use]
    pub fn effective_interval(&self) -> u32 {
        if self.interval == 0 { 1 } else { self.interval }
    }

    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn until(&self) -> Option<Timestamp> {
        self.until
    }

    #[must_use]
    pub fn week_start(&self) -> Option<Weekday> {
        self.week_start
    }

    #[must_use]
    pub fn by_minute(&self) -> &[i64] {
        &self.by_minute
    }

    #[must_use]
    pub fn by_hour(&self) -> &[i64] {
        &self.by_hour
    }

    #[must_use]
    pub fn by_day(&self) -> &[String] {
        &self.by_day
    }

    #[must_use]
    pub fn by_month(&self) -> &[i64] {
        &self.by_month
    }

    #[must_use]
    pub fn by_month_day(&self) -> &[i64] {
        &self.by_month_day
    }

    #[must_use]
    pub fn by_week_no(&self) -> &[i64] {
        &self.by_week_no
    }

    #[must_use]
    pub fn by_year_day(&self) -> &[i64] {
        &self.by_year_day
    }

    #[must_use]
    pub fn has_count(&self) -> bool {
        self.count != 0
    }

    #[must_use]
    pub fn has_interval(&self) -> bool {
        self.interval != 0
    }

    #[must_use]
    pub fn has_until(&self) -> bool {
        self.until.is_some()
    }

    #[must_use]
    pub fn has_by_minute(&self) -> bool {
        !self.by_minute.is_empty()
    }

    #[must_use]
    pub fn has_by_hour(&self) -> bool {
        !self.by_hour.is_empty()
    }

    #[must_use]
    pub fn has_by_day(&self) -> bool {
        !self.by_day.is_empty()
    }

    #[must_use]
    pub fn has_by_month(&self) -> bool {
        !self.by_month.is_empty()
    }

    #[must_use]
    pub fn has_by_month_day(&self) -> bool {
        !self.by_month_day.is_empty()
    }

    #[must_use]
    pub fn has_by_week_no(&self) -> bool {
        !self.by_week_no.is_empty()
    }

    #[must_use]
    pub fn has_by_year_day(&self) -> bool {
        !self.by_year_day.is_empty()
    }
}

impl fmt::Display for RecurrenceRule {
    /// Renders the rule value in its canonical field order. The week start
    /// is never rendered, mirroring how these values circulate in practice.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.to_utc_string())?;
        }
        if self.count > 0 {
            write!(f, ";COUNT={}", self.count)?;
        }
        if self.interval > 0 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        write_int_list(f, "BYMINUTE", &self.by_minute)?;
        write_int_list(f, "BYHOUR", &self.by_hour)?;
        if !self.by_day.is_empty() {
            write!(f, ";BYDAY={}", self.by_day.join(","))?;
        }
        write_int_list(f, "BYMONTH", &self.by_month)?;
        write_int_list(f, "BYMONTHDAY", &self.by_month_day)?;
        write_int_list(f, "BYWEEKNO", &self.by_week_no)?;
        write_int_list(f, "BYYEARDAY", &self.by_year_day)?;
        Ok(())
    }
}

fn write_int_list(f: &mut fmt::Formatter<'_>, name: &str, values: &[i64]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    write!(f, ";{name}={joined}")
}
