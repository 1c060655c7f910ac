//! ISO-8601-style duration values (`P1DT2H`, `PT15M`, `-P1W`).

use std::fmt;

use chrono::Duration;

const MINUTE_SECONDS: i64 = 60;
const HOUR_SECONDS: i64 = 60 * MINUTE_SECONDS;
const DAY_SECONDS: i64 = 24 * HOUR_SECONDS;

/// A calendar duration broken into the units its text form uses.
///
/// Fields are kept as parsed rather than normalized, so a value round-trips
/// through [`IcalDuration::parse`] and [`fmt::Display`] unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcalDuration {
    negative: bool,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl IcalDuration {
    /// The zero duration, rendered `PT0S`.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a duration from a whole-second count, carrying seconds into
    /// minutes, hours, and days. Weeks are never produced.
    #[must_use]
    pub fn from_seconds(total: i64) -> Self {
        let magnitude = i64::try_from(total.unsigned_abs()).unwrap_or(i64::MAX);
        Self {
            negative: total < 0,
            weeks: 0,
            days: magnitude / DAY_SECONDS,
            hours: (magnitude / HOUR_SECONDS) % 24,
            minutes: (magnitude / MINUTE_SECONDS) % 60,
            seconds: magnitude % 60,
        }
    }

    /// Builds a duration from an exact span, truncating sub-second precision.
    #[must_use]
    pub fn from_chrono(span: Duration) -> Self {
        Self::from_seconds(span.num_seconds())
    }

    /// Parses a duration value such as `PT15M`, `P2W`, or `-P1DT2H30M`.
    ///
    /// Returns `None` for anything that is not a well-formed duration,
    /// including trailing digits without a unit designator.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => match trimmed.strip_prefix('+') {
                Some(rest) => (false, rest),
                None => (false, trimmed),
            },
        };
        let body = rest.strip_prefix('P')?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };
        let mut duration = Self {
            negative,
            ..Self::default()
        };
        parse_part(date_part, false, &mut duration)?;
        if let Some(time) = time_part {
            parse_part(time, true, &mut duration)?;
        }
        Some(duration)
    }

    /// Converts to an exact span, folding weeks into days.
    #[must_use]
    pub fn to_chrono(&self) -> Duration {
        let day_count = self.weeks.saturating_mul(7).saturating_add(self.days);
        let total = day_count
            .saturating_mul(DAY_SECONDS)
            .saturating_add(self.hours.saturating_mul(HOUR_SECONDS))
            .saturating_add(self.minutes.saturating_mul(MINUTE_SECONDS))
            .saturating_add(self.seconds);
        let signed = if self.negative {
            total.saturating_neg()
        } else {
            total
        };
        Duration::try_seconds(signed).unwrap_or_else(Duration::zero)
    }

    /// Whether every unit is zero, the sign aside.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.weeks == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
    }
}

fn parse_part(text: &str, is_time: bool, duration: &mut IcalDuration) -> Option<()> {
    let mut accumulated: Option<i64> = None;
    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let next = accumulated
                .unwrap_or(0)
                .checked_mul(10)?
                .checked_add(i64::from(digit))?;
            accumulated = Some(next);
            continue;
        }
        let value = accumulated.take()?;
        match (is_time, ch) {
            (false, 'W') => duration.weeks = value,
            (false, 'D') => duration.days = value,
            (true, 'H') => duration.hours = value,
            (true, 'M') => duration.minutes = value,
            (true, 'S') => duration.seconds = value,
            _ => return None,
        }
    }
    if accumulated.is_some() {
        // Digits with no trailing designator.
        return None;
    }
    Some(())
}

impl fmt::Display for IcalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.weeks > 0 {
            // A week count stands alone, even when other units are set.
            return write!(f, "{}W", self.weeks);
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.days == 0 {
            write!(f, "T0S")?;
        } else {
            // A day count with no time part needs no T section.
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_common_forms() {
        let quarter_hour = IcalDuration::parse("PT15M").expect("should parse");
        assert_eq!(quarter_hour.to_chrono(), Duration::minutes(15));

        let mixed = IcalDuration::parse("P1DT2H30M").expect("should parse");
        assert_eq!(
            mixed.to_chrono(),
            Duration::hours(26) + Duration::minutes(30)
        );

        let weeks = IcalDuration::parse("P2W").expect("should parse");
        assert_eq!(weeks.to_chrono(), Duration::days(14));

        let negative = IcalDuration::parse("-PT30M").expect("should parse");
        assert_eq!(negative.to_chrono(), Duration::minutes(-30));
    }

    #[test]
    fn parse_rejects_malformed_values() {
        assert!(IcalDuration::parse("15M").is_none());
        assert!(IcalDuration::parse("PT15").is_none());
        assert!(IcalDuration::parse("PTM").is_none());
        assert!(IcalDuration::parse("P1X").is_none());
        // Week and day designators do not belong in the time part.
        assert!(IcalDuration::parse("PT1W").is_none());
    }

    #[test]
    fn render_matches_canonical_forms() {
        assert_eq!(IcalDuration::parse("PT15M").unwrap().to_string(), "PT15M");
        assert_eq!(IcalDuration::parse("P2W").unwrap().to_string(), "P2W");
        assert_eq!(IcalDuration::parse("P3D").unwrap().to_string(), "P3D");
        assert_eq!(
            IcalDuration::parse("P1DT2H30M").unwrap().to_string(),
            "P1DT2H30M"
        );
        assert_eq!(IcalDuration::parse("-PT30M").unwrap().to_string(), "-PT30M");
    }

    #[test]
    fn zero_renders_pt0s() {
        assert_eq!(IcalDuration::zero().to_string(), "PT0S");
        assert_eq!(IcalDuration::from_seconds(0).to_string(), "PT0S");
    }

    #[test]
    fn from_seconds_carries_units() {
        let span = IcalDuration::from_seconds(90);
        assert_eq!(span.to_string(), "PT1M30S");

        let long = IcalDuration::from_seconds(26 * 60 * 60 + 30 * 60);
        assert_eq!(long.to_string(), "P1DT2H30M");

        let negative = IcalDuration::from_seconds(-3600);
        assert_eq!(negative.to_string(), "-PT1H");
    }
}
