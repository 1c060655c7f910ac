//! Half-open spans of time between two timestamps.

use chrono::{Duration, Weekday};

use crate::error::{CalendarError, CalendarResult};

use super::timestamp::Timestamp;

/// A span of time between two timestamps, used both as a query window and as
/// an expanded occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    start: Timestamp,
    end: Timestamp,
}

impl Period {
    /// Builds a period running from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `start` is after `end`.
    pub fn new(start: Timestamp, end: Timestamp) -> CalendarResult<Self> {
        if start > end {
            return Err(CalendarError::Validation {
                field: "period",
                reason: format!(
                    "start {} is after end {}",
                    start.to_utc_string(),
                    end.to_utc_string()
                ),
            });
        }
        Ok(Self { start, end })
    }

    /// A zero-length period pinned to a single instant.
    #[must_use]
    pub fn instant(at: Timestamp) -> Self {
        Self { start: at, end: at }
    }

    /// Inclusive start.
    #[must_use]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Exclusive end.
    #[must_use]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Length of the period.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Whether the two periods intersect.
    ///
    /// Sharing a start or sharing an end always counts as an overlap, while a
    /// period that merely begins where the other one ends does not. Callers
    /// that bucket occurrences rely on those exact boundary rules.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.start == other.start || self.end == other.end {
            return true;
        }
        if self.start < other.start && self.end > other.start {
            return true;
        }
        if self.start < other.end && self.end > other.end {
            return true;
        }
        other.start < self.start && other.end > self.end
    }

    /// The full local day containing `at`.
    #[must_use]
    pub fn day_of(at: Timestamp) -> Self {
        let start = at.start_of_day();
        let end = start.add_days(1).unwrap_or(start);
        Self { start, end }
    }

    /// The seven local days beginning at the start of the day containing
    /// `at`.
    #[must_use]
    pub fn week_of(at: Timestamp) -> Self {
        let start = at.start_of_day();
        let end = start.add_days(7).unwrap_or(start);
        Self { start, end }
    }

    /// One calendar month beginning at the start of the day containing `at`.
    #[must_use]
    pub fn month_of(at: Timestamp) -> Self {
        let start = at.start_of_day();
        let end = start.add_months(1).unwrap_or(start);
        Self { start, end }
    }

    /// Days of month on which this period is active within `window`.
    #[must_use]
    pub fn days_in_window(&self, window: &Self) -> Vec<u32> {
        self.qualifying_days(window)
            .into_iter()
            .map(|day| day.day())
            .collect()
    }

    /// Weekdays on which this period is active within `window`.
    #[must_use]
    pub fn weekdays_in_window(&self, window: &Self) -> Vec<Weekday> {
        self.qualifying_days(window)
            .into_iter()
            .map(|day| day.weekday())
            .collect()
    }

    /// Day starts within `window` whose day intersects this period.
    fn qualifying_days(&self, window: &Self) -> Vec<Timestamp> {
        let mut days = Vec::new();
        let mut cursor = window.start.start_of_day();
        while cursor < window.end {
            let Some(next) = cursor.add_days(1) else {
                break;
            };
            if cursor < self.end && next > self.start {
                days.push(cursor);
            }
            cursor = next;
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::*;

    fn ts(value: &str) -> Timestamp {
        Timestamp::parse(value, Tz::UTC).expect("fixture timestamp should parse")
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        let result = Period::new(ts("20240115T110000"), ts("20240115T100000"));
        assert!(result.is_err());
    }

    #[test]
    fn overlap_contained_and_disjoint() {
        let hour = Period::new(ts("20240115T100000"), ts("20240115T110000")).unwrap();
        let inside = Period::new(ts("20240115T103000"), ts("20240115T104500")).unwrap();
        let later = Period::new(ts("20240115T110000"), ts("20240115T120000")).unwrap();

        assert!(hour.overlaps(&inside));
        assert!(inside.overlaps(&hour));
        // Touching at 11:00 is not an overlap.
        assert!(!hour.overlaps(&later));
        assert!(!later.overlaps(&hour));
    }

    #[test]
    fn overlap_partial() {
        let first = Period::new(ts("20240115T100000"), ts("20240115T110000")).unwrap();
        let second = Period::new(ts("20240115T103000"), ts("20240115T113000")).unwrap();
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }

    #[test]
    fn overlap_boundary_equality_counts() {
        let hour = Period::new(ts("20240115T100000"), ts("20240115T110000")).unwrap();
        let same_start = Period::new(ts("20240115T100000"), ts("20240115T103000")).unwrap();
        let point = Period::instant(ts("20240115T103000"));

        assert!(hour.overlaps(&same_start));
        assert!(same_start.overlaps(&hour));
        assert!(hour.overlaps(&point));
        assert!(point.overlaps(&hour));
        // An identical pair of instants shares its start.
        assert!(point.overlaps(&point));
    }

    #[test]
    fn day_week_month_windows() {
        let at = ts("20240115T153000");
        let day = Period::day_of(at);
        assert_eq!(day.start().to_local_string(), "20240115");
        assert_eq!(day.end().to_local_string(), "20240116");

        let week = Period::week_of(at);
        assert_eq!(week.end().to_local_string(), "20240122");

        let month = Period::month_of(at);
        assert_eq!(month.end().to_local_string(), "20240215");
    }

    #[test]
    fn days_in_window_spanning_midnight() {
        let span = Period::new(ts("20240115T220000"), ts("20240116T020000")).unwrap();
        let window = Period::new(ts("20240114"), ts("20240118")).unwrap();
        assert_eq!(span.days_in_window(&window), vec![15, 16]);
    }

    #[test]
    fn weekdays_in_window() {
        // 2024-01-15 is a Monday.
        let span = Period::new(ts("20240115T090000"), ts("20240117T100000")).unwrap();
        let window = Period::week_of(ts("20240115"));
        assert_eq!(
            span.weekdays_in_window(&window),
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed]
        );
    }
}
