//! Occurrence expansion for recurring components.
//!
//! Expansion walks a cursor period forward from the component's base period,
//! applying each configured BY-filter independently at every step and
//! collecting surviving candidates in a deduplicated set. The acceptance
//! counter backing COUNT lives on the stack of a single call.

use std::collections::BTreeSet;

use chrono::{Duration, Weekday};

use crate::ical::core::{Frequency, Period, RecurrenceRule, Schedulable, Timestamp, by_day_parts};

/// Expands `component` into the occurrence periods falling inside `window`.
///
/// Components without a start yield nothing; components without a recurrence
/// rule yield at most their own base period. Results are deduplicated by the
/// (start, end) pair and sorted by start.
#[must_use]
#[tracing::instrument(skip(component, window), fields(uid = component.uid(), kind = %component.kind()))]
pub fn expand(component: &Schedulable, window: &Period) -> Vec<Period> {
    let Some(start) = component.dtstart() else {
        return Vec::new();
    };
    let base_end = component
        .dtend()
        .or_else(|| component.due())
        .unwrap_or(start);
    let length = base_end.signed_duration_since(start);
    if length < Duration::zero() {
        tracing::debug!(uid = component.uid(), "component ends before it starts");
        return Vec::new();
    }
    let Some(base) = candidate_from(start, length) else {
        return Vec::new();
    };
    let mut state = Expansion {
        rule: component.rule(),
        exceptions: component.exception_dates(),
        window_start: window.start(),
        effective_end: effective_end(component.rule(), window),
        accepted: 0,
        results: BTreeSet::new(),
    };
    if let Some(rule) = component.rule() {
        state.run(base, rule);
    } else {
        state.submit(base);
    }
    state.results.into_iter().collect()
}

/// The window end, clipped to the rule's UNTIL when that comes first.
fn effective_end(rule: Option<&RecurrenceRule>, window: &Period) -> Timestamp {
    match rule.and_then(RecurrenceRule::until) {
        Some(until) if until < window.end() => until,
        _ => window.end(),
    }
}

/// Builds a candidate period of `length` anchored at `start`.
fn candidate_from(start: Timestamp, length: Duration) -> Option<Period> {
    let end = start.checked_add_signed(length)?;
    Period::new(start, end).ok()
}

/// Steps the cursor by one frequency unit scaled by the rule interval.
/// Day-and-coarser steps preserve local wall-clock time across zone
/// transitions; minute and hour steps are plain instant arithmetic.
fn advance(cursor: &Period, rule: &RecurrenceRule) -> Option<Period> {
    let interval = rule.effective_interval();
    let start = cursor.start();
    let next = match rule.frequency() {
        Frequency::Minutely => start.checked_add_signed(Duration::minutes(i64::from(interval)))?,
        Frequency::Hourly => start.checked_add_signed(Duration::hours(i64::from(interval)))?,
        Frequency::Daily => start.add_days(u64::from(interval))?,
        Frequency::Weekly => start.add_days(u64::from(interval) * 7)?,
        Frequency::Monthly => start.add_months(interval)?,
        Frequency::Yearly => start.add_months(interval.saturating_mul(12))?,
    };
    candidate_from(next, cursor.duration())
}

/// State local to one expansion call.
struct Expansion<'a> {
    rule: Option<&'a RecurrenceRule>,
    exceptions: &'a [Timestamp],
    window_start: Timestamp,
    effective_end: Timestamp,
    accepted: u32,
    results: BTreeSet<Period>,
}

impl Expansion<'_> {
    /// Walks the cursor from `base` until it leaves the effective window or
    /// the acceptance counter is exhausted.
    fn run(&mut self, base: Period, rule: &RecurrenceRule) {
        let week_start = rule.week_start().unwrap_or(Weekday::Mon);
        let mut cursor = base;
        while cursor.start() < self.effective_end {
            if rule.has_count() && self.accepted >= rule.count() {
                break;
            }
            self.apply_filters(&cursor, rule, week_start);
            self.submit(cursor);
            let Some(next) = advance(&cursor, rule) else {
                break;
            };
            cursor = next;
        }
    }

    /// Applies every configured BY-filter to the cursor step, one candidate
    /// per listed value. Each filter overrides a single calendar field of the
    /// cursor's start; values naming no real date produce no candidate.
    /// Filters are additive, not a nested refinement, and the bare cursor is
    /// submitted after them.
    fn apply_filters(&mut self, cursor: &Period, rule: &RecurrenceRule, week_start: Weekday) {
        let start = cursor.start();
        let length = cursor.duration();
        if rule.has_by_month() {
            for &month in rule.by_month() {
                self.submit_override(start.with_month(month), length);
            }
        }
        if rule.has_by_week_no() {
            for &week in rule.by_week_no() {
                self.submit_override(start.with_week_of_year(week, week_start), length);
            }
        }
        if rule.has_by_year_day() {
            for &day in rule.by_year_day() {
                self.submit_override(start.with_year_day(day), length);
            }
        }
        if rule.has_by_month_day() {
            for &day in rule.by_month_day() {
                self.submit_override(start.with_day(day), length);
            }
        }
        if rule.has_by_day() {
            for token in rule.by_day() {
                // The ordinal prefix is accepted but only the weekday applies.
                if let Some((_ordinal, weekday)) = by_day_parts(token) {
                    self.submit_override(start.with_weekday(weekday, week_start), length);
                }
            }
        }
        if rule.has_by_hour() {
            for &hour in rule.by_hour() {
                self.submit_override(start.with_hour(hour), length);
            }
        }
        if rule.has_by_minute() {
            for &minute in rule.by_minute() {
                self.submit_override(start.with_minute(minute), length);
            }
        }
    }

    fn submit_override(&mut self, start: Option<Timestamp>, length: Duration) {
        let Some(candidate) = start.and_then(|start| candidate_from(start, length)) else {
            return;
        };
        self.submit(candidate);
    }

    /// Validates one candidate. The COUNT gate charges its counter before the
    /// remaining checks run, so a candidate rejected by the window or an
    /// exception date still consumes an acceptance slot.
    fn submit(&mut self, candidate: Period) {
        if self.results.contains(&candidate) {
            return;
        }
        if let Some(rule) = self.rule {
            if rule.has_count() {
                if self.accepted >= rule.count() {
                    return;
                }
                self.accepted += 1;
            }
            if rule
                .until()
                .is_some_and(|until| until.end_of_day() < self.window_start)
            {
                return;
            }
        }
        if candidate.start() >= self.effective_end {
            return;
        }
        if candidate.end() <= self.window_start {
            return;
        }
        if self.exceptions.contains(&candidate.start()) {
            return;
        }
        self.results.insert(candidate);
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use crate::ical::core::ScheduleKind;

    use super::*;

    fn ts(value: &str) -> Timestamp {
        Timestamp::parse(value, Tz::UTC).expect("test timestamp should parse")
    }

    fn window(start: &str, end: &str) -> Period {
        Period::new(ts(start), ts(end)).expect("test window should be valid")
    }

    fn event_at(start: &str, end: &str) -> Schedulable {
        let mut event = Schedulable::new(ScheduleKind::Event);
        event.set_dtstart(ts(start));
        event.set_dtend(ts(end));
        event
    }

    fn starts(periods: &[Period]) -> Vec<String> {
        periods
            .iter()
            .map(|period| period.start().to_utc_string())
            .collect()
    }

    #[test]
    fn component_without_start_yields_nothing() {
        let event = Schedulable::new(ScheduleKind::Event);
        let result = expand(&event, &window("20240101", "20240201"));
        assert!(result.is_empty());
    }

    #[test]
    fn non_recurring_component_yields_its_base_period() {
        let event = event_at("20240115T090000", "20240115T100000");

        let hit = expand(&event, &window("20240101", "20240201"));
        assert_eq!(starts(&hit), ["20240115T090000Z"]);

        let miss = expand(&event, &window("20240201", "20240301"));
        assert!(miss.is_empty());
    }

    #[test]
    fn length_falls_back_to_due_when_end_is_missing() {
        let mut todo = Schedulable::new(ScheduleKind::Todo);
        todo.set_dtstart(ts("20240115T090000"));
        todo.set_due(ts("20240115T170000"));

        let result = expand(&todo, &window("20240101", "20240201"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].end().to_utc_string(), "20240115T170000Z");
    }

    #[test]
    fn component_ending_before_it_starts_is_degenerate() {
        let event = event_at("20240115T100000", "20240115T090000");
        let result = expand(&event, &window("20240101", "20240201"));
        assert!(result.is_empty());
    }

    #[test]
    fn count_is_a_hard_bound_and_calls_are_isolated() {
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_count(3);
        event.set_rule(rule);

        let wide = window("20240101", "20301231");
        let first = expand(&event, &wide);
        assert_eq!(
            starts(&first),
            ["20240101T090000Z", "20240102T090000Z", "20240103T090000Z"]
        );

        // A second call starts from a fresh counter.
        let second = expand(&event, &wide);
        assert_eq!(first, second);
    }

    #[test]
    fn exception_dates_consume_count_slots() {
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_count(3);
        event.set_rule(rule);
        event.add_exception_date(ts("20240102T090000"));

        let result = expand(&event, &window("20240101", "20240110"));
        assert_eq!(starts(&result), ["20240101T090000Z", "20240103T090000Z"]);
        assert_eq!(result[0].end().to_utc_string(), "20240101T100000Z");
    }

    #[test]
    fn weekday_filter_expands_within_each_week() {
        // 2024-01-01 is a Monday.
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Weekly);
        rule.set_count(4);
        rule.add_by_day("MO").expect("weekday token should parse");
        rule.add_by_day("WE").expect("weekday token should parse");
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240115"));
        assert_eq!(
            starts(&result),
            [
                "20240101T090000Z",
                "20240103T090000Z",
                "20240108T090000Z",
                "20240110T090000Z"
            ]
        );
    }

    #[test]
    fn until_clips_the_effective_window() {
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_until(ts("20240103T090000"));
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240110"));
        assert_eq!(starts(&result), ["20240101T090000Z", "20240102T090000Z"]);
    }

    #[test]
    fn until_before_the_window_yields_nothing() {
        let mut event = event_at("20230101T090000", "20230101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_until(ts("20230601T000000"));
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240110"));
        assert!(result.is_empty());
    }

    #[test]
    fn open_ended_rules_stop_at_the_window_end() {
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        event.set_rule(rule);

        let bounds = window("20240101", "20240104");
        let result = expand(&event, &bounds);
        assert_eq!(result.len(), 3);
        for period in &result {
            assert!(period.start() < bounds.end());
            assert!(period.end() > bounds.start());
        }
    }

    #[test]
    fn zero_interval_is_treated_as_one() {
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_interval(0);
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240103"));
        assert_eq!(starts(&result), ["20240101T090000Z", "20240102T090000Z"]);
    }

    #[test]
    fn hourly_interval_scales_the_step() {
        let mut event = event_at("20240101T090000", "20240101T093000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Hourly);
        rule.set_interval(6);
        rule.set_count(3);
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240102"));
        assert_eq!(
            starts(&result),
            ["20240101T090000Z", "20240101T150000Z", "20240101T210000Z"]
        );
    }

    #[test]
    fn monthly_steps_keep_the_day_and_time() {
        let mut event = event_at("20240115T090000", "20240115T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Monthly);
        rule.set_count(3);
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20250101"));
        assert_eq!(
            starts(&result),
            ["20240115T090000Z", "20240215T090000Z", "20240315T090000Z"]
        );
    }

    #[test]
    fn filters_are_additive_not_nested() {
        let mut event = event_at("20240115T090000", "20240115T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Yearly);
        rule.add_by_month(2);
        rule.add_by_hour(14);
        event.set_rule(rule);

        // Each filter overrides one field of the cursor independently; the
        // bare cursor itself is kept as well.
        let result = expand(&event, &window("20240101", "20250101"));
        assert_eq!(
            starts(&result),
            ["20240115T090000Z", "20240115T140000Z", "20240215T090000Z"]
        );
    }

    #[test]
    fn overrides_naming_no_real_date_are_dropped() {
        let mut event = event_at("20240215T090000", "20240215T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Monthly);
        rule.add_by_month_day(30);
        event.set_rule(rule);

        // February 2024 has 29 days, so the override yields nothing and only
        // the bare cursor survives.
        let result = expand(&event, &window("20240201", "20240301"));
        assert_eq!(starts(&result), ["20240215T090000Z"]);
    }

    #[test]
    fn duplicate_candidates_do_not_consume_count() {
        // The cursor lands on Monday and BYDAY=MO re-derives the same
        // period, so without dedup-before-charge COUNT=2 would exhaust on
        // the first step.
        let mut event = event_at("20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Weekly);
        rule.set_count(2);
        rule.add_by_day("MO").expect("weekday token should parse");
        event.set_rule(rule);

        let result = expand(&event, &window("20240101", "20240201"));
        assert_eq!(starts(&result), ["20240101T090000Z", "20240108T090000Z"]);
    }
}
