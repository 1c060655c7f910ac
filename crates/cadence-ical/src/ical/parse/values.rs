//! Line-level value helpers shared by the document parser.

use chrono_tz::Tz;

use crate::error::{CalendarError, CalendarResult};
use crate::ical::core::{IcalDuration, Period, RecurrenceRule, Timestamp};

/// Returns the text after the first `:` when the line carries a property
/// name before it.
pub(crate) fn property_value(line: &str) -> Option<&str> {
    let (name, value) = line.split_once(':')?;
    (!name.is_empty()).then_some(value)
}

/// Returns the text after the last `:`, or the whole line when it has none.
pub(crate) fn last_segment(line: &str) -> &str {
    line.rfind(':').map_or(line, |index| &line[index + 1..])
}

/// Parses an `RRULE` property value.
///
/// Unknown keys are ignored and malformed numeric entries are dropped; a bad
/// frequency, `UNTIL`, `WKST`, or `BYDAY` part aborts the parse.
///
/// # Errors
///
/// Returns [`CalendarError::Validation`] naming the first offending part.
pub(crate) fn parse_rrule(value: &str, tz: Tz) -> CalendarResult<RecurrenceRule> {
    let mut rule = RecurrenceRule::new();
    for part in value.split(';') {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key {
            "FREQ" => rule.set_frequency(raw.parse()?),
            "UNTIL" => {
                let until = Timestamp::parse(raw, tz).ok_or_else(|| CalendarError::Validation {
                    field: "UNTIL",
                    reason: format!("unreadable date {raw}"),
                })?;
                rule.set_until(until);
            }
            "COUNT" => {
                if let Ok(count) = raw.parse::<u32>() {
                    rule.set_count(count);
                } else {
                    tracing::debug!(raw, "dropping malformed COUNT");
                }
            }
            "INTERVAL" => {
                if let Ok(interval) = raw.parse::<u32>() {
                    rule.set_interval(interval);
                } else {
                    tracing::debug!(raw, "dropping malformed INTERVAL");
                }
            }
            "WKST" => rule.set_week_start(raw)?,
            "BYDAY" => {
                for token in raw.split(',') {
                    rule.add_by_day(token)?;
                }
            }
            "BYMINUTE" => append_integers(raw, |minute| rule.add_by_minute(minute)),
            "BYHOUR" => append_integers(raw, |hour| rule.add_by_hour(hour)),
            "BYMONTH" => append_integers(raw, |month| rule.add_by_month(month)),
            "BYMONTHDAY" => append_integers(raw, |day| rule.add_by_month_day(day)),
            "BYWEEKNO" => append_integers(raw, |week| rule.add_by_week_no(week)),
            "BYYEARDAY" => append_integers(raw, |day| rule.add_by_year_day(day)),
            _ => {}
        }
    }
    Ok(rule)
}

/// Parses a `FREEBUSY` value: comma separated `start/end` entries where the
/// end may be a date or a duration offset from the start.
///
/// Entries without a `/` separator carry no interval and are skipped; any
/// other malformed entry aborts the whole value.
pub(crate) fn busy_periods(value: &str, tz: Tz) -> Option<Vec<Period>> {
    let mut periods = Vec::new();
    for token in value.split(',') {
        let Some((head, tail)) = token.split_once('/') else {
            continue;
        };
        let start = Timestamp::parse(head, tz)?;
        let end = if let Some(end) = Timestamp::parse(tail, tz) {
            end
        } else {
            let span = IcalDuration::parse(tail)?;
            start.checked_add_signed(span.to_chrono())?
        };
        periods.push(Period::new(start, end).ok()?);
    }
    Some(periods)
}

fn append_integers(raw: &str, mut add: impl FnMut(i64)) {
    for token in raw.split(',') {
        if let Ok(value) = token.trim().parse::<i64>() {
            add(value);
        } else {
            tracing::debug!(token, "dropping malformed list entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use chrono_tz::Tz;

    use super::*;

    #[test]
    fn property_value_requires_a_name() {
        assert_eq!(property_value("SUMMARY:Standup"), Some("Standup"));
        assert_eq!(property_value("DTSTART;TZID=UTC:20240115"), Some("20240115"));
        assert_eq!(property_value(":orphan"), None);
        assert_eq!(property_value("no separator"), None);
    }

    #[test]
    fn last_segment_takes_the_final_colon() {
        assert_eq!(last_segment("DURATION:PT15M"), "PT15M");
        assert_eq!(last_segment("TRIGGER;VALUE=DATE-TIME:20240115T090000Z"), "20240115T090000Z");
        assert_eq!(last_segment("bare"), "bare");
    }

    #[test]
    fn rrule_parses_known_keys() {
        let rule = parse_rrule(
            "FREQ=WEEKLY;INTERVAL=2;COUNT=10;BYDAY=MO,WE;BYHOUR=9;WKST=SU",
            Tz::UTC,
        )
        .expect("rule should parse");
        assert_eq!(rule.frequency().as_str(), "WEEKLY");
        assert_eq!(rule.interval(), 2);
        assert_eq!(rule.count(), 10);
        assert_eq!(rule.by_day(), ["MO", "WE"]);
        assert_eq!(rule.by_hour(), [9]);
        assert_eq!(rule.week_start(), Some(Weekday::Sun));
    }

    #[test]
    fn rrule_parses_until_in_the_ambient_zone() {
        let rule = parse_rrule("FREQ=DAILY;UNTIL=20240131T235959Z", Tz::UTC)
            .expect("rule should parse");
        let until = rule.until().expect("until should be set");
        assert_eq!(until.to_utc_string(), "20240131T235959Z");
    }

    #[test]
    fn rrule_drops_malformed_numeric_entries() {
        let rule = parse_rrule(
            "FREQ=MONTHLY;COUNT=abc;BYMONTHDAY=1,x,15;RSCALE=GREGORIAN",
            Tz::UTC,
        )
        .expect("rule should parse");
        assert!(!rule.has_count());
        assert_eq!(rule.by_month_day(), [1, 15]);
    }

    #[test]
    fn rrule_rejects_bad_frequency_and_byday() {
        assert!(parse_rrule("FREQ=SOMETIMES", Tz::UTC).is_err());
        assert!(parse_rrule("FREQ=WEEKLY;BYDAY=XX", Tz::UTC).is_err());
        assert!(parse_rrule("FREQ=WEEKLY;UNTIL=never", Tz::UTC).is_err());
    }

    #[test]
    fn busy_periods_accept_dates_and_durations() {
        let periods = busy_periods(
            "20240115T100000Z/20240115T110000Z,20240115T120000Z/PT30M",
            Tz::UTC,
        )
        .expect("value should parse");
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].start().to_utc_string(), "20240115T120000Z");
        assert_eq!(periods[1].end().to_utc_string(), "20240115T123000Z");
    }

    #[test]
    fn busy_periods_skip_bare_entries_and_reject_garbage() {
        let periods = busy_periods("20240115T100000Z", Tz::UTC).expect("value should parse");
        assert!(periods.is_empty());
        assert!(busy_periods("20240115T100000Z/soon", Tz::UTC).is_none());
    }
}
