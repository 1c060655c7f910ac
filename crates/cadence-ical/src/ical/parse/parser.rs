//! Streaming line parser for calendar documents.
//!
//! Components are parsed in document order against the most recently seen
//! `VTIMEZONE`, so local times in a block resolve in the zone that was active
//! when the block started. Unrecognized lines are skipped; a recognized line
//! that cannot be read aborts the document with its component and field.

use std::str::Lines;

use chrono_tz::Tz;

use crate::error::{CalendarError, CalendarResult};
use crate::ical::Calendar;
use crate::ical::core::{
    Alarm, IcalDuration, Person, PersonKind, RecurrenceRule, Schedulable, ScheduleKind, Timestamp,
    Trigger, VFreeBusy, VTimeZone,
};

use super::values::{busy_periods, last_segment, parse_rrule, property_value};

/// Parses a complete calendar document.
///
/// # Errors
///
/// Returns [`CalendarError::Parse`] naming the component, field, and raw line
/// of the first value that could not be read.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> CalendarResult<Calendar> {
    let mut calendar = Calendar::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        if line.starts_with("METHOD") {
            if let Some(value) = property_value(line) {
                calendar.set_method(value.to_owned());
            }
        } else if line.starts_with("BEGIN:VTIMEZONE") {
            if let Some(timezone) = parse_timezone(&mut lines, calendar.timezone().zone())? {
                calendar.set_timezone(timezone);
            }
        } else if line.starts_with("BEGIN:VEVENT") {
            if let Some(event) =
                parse_schedulable(&mut lines, ScheduleKind::Event, calendar.timezone().zone())?
            {
                calendar.merge_event(event);
            }
        } else if line.starts_with("BEGIN:VTODO") {
            if let Some(todo) =
                parse_schedulable(&mut lines, ScheduleKind::Todo, calendar.timezone().zone())?
            {
                calendar.add(todo);
            }
        } else if line.starts_with("BEGIN:VJOURNAL") {
            if let Some(journal) =
                parse_schedulable(&mut lines, ScheduleKind::Journal, calendar.timezone().zone())?
            {
                calendar.add(journal);
            }
        } else if line.starts_with("BEGIN:VFREEBUSY") {
            if let Some(block) = parse_free_busy(&mut lines, calendar.timezone().zone())? {
                calendar.set_free_busy(block);
            }
        } else {
            // BEGIN:VCALENDAR, VERSION, PRODID, and blank lines need no routing.
        }
    }
    Ok(calendar)
}

fn parse_error(component: &'static str, field: &'static str, line: &str) -> CalendarError {
    CalendarError::Parse {
        component,
        field,
        raw_line: line.to_owned(),
    }
}

/// Parses one `VEVENT`, `VTODO`, or `VJOURNAL` block. A block truncated by
/// the end of input is dropped.
fn parse_schedulable(
    lines: &mut Lines<'_>,
    kind: ScheduleKind,
    tz: Tz,
) -> CalendarResult<Option<Schedulable>> {
    let mut component = Schedulable::new(kind);
    let end_marker = format!("END:{kind}");
    while let Some(line) = lines.next() {
        if line.starts_with(&end_marker) {
            return Ok(Some(component));
        }
        if line.starts_with("BEGIN:VALARM") && kind != ScheduleKind::Journal {
            if let Some(alarm) = parse_alarm(lines, kind, tz)? {
                component.add_alarm(alarm);
            }
            continue;
        }
        let handled = apply_text_property(&mut component, line)
            || apply_date_property(&mut component, kind, line, tz)?
            || apply_meta_property(&mut component, kind, line, tz)?;
        if !handled {
            tracing::trace!(line, "skipping unrecognized line");
        }
    }
    Ok(None)
}

fn apply_text_property(component: &mut Schedulable, line: &str) -> bool {
    if line.starts_with("UID") {
        if let Some(value) = property_value(line) {
            component.set_uid(value.to_owned());
        }
    } else if line.starts_with("SUMMARY") {
        if let Some(value) = property_value(line) {
            component.set_summary(value.to_owned());
        }
    } else if line.starts_with("DESCRIPTION") {
        if let Some(value) = property_value(line) {
            component.set_description(value.to_owned());
        }
    } else if line.starts_with("LOCATION") {
        if let Some(value) = property_value(line) {
            component.set_location(value.to_owned());
        }
    } else if line.starts_with("CLASS") {
        if let Some(value) = property_value(line) {
            component.set_class(value.to_owned());
        }
    } else if line.starts_with("CATEGORIES") {
        if let Some(value) = property_value(line) {
            for category in value.split(',') {
                component.add_category(category.to_owned());
            }
        }
    } else if line.starts_with("X-") {
        component.add_extended(line.to_owned());
    } else {
        return false;
    }
    true
}

fn apply_date_property(
    component: &mut Schedulable,
    kind: ScheduleKind,
    line: &str,
    tz: Tz,
) -> CalendarResult<bool> {
    let field = if line.starts_with("DTSTART") {
        "DTSTART"
    } else if line.starts_with("DTEND") {
        "DTEND"
    } else if line.starts_with("DUE") {
        "DUE"
    } else if line.starts_with("DTSTAMP") {
        "DTSTAMP"
    } else if line.starts_with("CREATED") {
        "CREATED"
    } else if line.starts_with("LAST-MODIFIED") {
        "LAST-MODIFIED"
    } else if line.starts_with("EXDATE") {
        "EXDATE"
    } else {
        return Ok(false);
    };
    let Some(value) = property_value(line) else {
        return Ok(true);
    };
    let stamp =
        Timestamp::parse(value, tz).ok_or_else(|| parse_error(kind.as_str(), field, line))?;
    match field {
        "DTSTART" => component.set_dtstart(stamp),
        "DTEND" => component.set_dtend(stamp),
        "DUE" => component.set_due(stamp),
        "DTSTAMP" => component.set_dtstamp(stamp),
        "CREATED" => component.set_created(stamp),
        "LAST-MODIFIED" => component.set_last_modified(stamp),
        _ => component.add_exception_date(stamp),
    }
    Ok(true)
}

fn apply_meta_property(
    component: &mut Schedulable,
    kind: ScheduleKind,
    line: &str,
    tz: Tz,
) -> CalendarResult<bool> {
    if line.starts_with("STATUS") {
        if let Some(value) = property_value(line) {
            component
                .set_status(value)
                .map_err(|_e| parse_error(kind.as_str(), "STATUS", line))?;
        }
    } else if line.starts_with("PERCENT-COMPLETE") && kind == ScheduleKind::Todo {
        if let Some(value) = property_value(line) {
            apply_percent(component, kind, value, line)?;
        }
    } else if line.starts_with("RRULE") {
        if let Some(value) = property_value(line) {
            let rule =
                parse_rrule(value, tz).map_err(|_e| parse_error(kind.as_str(), "RRULE", line))?;
            component.set_rule(rule);
        }
    } else if line.starts_with("ATTENDEE") {
        if line.contains(':') {
            let person = Person::parse(PersonKind::Attendee, line)
                .map_err(|_e| parse_error(kind.as_str(), "ATTENDEE", line))?;
            component.add_attendee(person);
        }
    } else if line.starts_with("ORGANIZER") {
        if line.contains(':') {
            let person = Person::parse(PersonKind::Organizer, line)
                .map_err(|_e| parse_error(kind.as_str(), "ORGANIZER", line))?;
            component.add_organizer(person);
        }
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn apply_percent(
    component: &mut Schedulable,
    kind: ScheduleKind,
    value: &str,
    line: &str,
) -> CalendarResult<()> {
    if let Ok(percent) = value.parse::<i64>() {
        component
            .set_percent(percent)
            .map_err(|_e| parse_error(kind.as_str(), "PERCENT-COMPLETE", line))?;
    } else {
        tracing::debug!(line, "dropping malformed PERCENT-COMPLETE");
    }
    Ok(())
}

/// Parses a `VALARM` sub-block for the surrounding component.
fn parse_alarm(
    lines: &mut Lines<'_>,
    kind: ScheduleKind,
    tz: Tz,
) -> CalendarResult<Option<Alarm>> {
    let mut alarm = Alarm::new();
    for line in lines.by_ref() {
        if line.starts_with("END:VALARM") {
            return Ok(Some(alarm));
        }
        if line.starts_with("TRIGGER") {
            let trigger = Trigger::parse(line, tz)
                .ok_or_else(|| parse_error(kind.as_str(), "VALARM", line))?;
            alarm.set_trigger(trigger);
        } else if line.starts_with("REPEAT") {
            if let Some(value) = property_value(line) {
                if let Ok(repeat) = value.parse::<u32>() {
                    alarm.set_repeat(repeat);
                } else {
                    tracing::debug!(line, "dropping malformed REPEAT");
                }
            }
        } else if line.starts_with("DURATION") {
            let duration = IcalDuration::parse(last_segment(line))
                .ok_or_else(|| parse_error(kind.as_str(), "VALARM", line))?;
            alarm.set_duration(duration);
        } else if line.starts_with("DESCRIPTION") {
            alarm.set_description(last_segment(line).to_owned());
        } else if line.starts_with("ACTION") {
            alarm.set_action(last_segment(line).to_owned());
        } else if line.starts_with("X-") {
            alarm.add_extended(line.to_owned());
        } else {
            // Other alarm lines are ignored.
        }
    }
    Ok(None)
}

/// Parses a `VTIMEZONE` block into a zone with optional seasonal overrides.
fn parse_timezone(lines: &mut Lines<'_>, tz: Tz) -> CalendarResult<Option<VTimeZone>> {
    let mut zone = VTimeZone::default();
    let mut standard = None;
    let mut daylight = None;
    while let Some(line) = lines.next() {
        if line.starts_with("END:VTIMEZONE") {
            if let Some(rule) = standard {
                zone.set_standard_rule(rule);
            }
            if let Some(rule) = daylight {
                zone.set_daylight_rule(rule);
            }
            return Ok(Some(zone));
        }
        if line.starts_with("TZID") {
            if let Some(value) = property_value(line) {
                zone = VTimeZone::from_tzid(value)
                    .map_err(|_e| parse_error("VTIMEZONE", "TZID", line))?;
            }
        } else if line.starts_with("BEGIN:STANDARD") {
            standard = seasonal_rule(lines, "END:STANDARD", tz)?;
        } else if line.starts_with("BEGIN:DAYLIGHT") {
            daylight = seasonal_rule(lines, "END:DAYLIGHT", tz)?;
        } else {
            // Offsets and names are regenerated from the zone database.
        }
    }
    Ok(None)
}

fn seasonal_rule(
    lines: &mut Lines<'_>,
    end_marker: &str,
    tz: Tz,
) -> CalendarResult<Option<RecurrenceRule>> {
    let mut rule = None;
    for line in lines.by_ref() {
        if line.starts_with(end_marker) {
            return Ok(rule);
        }
        if line.starts_with("RRULE")
            && let Some(value) = property_value(line)
        {
            rule = Some(
                parse_rrule(value, tz).map_err(|_e| parse_error("VTIMEZONE", "RRULE", line))?,
            );
        }
    }
    Ok(rule)
}

/// Parses a `VFREEBUSY` block.
fn parse_free_busy(lines: &mut Lines<'_>, tz: Tz) -> CalendarResult<Option<VFreeBusy>> {
    let mut block = VFreeBusy::new();
    for line in lines.by_ref() {
        if line.starts_with("END:VFREEBUSY") {
            return Ok(Some(block));
        }
        if line.starts_with("DTSTART") {
            if let Some(value) = property_value(line) {
                let stamp = Timestamp::parse(value, tz)
                    .ok_or_else(|| parse_error("VFREEBUSY", "DTSTART", line))?;
                block.set_dtstart(stamp);
            }
        } else if line.starts_with("DTEND") {
            if let Some(value) = property_value(line) {
                let stamp = Timestamp::parse(value, tz)
                    .ok_or_else(|| parse_error("VFREEBUSY", "DTEND", line))?;
                block.set_dtend(stamp);
            }
        } else if line.starts_with("ATTENDEE") {
            if line.contains(':') {
                let person = Person::parse(PersonKind::Attendee, line)
                    .map_err(|_e| parse_error("VFREEBUSY", "ATTENDEE", line))?;
                block.add_attendee(person);
            }
        } else if line.starts_with("ORGANIZER") {
            if line.contains(':') {
                let person = Person::parse(PersonKind::Organizer, line)
                    .map_err(|_e| parse_error("VFREEBUSY", "ORGANIZER", line))?;
                block.add_organizer(person);
            }
        } else if line.starts_with("FREEBUSY") {
            if let Some(value) = property_value(line) {
                let periods = busy_periods(value, tz)
                    .ok_or_else(|| parse_error("VFREEBUSY", "FREEBUSY", line))?;
                block.add_all_busy(periods);
            }
        } else {
            // Other lines are ignored.
        }
    }
    Ok(None)
}
