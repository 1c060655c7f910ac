//! The schedulable component model shared by events, todos, and journals.
//!
//! All three kinds carry the same property bag and differ only in the status
//! keywords they accept and the lines they render, so a single [`Schedulable`]
//! type backs `VEVENT`, `VTODO`, and `VJOURNAL` alike.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::error::{CalendarError, CalendarResult};

use super::alarm::Alarm;
use super::duration::IcalDuration;
use super::period::Period;
use super::person::Person;
use super::rrule::RecurrenceRule;
use super::timestamp::Timestamp;

const EVENT_STATUSES: [&str; 3] = ["TENTATIVE", "CONFIRMED", "CANCELLED"];
const TODO_STATUSES: [&str; 4] = ["NEEDS-ACTION", "COMPLETED", "IN-PROCESS", "CANCELLED"];
const JOURNAL_STATUSES: [&str; 3] = ["DRAFT", "FINAL", "CANCELLED"];

/// Discriminates the three schedulable component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    Event,
    Todo,
    Journal,
}

impl ScheduleKind {
    /// The component name as it appears on `BEGIN` and `END` lines.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
        }
    }

    /// The status keywords a component of this kind accepts.
    #[must_use]
    pub fn allowed_statuses(&self) -> &'static [&'static str] {
        match self {
            Self::Event => &EVENT_STATUSES,
            Self::Todo => &TODO_STATUSES,
            Self::Journal => &JOURNAL_STATUSES,
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schedulable component of a calendar document.
///
/// Every component receives a fresh UID at construction so it can be stored
/// right away; a parsed `UID` line replaces it. Classification and exception
/// dates are kept for queries but never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedulable {
    kind: ScheduleKind,
    uid: String,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    class: Option<String>,
    status: Option<String>,
    categories: Vec<String>,
    created: Option<Timestamp>,
    last_modified: Option<Timestamp>,
    dtstamp: Option<Timestamp>,
    dtstart: Option<Timestamp>,
    dtend: Option<Timestamp>,
    due: Option<Timestamp>,
    duration: Option<IcalDuration>,
    percent: u8,
    attendees: BTreeMap<String, Person>,
    organizers: BTreeMap<String, Person>,
    exception_dates: Vec<Timestamp>,
    rule: Option<RecurrenceRule>,
    recurrence_id: Option<Timestamp>,
    alarms: Vec<Alarm>,
    extended: Vec<String>,
}

impl Schedulable {
    /// Creates an empty component of the given kind with a generated UID.
    #[must_use]
    pub fn new(kind: ScheduleKind) -> Self {
        Self {
            kind,
            uid: Uuid::new_v4().to_string(),
            summary: None,
            description: None,
            location: None,
            class: None,
            status: None,
            categories: Vec::new(),
            created: None,
            last_modified: None,
            dtstamp: None,
            dtstart: None,
            dtend: None,
            due: None,
            duration: None,
            percent: 0,
            attendees: BTreeMap::new(),
            organizers: BTreeMap::new(),
            exception_dates: Vec::new(),
            rule: None,
            recurrence_id: None,
            alarms: Vec::new(),
            extended: Vec::new(),
        }
    }

    pub fn set_uid(&mut self, uid: String) {
        self.uid = uid;
    }

    pub fn set_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }

    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }

    pub fn set_class(&mut self, class: String) {
        self.class = Some(class);
    }

    /// Sets the status keyword, normalized to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Validation`] when the keyword is not one this
    /// component kind accepts.
    pub fn set_status(&mut self, status: &str) -> CalendarResult<()> {
        let normalized = status.to_uppercase();
        if self.kind.allowed_statuses().contains(&normalized.as_str()) {
            self.status = Some(normalized);
            Ok(())
        } else {
            Err(CalendarError::Validation {
                field: "STATUS",
                reason: format!("{normalized} is not a {} status", self.kind),
            })
        }
    }

    /// Sets the completion percentage.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Validation`] when the value lies outside
    /// 0 to 100.
    pub fn set_percent(&mut self, percent: i64) -> CalendarResult<()> {
        match u8::try_from(percent) {
            Ok(value) if value <= 100 => {
                self.percent = value;
                Ok(())
            }
            _ => Err(CalendarError::Validation {
                field: "PERCENT-COMPLETE",
                reason: format!("completion must lie between 0 and 100, got {percent}"),
            }),
        }
    }

    pub fn add_category(&mut self, category: String) {
        self.categories.push(category);
    }

    pub fn set_created(&mut self, created: Timestamp) {
        self.created = Some(created);
    }

    pub fn set_last_modified(&mut self, last_modified: Timestamp) {
        self.last_modified = Some(last_modified);
    }

    pub fn set_dtstamp(&mut self, dtstamp: Timestamp) {
        self.dtstamp = Some(dtstamp);
    }

    pub fn set_dtstart(&mut self, dtstart: Timestamp) {
        self.dtstart = Some(dtstart);
    }

    pub fn set_dtend(&mut self, dtend: Timestamp) {
        self.dtend = Some(dtend);
    }

    pub fn set_due(&mut self, due: Timestamp) {
        self.due = Some(due);
    }

    pub fn set_duration(&mut self, duration: IcalDuration) {
        self.duration = Some(duration);
    }

    /// Registers an attendee, keyed (and deduplicated) by mail address.
    pub fn add_attendee(&mut self, person: Person) {
        self.attendees.insert(person.mailto().to_owned(), person);
    }

    /// Registers an organizer, keyed (and deduplicated) by mail address.
    pub fn add_organizer(&mut self, person: Person) {
        self.organizers.insert(person.mailto().to_owned(), person);
    }

    pub fn add_exception_date(&mut self, date: Timestamp) {
        self.exception_dates.push(date);
    }

    pub fn set_rule(&mut self, rule: RecurrenceRule) {
        self.rule = Some(rule);
    }

    pub fn set_recurrence_id(&mut self, recurrence_id: Timestamp) {
        self.recurrence_id = Some(recurrence_id);
    }

    pub fn add_alarm(&mut self, alarm: Alarm) {
        self.alarms.push(alarm);
    }

    pub fn add_extended(&mut self, line: String) {
        self.extended.push(line);
    }

    #[must_use]
    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn created(&self) -> Option<Timestamp> {
        self.created
    }

    #[must_use]
    pub fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
    }

    #[must_use]
    pub fn dtstamp(&self) -> Option<Timestamp> {
        self.dtstamp
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
    pub fn due(&self) -> Option<Timestamp> {
        self.due
    }

    #[must_use]
    pub fn duration(&self) -> Option<IcalDuration> {
        self.duration
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub fn attendees(&self) -> &BTreeMap<String, Person> {
        &self.attendees
    }

    #[must_use]
    pub fn organizers(&self) -> &BTreeMap<String, Person> {
        &self.organizers
    }

    #[must_use]
    pub fn exception_dates(&self) -> &[Timestamp] {
        &self.exception_dates
    }

    #[must_use]
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    #[must_use]
    pub fn recurrence_id(&self) -> Option<Timestamp> {
        self.recurrence_id
    }

    #[must_use]
    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    #[must_use]
    pub fn extended(&self) -> &[String] {
        &self.extended
    }

    /// Whether this component carries a recurrence rule.
    #[must_use]
    pub fn has_rule(&self) -> bool {
        self.rule.is_some()
    }

    /// Whether this component is a materialized occurrence of a recurring
    /// parent rather than a stored master.
    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// Whether the due date, when present, already lies in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.due.is_some_and(|due| due < Timestamp::now())
    }

    /// Whether this component describes a whole-day entry, meaning its start
    /// sits at local midnight and its end, when present, does too.
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.dtstart.is_some_and(|start| start.is_midnight())
            && self.dtend.is_none_or(|end| end.is_midnight())
    }

    /// Builds the materialized occurrence of this component for one expanded
    /// period, carrying the parent identity but anchored at the occurrence
    /// start.
    #[must_use]
    pub fn instance_for(&self, period: &Period) -> Self {
        let mut instance = Self::new(self.kind);
        instance.uid.clone_from(&self.uid);
        instance.summary.clone_from(&self.summary);
        instance.dtstamp = self.dtstamp;
        instance.dtstart = Some(period.start());
        instance.recurrence_id = Some(period.start());
        instance.duration = Some(IcalDuration::from_chrono(period.duration()));
        instance
    }

    /// Expands this component's recurrence into the concrete periods that
    /// fall inside `window`.
    #[must_use]
    pub fn expand(&self, window: &Period) -> Vec<Period> {
        crate::ical::expand::expand(self, window)
    }

    fn fmt_people(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attendee in self.attendees.values() {
            write!(f, "{attendee}\r\n")?;
        }
        for organizer in self.organizers.values() {
            write!(f, "{organizer}\r\n")?;
        }
        Ok(())
    }

    fn fmt_categories(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.categories.is_empty() {
            write!(f, "CATEGORIES:{}\r\n", self.categories.join(","))?;
        }
        Ok(())
    }

    fn fmt_event(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VEVENT\r\n")?;
        write!(f, "UID:{}\r\n", self.uid)?;
        if let Some(summary) = &self.summary {
            write!(f, "SUMMARY:{summary}\r\n")?;
        }
        if let Some(created) = self.created {
            write!(f, "{}\r\n", created.to_zoned_property("CREATED"))?;
        }
        if let Some(modified) = self.last_modified {
            write!(f, "{}\r\n", modified.to_zoned_property("LAST-MODIFIED"))?;
        }
        if let Some(stamp) = self.dtstamp {
            write!(f, "{}\r\n", stamp.to_zoned_property("DTSTAMP"))?;
        }
        if let Some(start) = self.dtstart {
            write!(f, "{}\r\n", start.to_zoned_property("DTSTART"))?;
        }
        if let Some(end) = self.dtend {
            write!(f, "{}\r\n", end.to_zoned_property("DTEND"))?;
        }
        if let Some(description) = &self.description {
            write!(f, "DESCRIPTION:{description}\r\n")?;
        }
        if let Some(location) = &self.location {
            write!(f, "LOCATION:{location}\r\n")?;
        }
        if let Some(status) = &self.status {
            write!(f, "STATUS:{status}\r\n")?;
        }
        self.fmt_categories(f)?;
        self.fmt_people(f)?;
        if let Some(duration) = &self.duration {
            write!(f, "DURATION:{duration}\r\n")?;
        }
        if let Some(rule) = &self.rule {
            write!(f, "RRULE:{rule}\r\n")?;
        }
        if let Some(id) = self.recurrence_id {
            write!(f, "{}\r\n", id.to_zoned_property("RECURRENCE-ID"))?;
        }
        for line in &self.extended {
            write!(f, "{line}\r\n")?;
        }
        for alarm in &self.alarms {
            write!(f, "{alarm}")?;
        }
        write!(f, "END:VEVENT\r\n")
    }

    fn fmt_todo(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VTODO\r\n")?;
        write!(f, "UID:{}\r\n", self.uid)?;
        if let Some(summary) = &self.summary {
            write!(f, "SUMMARY:{summary}\r\n")?;
        }
        if let Some(created) = self.created {
            write!(f, "{}\r\n", created.to_zoned_property("CREATED"))?;
        }
        if let Some(modified) = self.last_modified {
            write!(f, "{}\r\n", modified.to_zoned_property("LAST-MODIFIED"))?;
        }
        if let Some(stamp) = self.dtstamp {
            write!(f, "{}\r\n", stamp.to_zoned_property("DTSTAMP"))?;
        }
        if let Some(start) = self.dtstart {
            write!(f, "{}\r\n", start.to_zoned_property("DTSTART"))?;
        }
        if let Some(due) = self.due {
            write!(f, "{}\r\n", due.to_zoned_property("DUE"))?;
        }
        if let Some(status) = &self.status {
            write!(f, "STATUS:{status}\r\n")?;
        }
        write!(f, "PERCENT-COMPLETE:{}\r\n", self.percent)?;
        if let Some(description) = &self.description {
            write!(f, "DESCRIPTION:{description}\r\n")?;
        }
        if let Some(location) = &self.location {
            write!(f, "LOCATION:{location}\r\n")?;
        }
        self.fmt_categories(f)?;
        if let Some(duration) = &self.duration {
            write!(f, "DURATION:{duration}\r\n")?;
        }
        self.fmt_people(f)?;
        if let Some(rule) = &self.rule {
            write!(f, "RRULE:{rule}\r\n")?;
        }
        if let Some(id) = self.recurrence_id {
            write!(f, "{}\r\n", id.to_zoned_property("RECURRENCE-ID"))?;
        }
        for line in &self.extended {
            write!(f, "{line}\r\n")?;
        }
        for alarm in &self.alarms {
            write!(f, "{alarm}")?;
        }
        write!(f, "END:VTODO\r\n")
    }

    fn fmt_journal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VJOURNAL\r\n")?;
        write!(f, "UID:{}\r\n", self.uid)?;
        if let Some(modified) = self.last_modified {
            write!(f, "{}\r\n", modified.to_zoned_property("LAST-MODIFIED"))?;
        }
        if let Some(start) = self.dtstart {
            write!(f, "{}\r\n", start.to_zoned_property("DTSTART"))?;
        }
        if let Some(summary) = &self.summary {
            write!(f, "SUMMARY:{summary}\r\n")?;
        }
        if let Some(description) = &self.description {
            write!(f, "DESCRIPTION:{description}\r\n")?;
        }
        if let Some(status) = &self.status {
            write!(f, "STATUS:{status}\r\n")?;
        }
        self.fmt_categories(f)?;
        self.fmt_people(f)?;
        if let Some(rule) = &self.rule {
            write!(f, "RRULE:{rule}\r\n")?;
        }
        for line in &self.extended {
            write!(f, "{line}\r\n")?;
        }
        write!(f, "END:VJOURNAL\r\n")
    }
}

impl fmt::Display for Schedulable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScheduleKind::Event => self.fmt_event(f),
            ScheduleKind::Todo => self.fmt_todo(f),
            ScheduleKind::Journal => self.fmt_journal(f),
        }
    }
}
