//! The calendar store: components keyed by UID plus document-level state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{CalendarError, CalendarResult};
use crate::ical::core::{Period, Schedulable, ScheduleKind, Timestamp, VFreeBusy, VTimeZone};

/// Product identifier emitted on every rendered document.
const PRODID: &str = "-//cadence//cadence-ical//EN";

/// An in-memory calendar document.
///
/// Events, todos, and journals are keyed by UID. The document timezone
/// governs how local times parse and render; it defaults to UTC until a
/// `VTIMEZONE` block replaces it.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    method: Option<String>,
    timezone: VTimeZone,
    events: HashMap<String, Schedulable>,
    todos: HashMap<String, Schedulable>,
    journals: HashMap<String, Schedulable>,
    free_busy: Option<VFreeBusy>,
}

impl Calendar {
    /// Creates an empty calendar in UTC.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a calendar document from text.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Parse`] naming the component and field of the
    /// first unreadable value.
    pub fn parse(input: &str) -> CalendarResult<Self> {
        crate::ical::parse::parse(input)
    }

    /// Stores `component` under its UID, routed by kind. An existing entry
    /// with the same UID is replaced.
    pub fn add(&mut self, component: Schedulable) {
        self.store_mut(component.kind())
            .insert(component.uid().to_owned(), component);
    }

    /// Stores an event under the document merge policy: a fresh UID inserts
    /// and a colliding UID overwrites, unless the stored event carries a
    /// recurrence-instance marker, in which case the newcomer is discarded.
    pub fn merge_event(&mut self, event: Schedulable) {
        let keep_stored = self
            .events
            .get(event.uid())
            .is_some_and(Schedulable::has_recurrence);
        if keep_stored {
            tracing::warn!(uid = event.uid(), "discarding duplicate of a recurrence instance");
            return;
        }
        self.add(event);
    }

    /// Looks up an event by UID, returning a copy.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no event has this UID.
    pub fn event(&self, uid: &str) -> CalendarResult<Schedulable> {
        lookup(&self.events, uid)
    }

    /// Looks up a todo by UID, returning a copy.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no todo has this UID.
    pub fn todo(&self, uid: &str) -> CalendarResult<Schedulable> {
        lookup(&self.todos, uid)
    }

    /// Looks up a journal by UID, returning a copy.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no journal has this UID.
    pub fn journal(&self, uid: &str) -> CalendarResult<Schedulable> {
        lookup(&self.journals, uid)
    }

    #[must_use]
    pub fn has_event(&self, uid: &str) -> bool {
        self.events.contains_key(uid)
    }

    #[must_use]
    pub fn has_todo(&self, uid: &str) -> bool {
        self.todos.contains_key(uid)
    }

    #[must_use]
    pub fn has_journal(&self, uid: &str) -> bool {
        self.journals.contains_key(uid)
    }

    /// Removes an event, reporting whether one was stored under this UID.
    pub fn remove_event(&mut self, uid: &str) -> bool {
        self.events.remove(uid).is_some()
    }

    /// Removes a todo, reporting whether one was stored under this UID.
    pub fn remove_todo(&mut self, uid: &str) -> bool {
        self.todos.remove(uid).is_some()
    }

    /// Removes a journal, reporting whether one was stored under this UID.
    pub fn remove_journal(&mut self, uid: &str) -> bool {
        self.journals.remove(uid).is_some()
    }

    /// Replaces a stored event.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no event has this UID.
    pub fn update_event(&mut self, event: Schedulable) -> CalendarResult<()> {
        let present = self.events.contains_key(event.uid());
        self.update(present, event)
    }

    /// Replaces a stored todo.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no todo has this UID.
    pub fn update_todo(&mut self, todo: Schedulable) -> CalendarResult<()> {
        let present = self.todos.contains_key(todo.uid());
        self.update(present, todo)
    }

    /// Replaces a stored journal.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotFound`] when no journal has this UID.
    pub fn update_journal(&mut self, journal: Schedulable) -> CalendarResult<()> {
        let present = self.journals.contains_key(journal.uid());
        self.update(present, journal)
    }

    fn update(&mut self, present: bool, component: Schedulable) -> CalendarResult<()> {
        if !present {
            return Err(CalendarError::NotFound {
                uid: component.uid().to_owned(),
            });
        }
        self.add(component);
        Ok(())
    }

    /// All events, sorted by UID.
    #[must_use]
    pub fn events(&self) -> Vec<Schedulable> {
        sorted(&self.events)
    }

    /// All todos, sorted by UID.
    #[must_use]
    pub fn todos(&self) -> Vec<Schedulable> {
        sorted(&self.todos)
    }

    /// All journals, sorted by UID.
    #[must_use]
    pub fn journals(&self) -> Vec<Schedulable> {
        sorted(&self.journals)
    }

    /// Events with at least one occurrence inside `window`, sorted by UID.
    #[must_use]
    pub fn events_between(&self, window: &Period) -> Vec<Schedulable> {
        in_window(&self.events, window)
    }

    /// Todos with at least one occurrence inside `window`, sorted by UID.
    #[must_use]
    pub fn todos_between(&self, window: &Period) -> Vec<Schedulable> {
        in_window(&self.todos, window)
    }

    /// Journals with at least one occurrence inside `window`, sorted by UID.
    #[must_use]
    pub fn journals_between(&self, window: &Period) -> Vec<Schedulable> {
        in_window(&self.journals, window)
    }

    /// Events with an occurrence on the day containing `at`.
    #[must_use]
    pub fn events_for_day(&self, at: Timestamp) -> Vec<Schedulable> {
        self.events_between(&Period::day_of(at))
    }

    /// Events with an occurrence in the week starting on the day of `at`.
    #[must_use]
    pub fn events_for_week(&self, at: Timestamp) -> Vec<Schedulable> {
        self.events_between(&Period::week_of(at))
    }

    /// Events with an occurrence in the month starting on the day of `at`.
    #[must_use]
    pub fn events_for_month(&self, at: Timestamp) -> Vec<Schedulable> {
        self.events_between(&Period::month_of(at))
    }

    /// Todos with an occurrence on the day containing `at`.
    #[must_use]
    pub fn todos_for_day(&self, at: Timestamp) -> Vec<Schedulable> {
        self.todos_between(&Period::day_of(at))
    }

    /// Journals with an occurrence on the day containing `at`.
    #[must_use]
    pub fn journals_for_day(&self, at: Timestamp) -> Vec<Schedulable> {
        self.journals_between(&Period::day_of(at))
    }

    /// Buckets the month starting on the day of `at` by day number, mapping
    /// each day to the events active on it. Days without events are absent.
    #[must_use]
    pub fn events_by_month_day(&self, at: Timestamp) -> BTreeMap<u32, Vec<Schedulable>> {
        let window = Period::month_of(at);
        let mut buckets: BTreeMap<u32, Vec<Schedulable>> = BTreeMap::new();
        for event in self.events_between(&window) {
            for period in event.expand(&window) {
                for day in period.days_in_window(&window) {
                    push_unique(buckets.entry(day).or_default(), &event);
                }
            }
        }
        buckets
    }

    /// Buckets the week starting on the day of `at` by weekday number
    /// (Monday is 1), mapping each weekday to the events active on it.
    #[must_use]
    pub fn events_by_weekday(&self, at: Timestamp) -> BTreeMap<u32, Vec<Schedulable>> {
        let window = Period::week_of(at);
        let mut buckets: BTreeMap<u32, Vec<Schedulable>> = BTreeMap::new();
        for event in self.events_between(&window) {
            for period in event.expand(&window) {
                for weekday in period.weekdays_in_window(&window) {
                    let bucket = buckets.entry(weekday.number_from_monday()).or_default();
                    push_unique(bucket, &event);
                }
            }
        }
        buckets
    }

    /// Todos that still need attention: status unset, NEEDS-ACTION, or
    /// IN-PROCESS.
    #[must_use]
    pub fn active_todos(&self) -> Vec<Schedulable> {
        let mut todos: Vec<Schedulable> = self
            .todos
            .values()
            .filter(|todo| {
                todo.status()
                    .is_none_or(|status| matches!(status, "NEEDS-ACTION" | "IN-PROCESS"))
            })
            .cloned()
            .collect();
        todos.sort_by(|a, b| a.uid().cmp(b.uid()));
        todos
    }

    /// Materializes every event occurrence in `window` as an instance copy
    /// anchored at the occurrence, sorted by UID then start.
    #[must_use]
    pub fn recurring_events(&self, window: &Period) -> Vec<Schedulable> {
        instances(&self.events, window)
    }

    /// Materializes every todo occurrence in `window` as an instance copy
    /// anchored at the occurrence, sorted by UID then start.
    #[must_use]
    pub fn recurring_todos(&self, window: &Period) -> Vec<Schedulable> {
        instances(&self.todos, window)
    }

    /// The parsed free/busy block, when the document carried one.
    #[must_use]
    pub fn free_busy(&self) -> Option<&VFreeBusy> {
        self.free_busy.as_ref()
    }

    /// Builds a free/busy summary for `window`: bounds from the window, busy
    /// entries from every event occurrence inside it, sorted by start.
    #[must_use]
    pub fn free_busy_between(&self, window: &Period) -> VFreeBusy {
        let mut block = VFreeBusy::new();
        block.set_dtstart(window.start());
        block.set_dtend(window.end());
        let mut busy: Vec<Period> = self
            .events
            .values()
            .flat_map(|event| event.expand(window))
            .collect();
        busy.sort_unstable();
        block.add_all_busy(busy);
        block
    }

    /// The scheduling method, when one was parsed.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn set_method(&mut self, method: String) {
        self.method = Some(method);
    }

    /// The document timezone governing local-time parsing and rendering.
    #[must_use]
    pub fn timezone(&self) -> &VTimeZone {
        &self.timezone
    }

    pub fn set_timezone(&mut self, timezone: VTimeZone) {
        self.timezone = timezone;
    }

    pub fn set_free_busy(&mut self, block: VFreeBusy) {
        self.free_busy = Some(block);
    }

    fn store_mut(&mut self, kind: ScheduleKind) -> &mut HashMap<String, Schedulable> {
        match kind {
            ScheduleKind::Event => &mut self.events,
            ScheduleKind::Todo => &mut self.todos,
            ScheduleKind::Journal => &mut self.journals,
        }
    }
}

fn lookup(store: &HashMap<String, Schedulable>, uid: &str) -> CalendarResult<Schedulable> {
    store
        .get(uid)
        .cloned()
        .ok_or_else(|| CalendarError::NotFound {
            uid: uid.to_owned(),
        })
}

fn sorted(store: &HashMap<String, Schedulable>) -> Vec<Schedulable> {
    let mut components: Vec<Schedulable> = store.values().cloned().collect();
    components.sort_by(|a, b| a.uid().cmp(b.uid()));
    components
}

fn in_window(store: &HashMap<String, Schedulable>, window: &Period) -> Vec<Schedulable> {
    let mut components: Vec<Schedulable> = store
        .values()
        .filter(|component| !component.expand(window).is_empty())
        .cloned()
        .collect();
    components.sort_by(|a, b| a.uid().cmp(b.uid()));
    components
}

fn instances(store: &HashMap<String, Schedulable>, window: &Period) -> Vec<Schedulable> {
    let mut components = Vec::new();
    for component in store.values() {
        for period in component.expand(window) {
            components.push(component.instance_for(&period));
        }
    }
    components.sort_by(|a, b| a.uid().cmp(b.uid()).then(a.dtstart().cmp(&b.dtstart())));
    components
}

fn push_unique(bucket: &mut Vec<Schedulable>, component: &Schedulable) {
    if !bucket.iter().any(|existing| existing.uid() == component.uid()) {
        bucket.push(component.clone());
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:VCALENDAR\r\n")?;
        write!(f, "VERSION:2.0\r\n")?;
        write!(f, "PRODID:{PRODID}\r\n")?;
        if let Some(method) = &self.method {
            write!(f, "METHOD:{method}\r\n")?;
        }
        write!(f, "{}", self.timezone)?;
        for event in self.events() {
            write!(f, "{event}")?;
        }
        for todo in self.todos() {
            write!(f, "{todo}")?;
        }
        for journal in self.journals() {
            write!(f, "{journal}")?;
        }
        write!(f, "END:VCALENDAR\r\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use crate::ical::core::{Frequency, RecurrenceRule};

    use super::*;

    fn ts(value: &str) -> Timestamp {
        Timestamp::parse(value, Tz::UTC).expect("test timestamp should parse")
    }

    fn sample(kind: ScheduleKind, uid: &str, start: &str, end: &str) -> Schedulable {
        let mut component = Schedulable::new(kind);
        component.set_uid(uid.to_owned());
        component.set_dtstart(ts(start));
        component.set_dtend(ts(end));
        component
    }

    fn daily(uid: &str, start: &str, end: &str, count: u32) -> Schedulable {
        let mut event = sample(ScheduleKind::Event, uid, start, end);
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Daily);
        rule.set_count(count);
        event.set_rule(rule);
        event
    }

    #[test]
    fn add_routes_by_kind_and_lookup_copies() {
        let mut calendar = Calendar::new();
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000"));
        calendar.add(sample(ScheduleKind::Todo, "t-1", "20240115T090000", "20240115T100000"));
        calendar.add(sample(ScheduleKind::Journal, "j-1", "20240115T090000", "20240115T100000"));

        assert!(calendar.has_event("e-1"));
        assert!(calendar.has_todo("t-1"));
        assert!(calendar.has_journal("j-1"));
        assert!(calendar.event("t-1").is_err());

        let error = calendar.event("ghost").expect_err("missing uid should fail");
        assert!(matches!(error, CalendarError::NotFound { uid } if uid == "ghost"));
    }

    #[test]
    fn remove_reports_whether_something_was_stored() {
        let mut calendar = Calendar::new();
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000"));

        assert!(calendar.remove_event("e-1"));
        assert!(!calendar.remove_event("e-1"));
        assert!(!calendar.remove_todo("t-1"));
    }

    #[test]
    fn update_requires_an_existing_entry() {
        let mut calendar = Calendar::new();
        let mut event = sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000");

        assert!(calendar.update_event(event.clone()).is_err());

        calendar.add(event.clone());
        event.set_summary("Rescheduled".to_owned());
        calendar.update_event(event).expect("update should succeed");
        let stored = calendar.event("e-1").expect("event should be stored");
        assert_eq!(stored.summary(), Some("Rescheduled"));
    }

    #[test]
    fn merge_overwrites_unless_the_stored_event_is_an_instance() {
        let mut calendar = Calendar::new();
        let mut first = sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000");
        first.set_summary("first".to_owned());
        calendar.merge_event(first);

        let mut second = sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000");
        second.set_summary("second".to_owned());
        calendar.merge_event(second);
        let stored = calendar.event("e-1").expect("event should be stored");
        assert_eq!(stored.summary(), Some("second"));

        let mut instance = sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000");
        instance.set_summary("instance".to_owned());
        instance.set_recurrence_id(ts("20240115T090000"));
        calendar.add(instance);

        let mut third = sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000");
        third.set_summary("third".to_owned());
        calendar.merge_event(third);
        let stored = calendar.event("e-1").expect("event should be stored");
        assert_eq!(stored.summary(), Some("instance"));
    }

    #[test]
    fn listings_are_sorted_by_uid() {
        let mut calendar = Calendar::new();
        calendar.add(sample(ScheduleKind::Event, "e-2", "20240115T090000", "20240115T100000"));
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240116T090000", "20240116T100000"));

        let events = calendar.events();
        let uids: Vec<&str> = events.iter().map(Schedulable::uid).collect();
        assert_eq!(uids, ["e-1", "e-2"]);
    }

    #[test]
    fn windowed_queries_keep_only_intersecting_components() {
        let mut calendar = Calendar::new();
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000"));

        let january = Period::new(ts("20240101"), ts("20240201")).expect("window should be valid");
        assert_eq!(calendar.events_between(&january).len(), 1);

        let february = Period::new(ts("20240201"), ts("20240301")).expect("window should be valid");
        assert!(calendar.events_between(&february).is_empty());

        assert_eq!(calendar.events_for_day(ts("20240115")).len(), 1);
        assert!(calendar.events_for_day(ts("20240116")).is_empty());
    }

    #[test]
    fn active_todos_filter_by_status() {
        let mut calendar = Calendar::new();
        let fresh = sample(ScheduleKind::Todo, "t-1", "20240115T090000", "20240115T100000");
        calendar.add(fresh);
        let mut started = sample(ScheduleKind::Todo, "t-2", "20240115T090000", "20240115T100000");
        started.set_status("IN-PROCESS").expect("status should be valid");
        calendar.add(started);
        let mut done = sample(ScheduleKind::Todo, "t-3", "20240115T090000", "20240115T100000");
        done.set_status("COMPLETED").expect("status should be valid");
        calendar.add(done);

        let active: Vec<String> = calendar
            .active_todos()
            .iter()
            .map(|todo| todo.uid().to_owned())
            .collect();
        assert_eq!(active, ["t-1", "t-2"]);
    }

    #[test]
    fn recurring_events_materialize_each_occurrence() {
        let mut calendar = Calendar::new();
        calendar.add(daily("e-1", "20240101T090000", "20240101T100000", 3));

        let window = Period::new(ts("20240101"), ts("20240201")).expect("window should be valid");
        let instances = calendar.recurring_events(&window);
        assert_eq!(instances.len(), 3);
        assert!(instances.iter().all(Schedulable::has_recurrence));
        let starts: Vec<String> = instances
            .iter()
            .map(|instance| {
                instance
                    .dtstart()
                    .expect("instance should be anchored")
                    .to_utc_string()
            })
            .collect();
        assert_eq!(
            starts,
            ["20240101T090000Z", "20240102T090000Z", "20240103T090000Z"]
        );
    }

    #[test]
    fn month_buckets_key_by_day_number() {
        let mut calendar = Calendar::new();
        calendar.add(daily("e-1", "20240101T090000", "20240101T100000", 3));

        let buckets = calendar.events_by_month_day(ts("20240101"));
        let days: Vec<u32> = buckets.keys().copied().collect();
        assert_eq!(days, [1, 2, 3]);
        assert_eq!(buckets[&1].len(), 1);
    }

    #[test]
    fn week_buckets_key_by_weekday_number() {
        // 2024-01-01 is a Monday.
        let mut calendar = Calendar::new();
        let mut event = sample(ScheduleKind::Event, "e-1", "20240101T090000", "20240101T100000");
        let mut rule = RecurrenceRule::new();
        rule.set_frequency(Frequency::Weekly);
        rule.set_count(2);
        rule.add_by_day("MO").expect("weekday token should parse");
        rule.add_by_day("WE").expect("weekday token should parse");
        event.set_rule(rule);
        calendar.add(event);

        let buckets = calendar.events_by_weekday(ts("20240101"));
        let weekdays: Vec<u32> = buckets.keys().copied().collect();
        assert_eq!(weekdays, [1, 3]);
    }

    #[test]
    fn free_busy_summary_covers_the_window() {
        let mut calendar = Calendar::new();
        calendar.add(sample(ScheduleKind::Event, "e-2", "20240116T140000", "20240116T150000"));
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000"));

        let window = Period::new(ts("20240101"), ts("20240201")).expect("window should be valid");
        let block = calendar.free_busy_between(&window);
        assert_eq!(
            block.dtstart().map(|stamp| stamp.to_utc_string()),
            Some("20240101T000000Z".to_owned())
        );
        let busy: Vec<String> = block
            .busy()
            .iter()
            .map(|period| period.start().to_utc_string())
            .collect();
        assert_eq!(busy, ["20240115T090000Z", "20240116T140000Z"]);
    }

    #[test]
    fn render_wraps_components_in_the_document_frame() {
        let mut calendar = Calendar::new();
        calendar.set_method("PUBLISH".to_owned());
        calendar.add(sample(ScheduleKind::Event, "e-1", "20240115T090000", "20240115T100000"));

        let text = calendar.to_string();
        assert!(text.starts_with(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//cadence//cadence-ical//EN\r\nMETHOD:PUBLISH\r\n"
        ));
        assert!(text.contains("BEGIN:VTIMEZONE\r\n"));
        assert!(text.contains("BEGIN:VEVENT\r\n"));
        assert!(text.ends_with("END:VCALENDAR\r\n"));
    }
}
