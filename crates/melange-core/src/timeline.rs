//! Program timeline and the period/event evaluator.
//!
//! Every lookup takes a logical name. Names resolve through fixed tables to
//! an [`Event`] (single timestamp) or a [`Period`] (start/end pair of events).
//! An unrecognized name never errors: the boolean checks answer `false`,
//! [`active_period`] answers `(None, None)` and [`get_date_time_by_name`]
//! answers `None`. A recognized name whose timestamp is unset behaves the
//! same way, so "unknown" is never "before" nor "after".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_end: Option<DateTime<Utc>>,
    /// Opening of the organization application survey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_signup_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_signup_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_organization_announced_deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_signup_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_signup_end: Option<DateTime<Utc>>,
    /// GSoC only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_students_announced_deadline: Option<DateTime<Utc>>,
    /// GCI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_publicly_visible: Option<DateTime<Utc>>,
    /// GCI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_claim_deadline: Option<DateTime<Utc>>,
    /// GCI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_all_work_deadline: Option<DateTime<Utc>>,
    /// GCI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_review_deadline: Option<DateTime<Utc>>,
}

impl Timeline {
    pub fn get(&self, event: Event) -> Option<DateTime<Utc>> {
        *event.slot(self)
    }

    pub fn set(&mut self, event: Event, value: Option<DateTime<Utc>>) {
        *event.slot_mut(self) = value;
    }

    pub fn window(&self, period: Period) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let (start, end) = period.bounds();
        (self.get(start), self.get(end))
    }

    /// Clear every boundary.
    pub fn clear(&mut self) {
        *self = Timeline::default();
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    ProgramStart,
    ProgramEnd,
    OrgSignupStart,
    OrgSignupEnd,
    AcceptedOrganizationAnnouncedDeadline,
    StudentSignupStart,
    StudentSignupEnd,
    AcceptedStudentsAnnouncedDeadline,
    TasksPubliclyVisible,
    TaskClaimDeadline,
    StopAllWorkDeadline,
    WorkReviewDeadline,
}

/// Logical event names, including the historical spellings still in use.
const EVENT_NAMES: &[(&str, Event)] = &[
    ("program_start", Event::ProgramStart),
    ("program_end", Event::ProgramEnd),
    ("org_signup_start", Event::OrgSignupStart),
    ("org_signup_end", Event::OrgSignupEnd),
    ("survey_start", Event::OrgSignupStart),
    ("survey_end", Event::OrgSignupEnd),
    (
        "accepted_organization_announced_deadline",
        Event::AcceptedOrganizationAnnouncedDeadline,
    ),
    (
        "accepted_organizations_announced_deadline",
        Event::AcceptedOrganizationAnnouncedDeadline,
    ),
    ("student_signup_start", Event::StudentSignupStart),
    ("student_signup_end", Event::StudentSignupEnd),
    (
        "accepted_students_announced_deadline",
        Event::AcceptedStudentsAnnouncedDeadline,
    ),
    ("tasks_publicly_visible", Event::TasksPubliclyVisible),
    ("task_claim_deadline", Event::TaskClaimDeadline),
    ("stop_all_work_deadline", Event::StopAllWorkDeadline),
    ("work_review_deadline", Event::WorkReviewDeadline),
];

impl Event {
    pub fn all() -> &'static [Event] {
        &[
            Event::ProgramStart,
            Event::ProgramEnd,
            Event::OrgSignupStart,
            Event::OrgSignupEnd,
            Event::AcceptedOrganizationAnnouncedDeadline,
            Event::StudentSignupStart,
            Event::StudentSignupEnd,
            Event::AcceptedStudentsAnnouncedDeadline,
            Event::TasksPubliclyVisible,
            Event::TaskClaimDeadline,
            Event::StopAllWorkDeadline,
            Event::WorkReviewDeadline,
        ]
    }

    /// Resolve a logical name. Unknown names yield `None`.
    pub fn lookup(name: &str) -> Option<Event> {
        EVENT_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, event)| *event)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::ProgramStart => "program_start",
            Event::ProgramEnd => "program_end",
            Event::OrgSignupStart => "org_signup_start",
            Event::OrgSignupEnd => "org_signup_end",
            Event::AcceptedOrganizationAnnouncedDeadline => {
                "accepted_organization_announced_deadline"
            }
            Event::StudentSignupStart => "student_signup_start",
            Event::StudentSignupEnd => "student_signup_end",
            Event::AcceptedStudentsAnnouncedDeadline => "accepted_students_announced_deadline",
            Event::TasksPubliclyVisible => "tasks_publicly_visible",
            Event::TaskClaimDeadline => "task_claim_deadline",
            Event::StopAllWorkDeadline => "stop_all_work_deadline",
            Event::WorkReviewDeadline => "work_review_deadline",
        }
    }

    fn slot(self, t: &Timeline) -> &Option<DateTime<Utc>> {
        match self {
            Event::ProgramStart => &t.program_start,
            Event::ProgramEnd => &t.program_end,
            Event::OrgSignupStart => &t.org_signup_start,
            Event::OrgSignupEnd => &t.org_signup_end,
            Event::AcceptedOrganizationAnnouncedDeadline => {
                &t.accepted_organization_announced_deadline
            }
            Event::StudentSignupStart => &t.student_signup_start,
            Event::StudentSignupEnd => &t.student_signup_end,
            Event::AcceptedStudentsAnnouncedDeadline => &t.accepted_students_announced_deadline,
            Event::TasksPubliclyVisible => &t.tasks_publicly_visible,
            Event::TaskClaimDeadline => &t.task_claim_deadline,
            Event::StopAllWorkDeadline => &t.stop_all_work_deadline,
            Event::WorkReviewDeadline => &t.work_review_deadline,
        }
    }

    fn slot_mut(self, t: &mut Timeline) -> &mut Option<DateTime<Utc>> {
        match self {
            Event::ProgramStart => &mut t.program_start,
            Event::ProgramEnd => &mut t.program_end,
            Event::OrgSignupStart => &mut t.org_signup_start,
            Event::OrgSignupEnd => &mut t.org_signup_end,
            Event::AcceptedOrganizationAnnouncedDeadline => {
                &mut t.accepted_organization_announced_deadline
            }
            Event::StudentSignupStart => &mut t.student_signup_start,
            Event::StudentSignupEnd => &mut t.student_signup_end,
            Event::AcceptedStudentsAnnouncedDeadline => {
                &mut t.accepted_students_announced_deadline
            }
            Event::TasksPubliclyVisible => &mut t.tasks_publicly_visible,
            Event::TaskClaimDeadline => &mut t.task_claim_deadline,
            Event::StopAllWorkDeadline => &mut t.stop_all_work_deadline,
            Event::WorkReviewDeadline => &mut t.work_review_deadline,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Program,
    OrgSignup,
    StudentSignup,
}

const PERIOD_NAMES: &[(&str, Period)] = &[
    ("program", Period::Program),
    ("org_signup", Period::OrgSignup),
    ("org_app", Period::OrgSignup),
    ("survey", Period::OrgSignup),
    ("student_signup", Period::StudentSignup),
    ("student_sign_up", Period::StudentSignup),
];

impl Period {
    pub fn all() -> &'static [Period] {
        &[Period::Program, Period::OrgSignup, Period::StudentSignup]
    }

    pub fn lookup(name: &str) -> Option<Period> {
        PERIOD_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, period)| *period)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Program => "program",
            Period::OrgSignup => "org_signup",
            Period::StudentSignup => "student_signup",
        }
    }

    pub fn bounds(self) -> (Event, Event) {
        match self {
            Period::Program => (Event::ProgramStart, Event::ProgramEnd),
            Period::OrgSignup => (Event::OrgSignupStart, Event::OrgSignupEnd),
            Period::StudentSignup => (Event::StudentSignupStart, Event::StudentSignupEnd),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// `now` precedes the start of the period.
pub fn is_before_period(timeline: &Timeline, period: &str, now: DateTime<Utc>) -> bool {
    let Some(period) = Period::lookup(period) else {
        return false;
    };
    matches!(timeline.window(period).0, Some(start) if now < start)
}

/// `now` is at or past the end of the period.
pub fn is_after_period(timeline: &Timeline, period: &str, now: DateTime<Utc>) -> bool {
    let Some(period) = Period::lookup(period) else {
        return false;
    };
    matches!(timeline.window(period).1, Some(end) if now >= end)
}

/// `start <= now < end`. Both boundaries must be set.
pub fn is_active_period(timeline: &Timeline, period: &str, now: DateTime<Utc>) -> bool {
    let Some(period) = Period::lookup(period) else {
        return false;
    };
    match timeline.window(period) {
        (Some(start), Some(end)) => start <= now && now < end,
        _ => false,
    }
}

pub fn active_period(
    timeline: &Timeline,
    period: &str,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match Period::lookup(period) {
        Some(period) => timeline.window(period),
        None => (None, None),
    }
}

pub fn is_before_event(timeline: &Timeline, event: &str, now: DateTime<Utc>) -> bool {
    matches!(get_date_time_by_name(timeline, event), Some(at) if now < at)
}

pub fn is_after_event(timeline: &Timeline, event: &str, now: DateTime<Utc>) -> bool {
    matches!(get_date_time_by_name(timeline, event), Some(at) if now >= at)
}

pub fn get_date_time_by_name(timeline: &Timeline, name: &str) -> Option<DateTime<Utc>> {
    Event::lookup(name).and_then(|event| timeline.get(event))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 6, 1, 12, 0, 0).unwrap()
    }

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    #[test]
    fn before_period() {
        let mut t = Timeline::default();
        t.program_start = Some(now() + days(10));
        assert!(is_before_period(&t, "program", now()));

        t.program_start = Some(now() - days(10));
        assert!(!is_before_period(&t, "program", now()));

        t.student_signup_start = Some(now() + days(10));
        assert!(is_before_period(&t, "student_signup", now()));

        t.student_signup_start = Some(now() - days(10));
        assert!(!is_before_period(&t, "student_signup", now()));

        assert!(!is_before_period(&t, "other_event", now()));
    }

    #[test]
    fn before_event() {
        let mut t = Timeline::default();
        t.program_start = Some(now() + days(20));
        assert!(is_before_event(&t, "program_start", now()));
        t.program_start = Some(now() - days(20));
        assert!(!is_before_event(&t, "program_start", now()));

        t.program_end = Some(now() + days(20));
        assert!(is_before_event(&t, "program_end", now()));
        t.program_end = Some(now() - days(20));
        assert!(!is_before_event(&t, "program_end", now()));

        t.accepted_organization_announced_deadline = Some(now() + days(20));
        assert!(is_before_event(
            &t,
            "accepted_organization_announced_deadline",
            now()
        ));
        t.accepted_organization_announced_deadline = Some(now() - days(20));
        assert!(!is_before_event(
            &t,
            "accepted_organization_announced_deadline",
            now()
        ));

        t.student_signup_end = Some(now() + days(20));
        assert!(is_before_event(&t, "student_signup_end", now()));

        assert!(!is_before_event(&t, "other_event", now()));
    }

    #[test]
    fn active_period_checks() {
        let mut t = Timeline::default();
        t.program_start = Some(now() - days(10));
        t.program_end = Some(now() + days(10));
        assert!(is_active_period(&t, "program", now()));
        assert!(!is_before_period(&t, "program", now()));
        assert!(!is_after_period(&t, "program", now()));

        t.program_start = Some(now() + days(10));
        t.program_end = Some(now() + days(20));
        assert!(!is_active_period(&t, "program", now()));

        t.program_start = Some(now() - days(20));
        t.program_end = Some(now() - days(10));
        assert!(!is_active_period(&t, "program", now()));

        t.student_signup_start = Some(now() - days(10));
        t.student_signup_end = Some(now() + days(20));
        assert!(is_active_period(&t, "student_signup", now()));

        assert!(!is_active_period(&t, "other_event", now()));
    }

    #[test]
    fn active_period_window_is_half_open() {
        let mut t = Timeline::default();
        t.program_start = Some(now());
        t.program_end = Some(now() + days(1));
        assert!(is_active_period(&t, "program", now()));
        assert!(!is_active_period(&t, "program", now() + days(1)));
        assert!(is_after_period(&t, "program", now() + days(1)));
    }

    #[test]
    fn active_period_returns_bounds() {
        let start = Utc.with_ymd_and_hms(2011, 4, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 4, 3, 0, 0, 0).unwrap();
        let mut t = Timeline::default();
        t.program_start = Some(start);
        t.program_end = Some(end);
        assert_eq!(active_period(&t, "program"), (Some(start), Some(end)));

        t.student_signup_start = Some(start);
        t.student_signup_end = Some(end);
        assert_eq!(active_period(&t, "student_sign_up"), (Some(start), Some(end)));

        assert_eq!(active_period(&t, "some_other_event"), (None, None));
    }

    #[test]
    fn after_period_and_event() {
        let mut t = Timeline::default();
        t.program_end = Some(now() - days(10));
        assert!(is_after_period(&t, "program", now()));
        t.program_end = Some(now() + days(10));
        assert!(!is_after_period(&t, "program", now()));
        assert!(!is_after_period(&t, "some_other_event", now()));

        t.program_start = Some(now() - days(10));
        assert!(is_after_event(&t, "program_start", now()));
        t.program_start = Some(now() + days(10));
        assert!(!is_after_event(&t, "program_start", now()));
        assert!(!is_after_event(&t, "some_other_event", now()));
    }

    #[test]
    fn unset_boundaries_are_neither_before_nor_after() {
        let t = Timeline::default();
        for name in ["program", "org_signup", "student_signup"] {
            assert!(!is_before_period(&t, name, now()));
            assert!(!is_after_period(&t, name, now()));
            assert!(!is_active_period(&t, name, now()));
        }
        assert!(!is_before_event(&t, "program_start", now()));
        assert!(!is_after_event(&t, "program_start", now()));
    }

    #[test]
    fn date_time_by_name_uses_aliases() {
        let deadline = Utc.with_ymd_and_hms(2011, 5, 4, 0, 0, 0).unwrap();
        let mut t = Timeline::default();
        t.accepted_organization_announced_deadline = Some(deadline);
        assert_eq!(
            get_date_time_by_name(&t, "accepted_organizations_announced_deadline"),
            Some(deadline)
        );
        assert_eq!(get_date_time_by_name(&t, "some_name"), None);
    }

    #[test]
    fn every_event_name_resolves_to_itself() {
        for event in Event::all() {
            assert_eq!(Event::lookup(event.as_str()), Some(*event));
        }
        for period in Period::all() {
            assert_eq!(Period::lookup(period.as_str()), Some(*period));
        }
    }
}
