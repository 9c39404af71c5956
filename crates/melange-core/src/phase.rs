use crate::error::{MelangeError, Result};
use crate::timeline::{Event, Timeline};
use crate::types::ProgramKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance of a "past" or "future" boundary from `now` when a phase is applied.
const PHASE_OFFSET_DAYS: i64 = 100;

// ---------------------------------------------------------------------------
// ProgramPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramPhase {
    OffSeason,
    Kickoff,
    OrgSignup,
    OrgsAnnounced,
    StudentSignup,
    /// GSoC only.
    PostStudentSignup,
    /// GSoC only.
    StudentsAnnounced,
    /// GCI only.
    TasksPubliclyVisible,
    /// GCI only.
    TaskClaimEnded,
    /// GCI only.
    PencilDown,
}

#[derive(Clone, Copy)]
enum Mark {
    Past,
    Future,
}

use Mark::{Future, Past};

impl ProgramPhase {
    pub fn all() -> &'static [ProgramPhase] {
        &[
            ProgramPhase::OffSeason,
            ProgramPhase::Kickoff,
            ProgramPhase::OrgSignup,
            ProgramPhase::OrgsAnnounced,
            ProgramPhase::StudentSignup,
            ProgramPhase::PostStudentSignup,
            ProgramPhase::StudentsAnnounced,
            ProgramPhase::TasksPubliclyVisible,
            ProgramPhase::TaskClaimEnded,
            ProgramPhase::PencilDown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgramPhase::OffSeason => "off_season",
            ProgramPhase::Kickoff => "kickoff",
            ProgramPhase::OrgSignup => "org_signup",
            ProgramPhase::OrgsAnnounced => "orgs_announced",
            ProgramPhase::StudentSignup => "student_signup",
            ProgramPhase::PostStudentSignup => "post_student_signup",
            ProgramPhase::StudentsAnnounced => "students_announced",
            ProgramPhase::TasksPubliclyVisible => "tasks_publicly_visible",
            ProgramPhase::TaskClaimEnded => "task_claim_ended",
            ProgramPhase::PencilDown => "pencil_down",
        }
    }

    pub fn applies_to(self, kind: ProgramKind) -> bool {
        match self {
            ProgramPhase::PostStudentSignup | ProgramPhase::StudentsAnnounced => {
                kind == ProgramKind::Gsoc
            }
            ProgramPhase::TasksPubliclyVisible
            | ProgramPhase::TaskClaimEnded
            | ProgramPhase::PencilDown => kind == ProgramKind::Gci,
            _ => true,
        }
    }

    /// Boundaries shared by both program kinds, in `Event::all()` order:
    /// program start/end, org signup start/end, org announcement,
    /// student signup start/end.
    fn common_marks(self) -> [Mark; 7] {
        match self {
            ProgramPhase::OffSeason => [Past; 7],
            ProgramPhase::Kickoff => [Past, Future, Future, Future, Future, Future, Future],
            ProgramPhase::OrgSignup => [Past, Future, Past, Future, Future, Future, Future],
            ProgramPhase::OrgsAnnounced | ProgramPhase::TasksPubliclyVisible => {
                [Past, Future, Past, Past, Past, Future, Future]
            }
            ProgramPhase::StudentSignup
            | ProgramPhase::TaskClaimEnded
            | ProgramPhase::PencilDown => [Past, Future, Past, Past, Past, Past, Future],
            ProgramPhase::PostStudentSignup | ProgramPhase::StudentsAnnounced => {
                [Past, Future, Past, Past, Past, Past, Past]
            }
        }
    }

    fn gsoc_marks(self) -> Vec<(Event, Mark)> {
        let announced = match self {
            ProgramPhase::OffSeason | ProgramPhase::StudentsAnnounced => Past,
            _ => Future,
        };
        vec![(Event::AcceptedStudentsAnnouncedDeadline, announced)]
    }

    fn gci_marks(self) -> Vec<(Event, Mark)> {
        let (visible, claim, stop) = match self {
            ProgramPhase::OffSeason => (Past, Past, Past),
            ProgramPhase::Kickoff | ProgramPhase::OrgSignup | ProgramPhase::OrgsAnnounced => {
                (Future, Future, Future)
            }
            ProgramPhase::StudentSignup | ProgramPhase::TasksPubliclyVisible => {
                (Past, Future, Future)
            }
            ProgramPhase::TaskClaimEnded => (Past, Past, Future),
            ProgramPhase::PencilDown => (Past, Past, Past),
            ProgramPhase::PostStudentSignup | ProgramPhase::StudentsAnnounced => {
                (Future, Future, Future)
            }
        };
        let mut marks = vec![
            (Event::TasksPubliclyVisible, visible),
            (Event::TaskClaimDeadline, claim),
            (Event::StopAllWorkDeadline, stop),
        ];
        if self == ProgramPhase::TasksPubliclyVisible {
            marks.push((Event::WorkReviewDeadline, Future));
        }
        marks
    }

    /// Rewrite every boundary of `timeline` so that `now` falls in this phase.
    ///
    /// Boundaries that do not belong to `kind` are cleared.
    pub fn apply(self, timeline: &mut Timeline, kind: ProgramKind, now: DateTime<Utc>) -> Result<()> {
        if !self.applies_to(kind) {
            return Err(MelangeError::invalid_name(
                "phase",
                format!("{self} for {kind} program"),
            ));
        }

        let past = now - Duration::days(PHASE_OFFSET_DAYS);
        let future = now + Duration::days(PHASE_OFFSET_DAYS);
        let at = |mark: Mark| match mark {
            Past => past,
            Future => future,
        };

        timeline.clear();
        for (event, mark) in Event::all().iter().zip(self.common_marks()) {
            timeline.set(*event, Some(at(mark)));
        }
        let extra = match kind {
            ProgramKind::Gsoc => self.gsoc_marks(),
            ProgramKind::Gci => self.gci_marks(),
        };
        for (event, mark) in extra {
            timeline.set(event, Some(at(mark)));
        }

        tracing::debug!(phase = %self, kind = %kind, "timeline rewritten");
        Ok(())
    }
}

impl fmt::Display for ProgramPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProgramPhase {
    type Err = MelangeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        ProgramPhase::all()
            .iter()
            .copied()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| MelangeError::invalid_name("phase", s))
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

impl Timeline {
    /// Classify the live phase of a program of `kind` at `now`.
    pub fn current_phase(&self, kind: ProgramKind, now: DateTime<Utc>) -> ProgramPhase {
        let before = |at: Option<DateTime<Utc>>| matches!(at, Some(at) if now < at);
        let after = |at: Option<DateTime<Utc>>| matches!(at, Some(at) if now >= at);

        if self.program_start.is_none() || before(self.program_start) || after(self.program_end) {
            return ProgramPhase::OffSeason;
        }
        if before(self.org_signup_start) {
            return ProgramPhase::Kickoff;
        }
        if !after(self.org_signup_end) {
            return ProgramPhase::OrgSignup;
        }

        match kind {
            ProgramKind::Gsoc => {
                if before(self.student_signup_start) {
                    ProgramPhase::OrgsAnnounced
                } else if before(self.student_signup_end) {
                    ProgramPhase::StudentSignup
                } else if before(self.accepted_students_announced_deadline) {
                    ProgramPhase::PostStudentSignup
                } else {
                    ProgramPhase::StudentsAnnounced
                }
            }
            ProgramKind::Gci => {
                if !after(self.tasks_publicly_visible) {
                    ProgramPhase::OrgsAnnounced
                } else if !after(self.task_claim_deadline) {
                    if after(self.student_signup_start) {
                        ProgramPhase::StudentSignup
                    } else {
                        ProgramPhase::TasksPubliclyVisible
                    }
                } else if !after(self.stop_all_work_deadline) {
                    ProgramPhase::TaskClaimEnded
                } else {
                    ProgramPhase::PencilDown
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{is_active_period, is_after_event, is_before_event, is_before_period};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 11, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn every_phase_round_trips_through_current_phase() {
        for kind in [ProgramKind::Gsoc, ProgramKind::Gci] {
            for phase in ProgramPhase::all().iter().filter(|p| p.applies_to(kind)) {
                let mut t = Timeline::default();
                phase.apply(&mut t, kind, now()).unwrap();
                assert_eq!(t.current_phase(kind, now()), *phase, "{kind} {phase}");
            }
        }
    }

    #[test]
    fn kickoff_only_program_start_is_past() {
        let mut t = Timeline::default();
        ProgramPhase::Kickoff
            .apply(&mut t, ProgramKind::Gsoc, now())
            .unwrap();
        assert!(is_after_event(&t, "program_start", now()));
        assert!(is_before_period(&t, "org_signup", now()));
        assert!(is_before_period(&t, "student_signup", now()));
        assert!(is_before_event(&t, "accepted_students_announced_deadline", now()));
        assert!(t.tasks_publicly_visible.is_none());
    }

    #[test]
    fn gci_student_signup_opens_tasks() {
        let mut t = Timeline::default();
        ProgramPhase::StudentSignup
            .apply(&mut t, ProgramKind::Gci, now())
            .unwrap();
        assert!(is_active_period(&t, "student_signup", now()));
        assert!(is_after_event(&t, "tasks_publicly_visible", now()));
        assert!(is_before_event(&t, "task_claim_deadline", now()));
        assert!(t.accepted_students_announced_deadline.is_none());
    }

    #[test]
    fn gsoc_only_phase_rejected_for_gci() {
        let mut t = Timeline::default();
        let err = ProgramPhase::StudentsAnnounced
            .apply(&mut t, ProgramKind::Gci, now())
            .unwrap_err();
        assert!(err.to_string().contains("students_announced"));
    }

    #[test]
    fn empty_timeline_is_off_season() {
        let t = Timeline::default();
        assert_eq!(t.current_phase(ProgramKind::Gsoc, now()), ProgramPhase::OffSeason);
    }

    #[test]
    fn parses_dashed_names() {
        assert_eq!(
            "pencil-down".parse::<ProgramPhase>().unwrap(),
            ProgramPhase::PencilDown
        );
        assert!("lunch".parse::<ProgramPhase>().is_err());
    }
}
