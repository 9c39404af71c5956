use crate::organization::Organization;
use crate::types::ProposalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A GSoC student proposal to one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub program: String,
    pub org: String,
    /// Profile key of the student.
    pub student: String,
    pub title: String,
    #[serde(default)]
    pub score: i64,
    pub status: ProposalStatus,
    /// Set by the organization when it wants a slot spent on this proposal.
    #[serde(default)]
    pub accept_as_project: bool,
    /// Profile key of the assigned mentor.
    #[serde(default)]
    pub mentor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        id: impl Into<String>,
        program: impl Into<String>,
        org: impl Into<String>,
        student: impl Into<String>,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            org: org.into(),
            student: student.into(),
            title: title.into(),
            score: 0,
            status: ProposalStatus::Pending,
            accept_as_project: false,
            mentor: None,
            created_at: now,
        }
    }

    pub fn has_mentor(&self) -> bool {
        self.mentor.is_some()
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub program: String,
    pub org: String,
    pub student: String,
    /// Id of the proposal this project was accepted from.
    pub proposal: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentors: Vec<String>,
    pub status: String,
}

impl Project {
    pub fn from_proposal(id: impl Into<String>, proposal: &Proposal) -> Self {
        Self {
            id: id.into(),
            program: proposal.program.clone(),
            org: proposal.org.clone(),
            student: proposal.student.clone(),
            proposal: proposal.id.clone(),
            title: proposal.title.clone(),
            mentors: proposal.mentor.iter().cloned().collect(),
            status: "accepted".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Slot selection
// ---------------------------------------------------------------------------

/// Proposals of `org` that fill its remaining slots: pending, marked
/// `accept_as_project`, with a mentor. Highest score first; equal scores keep
/// the order in which the proposals were submitted. A student already
/// accepted anywhere in the program is skipped, and a student with several
/// candidates here only takes the slot of the best one.
pub fn proposals_to_be_accepted_for_org<'a>(
    org: &Organization,
    proposals: &'a [Proposal],
) -> Vec<&'a Proposal> {
    let accepted = proposals
        .iter()
        .filter(|p| p.org == org.key && p.status == ProposalStatus::Accepted)
        .count();
    let remaining = (org.slots as usize).saturating_sub(accepted);
    if remaining == 0 {
        return Vec::new();
    }

    let already_accepted = |student: &str| {
        proposals.iter().any(|p| {
            p.program == org.program && p.student == student && p.status == ProposalStatus::Accepted
        })
    };
    let mut candidates: Vec<&Proposal> = proposals
        .iter()
        .filter(|p| {
            p.org == org.key
                && p.status == ProposalStatus::Pending
                && p.accept_as_project
                && p.has_mentor()
                && !already_accepted(p.student.as_str())
        })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    let mut students: Vec<String> = Vec::new();
    candidates.retain(|p| {
        if students.contains(&p.student) {
            return false;
        }
        students.push(p.student.clone());
        true
    });
    candidates.truncate(remaining);
    candidates
}

pub fn proposals_for_student<'a>(proposals: &'a [Proposal], student: &str) -> Vec<&'a Proposal> {
    proposals.iter().filter(|p| p.student == student).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn org(slots: u32) -> Organization {
        let mut org = Organization::new("melange", "gsoc2013", "Melange");
        org.slots = slots;
        org
    }

    fn proposal(id: &str, score: i64) -> Proposal {
        let mut p = Proposal::new(id, "gsoc2013", "melange", format!("student-{id}"), id, Utc::now());
        p.score = score;
        p.accept_as_project = true;
        p.mentor = Some("mentor".into());
        p
    }

    #[test]
    fn picks_highest_score_within_slots() {
        let proposals = vec![proposal("P1", 2), proposal("P2", 5)];
        let chosen = proposals_to_be_accepted_for_org(&org(1), &proposals);
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id, "P2");
    }

    #[test]
    fn full_org_gets_nothing() {
        let mut a = proposal("P1", 1);
        a.status = ProposalStatus::Accepted;
        let mut b = proposal("P2", 1);
        b.status = ProposalStatus::Accepted;
        let proposals = vec![a, b, proposal("P3", 9)];
        assert!(proposals_to_be_accepted_for_org(&org(2), &proposals).is_empty());
    }

    #[test]
    fn requires_mentor_and_flag() {
        let mut no_mentor = proposal("P1", 9);
        no_mentor.mentor = None;
        let mut not_flagged = proposal("P2", 8);
        not_flagged.accept_as_project = false;
        let mut withdrawn = proposal("P3", 7);
        withdrawn.status = ProposalStatus::Withdrawn;
        let proposals = vec![no_mentor, not_flagged, withdrawn, proposal("P4", 1)];

        let chosen = proposals_to_be_accepted_for_org(&org(5), &proposals);
        let ids: Vec<&str> = chosen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P4"]);
    }

    #[test]
    fn ties_keep_submission_order() {
        let proposals = vec![proposal("P1", 3), proposal("P2", 3), proposal("P3", 3)];
        let chosen = proposals_to_be_accepted_for_org(&org(2), &proposals);
        let ids: Vec<&str> = chosen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[test]
    fn student_accepted_elsewhere_leaves_slot_to_next() {
        let mut elsewhere = proposal("P1", 1);
        elsewhere.org = "apache".into();
        elsewhere.student = "x".into();
        elsewhere.status = ProposalStatus::Accepted;
        let mut top = proposal("P2", 9);
        top.student = "x".into();
        let mut next = proposal("P3", 5);
        next.student = "y".into();
        let proposals = vec![elsewhere, top, next];

        let chosen = proposals_to_be_accepted_for_org(&org(1), &proposals);
        let ids: Vec<&str> = chosen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P3"]);
    }

    #[test]
    fn student_takes_one_slot_per_org() {
        let mut a = proposal("P1", 9);
        a.student = "x".into();
        let mut b = proposal("P2", 8);
        b.student = "x".into();
        let proposals = vec![a, b, proposal("P3", 1)];

        let chosen = proposals_to_be_accepted_for_org(&org(2), &proposals);
        let ids: Vec<&str> = chosen.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
    }

    #[test]
    fn project_copies_proposal() {
        let p = proposal("P1", 1);
        let project = Project::from_proposal("J1", &p);
        assert_eq!(project.proposal, "P1");
        assert_eq!(project.student, "student-P1");
        assert_eq!(project.mentors, vec!["mentor"]);
        assert_eq!(project.status, "accepted");
    }
}
