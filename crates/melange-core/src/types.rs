use crate::error::MelangeError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProgramKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Gsoc,
    Gci,
}

impl ProgramKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgramKind::Gsoc => "gsoc",
            ProgramKind::Gci => "gci",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProgramKind {
    type Err = MelangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gsoc" => Ok(ProgramKind::Gsoc),
            "gci" => Ok(ProgramKind::Gci),
            _ => Err(MelangeError::invalid_name("program kind", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// OrgStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgStatus {
    New,
    Active,
    Inactive,
    Invalid,
}

impl fmt::Display for OrgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrgStatus::New => "new",
            OrgStatus::Active => "active",
            OrgStatus::Inactive => "inactive",
            OrgStatus::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ProposalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    Invalid,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Withdrawn => "withdrawn",
            ProposalStatus::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// GCI task states, spelled the way they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Unapproved,
    Unpublished,
    Open,
    Reopened,
    ClaimRequested,
    Claimed,
    ActionNeeded,
    NeedsWork,
    NeedsReview,
    Closed,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Unapproved,
            TaskStatus::Unpublished,
            TaskStatus::Open,
            TaskStatus::Reopened,
            TaskStatus::ClaimRequested,
            TaskStatus::Claimed,
            TaskStatus::ActionNeeded,
            TaskStatus::NeedsWork,
            TaskStatus::NeedsReview,
            TaskStatus::Closed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Unapproved => "Unapproved",
            TaskStatus::Unpublished => "Unpublished",
            TaskStatus::Open => "Open",
            TaskStatus::Reopened => "Reopened",
            TaskStatus::ClaimRequested => "ClaimRequested",
            TaskStatus::Claimed => "Claimed",
            TaskStatus::ActionNeeded => "ActionNeeded",
            TaskStatus::NeedsWork => "NeedsWork",
            TaskStatus::NeedsReview => "NeedsReview",
            TaskStatus::Closed => "Closed",
        }
    }

    /// States a student can request to claim from. Unpublished and
    /// unapproved tasks are hidden from students and must be published
    /// before anyone can claim them.
    pub fn is_claimable(self) -> bool {
        matches!(self, TaskStatus::Open | TaskStatus::Reopened)
    }

    /// States in which a student is assigned and the deadline is running.
    pub fn is_assigned(self) -> bool {
        matches!(
            self,
            TaskStatus::Claimed
                | TaskStatus::ActionNeeded
                | TaskStatus::NeedsWork
                | TaskStatus::NeedsReview
        )
    }

    /// Published tasks count against the organization's quota.
    pub fn is_published(self) -> bool {
        !matches!(self, TaskStatus::Unapproved | TaskStatus::Unpublished)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = MelangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| MelangeError::invalid_name("task status", s))
    }
}

// ---------------------------------------------------------------------------
// TaskDifficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDifficulty {
    Easy,
    Medium,
    Hard,
}

impl TaskDifficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskDifficulty::Easy => "easy",
            TaskDifficulty::Medium => "medium",
            TaskDifficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for TaskDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskDifficulty {
    type Err = MelangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(TaskDifficulty::Easy),
            "medium" => Ok(TaskDifficulty::Medium),
            "hard" => Ok(TaskDifficulty::Hard),
            _ => Err(MelangeError::invalid_name("task difficulty", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestStatus / RequestKind / Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Withdrawn => "withdrawn",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Sent by a user asking to join an organization.
    Request,
    /// Sent by an organization admin inviting a user.
    Invitation,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Request => f.write_str("Request"),
            RequestKind::Invitation => f.write_str("Invitation"),
        }
    }
}

impl std::str::FromStr for RequestKind {
    type Err = MelangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "request" => Ok(RequestKind::Request),
            "invitation" | "invite" => Ok(RequestKind::Invitation),
            _ => Err(MelangeError::invalid_name("request kind", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mentor,
    OrgAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::OrgAdmin => "org_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = MelangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mentor" => Ok(Role::Mentor),
            "org_admin" | "org-admin" => Ok(Role::OrgAdmin),
            _ => Err(MelangeError::invalid_name("role", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
