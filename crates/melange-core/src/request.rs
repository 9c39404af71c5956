use crate::error::{MelangeError, Result};
use crate::profile::Profile;
use crate::types::{RequestKind, RequestStatus, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request from a user to join an organization, or an invitation from the
/// organization to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub kind: RequestKind,
    pub role: Role,
    /// Profile key of the user who would receive the role.
    pub user: String,
    pub org: String,
    /// Profile key of whoever created the request.
    pub sender: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Request {
    /// Check who may file this request and build it.
    ///
    /// A user asks for a role for themselves. Only admins of `org` may invite.
    pub fn create(
        id: impl Into<String>,
        kind: RequestKind,
        role: Role,
        sender: &Profile,
        user: &Profile,
        org: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if user.is_student {
            return Err(MelangeError::PermissionDenied(format!(
                "{} is a student and cannot become a {}",
                user.key, role
            )));
        }
        if user.has_role(org, role) {
            return Err(MelangeError::AlreadyExists {
                kind: "role",
                key: format!("{} {} for {}", user.key, role, org),
            });
        }
        match kind {
            RequestKind::Request if sender.key != user.key => {
                return Err(MelangeError::PermissionDenied(
                    "requests can only be filed for oneself".to_string(),
                ));
            }
            RequestKind::Invitation if !sender.is_org_admin_for(org) => {
                return Err(MelangeError::PermissionDenied(format!(
                    "{} is not an admin of {}",
                    sender.key, org
                )));
            }
            _ => {}
        }
        Ok(Self {
            id: id.into(),
            kind,
            role,
            user: user.key.clone(),
            org: org.to_string(),
            sender: sender.key.clone(),
            status: RequestStatus::Pending,
            created_at: now,
            modified_at: None,
        })
    }
}

// ---------------------------------------------------------------------------
// RequestAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestAction {
    Accept,
    Reject,
    Withdraw,
    Resubmit,
}

impl RequestAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestAction::Accept => "Accept",
            RequestAction::Reject => "Reject",
            RequestAction::Withdraw => "Withdraw",
            RequestAction::Resubmit => "Resubmit",
        }
    }

    /// Accept and Reject belong to the receiving side, Withdraw and Resubmit
    /// to the sending side.
    pub fn is_receiver_action(self) -> bool {
        matches!(self, RequestAction::Accept | RequestAction::Reject)
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestAction {
    type Err = MelangeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accept" => Ok(RequestAction::Accept),
            "reject" => Ok(RequestAction::Reject),
            "withdraw" => Ok(RequestAction::Withdraw),
            "resubmit" => Ok(RequestAction::Resubmit),
            _ => Err(MelangeError::invalid_name("request action", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// The status `action` leads to from `status`.
pub fn next_status(status: RequestStatus, action: RequestAction) -> Result<RequestStatus> {
    use RequestAction::*;
    use RequestStatus::*;

    let next = match (status, action) {
        (Pending, Accept) => Accepted,
        (Pending, Reject) => Rejected,
        (Pending, Withdraw) => Withdrawn,
        (Withdrawn, Resubmit) => Pending,
        (Accepted, _) => {
            return Err(MelangeError::InvalidTransition {
                from: status.to_string(),
                action: action.to_string(),
                reason: "request was already accepted".to_string(),
            })
        }
        _ => {
            return Err(MelangeError::InvalidTransition {
                from: status.to_string(),
                action: action.to_string(),
                reason: format!("cannot {} a {} request", action.as_str().to_lowercase(), status),
            })
        }
    };
    Ok(next)
}

/// Check that `actor` sits on the side of the request that owns `action`.
///
/// For a request the user sends and the org admins receive; an invitation is
/// the other way round.
pub fn authorize(request: &Request, actor: &Profile, action: RequestAction) -> Result<()> {
    let is_user = actor.key == request.user;
    let is_admin = actor.is_org_admin_for(&request.org);
    let receiver_side = match request.kind {
        RequestKind::Request => is_admin,
        RequestKind::Invitation => is_user,
    };
    let sender_side = match request.kind {
        RequestKind::Request => is_user,
        RequestKind::Invitation => is_admin,
    };
    let allowed = if action.is_receiver_action() {
        receiver_side
    } else {
        sender_side
    };
    if allowed {
        Ok(())
    } else {
        Err(MelangeError::PermissionDenied(format!(
            "{} may not {} {} {}",
            actor.key,
            action.as_str().to_lowercase(),
            request.kind.to_string().to_lowercase(),
            request.id
        )))
    }
}

/// Authorize and apply `action`. The request is unchanged on error.
pub fn apply(
    request: &mut Request,
    actor: &Profile,
    action: RequestAction,
    now: DateTime<Utc>,
) -> Result<RequestStatus> {
    authorize(request, actor, action)?;
    let next = next_status(request.status, action)?;
    tracing::info!(
        request = %request.id,
        from = %request.status,
        to = %next,
        action = %action,
        "request transition"
    );
    request.status = next;
    request.modified_at = Some(now);
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
