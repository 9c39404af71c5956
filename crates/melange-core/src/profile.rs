use crate::error::{MelangeError, Result};
use crate::types::Role;
use serde::{Deserialize, Serialize};

/// A user's participation in one program.
///
/// A profile is either a student or holds organization roles, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub key: String,
    pub program: String,
    /// Link id of the owning user.
    pub user: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_student: bool,
    #[serde(default)]
    pub is_mentor: bool,
    #[serde(default)]
    pub is_org_admin: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentor_for: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub org_admin_for: Vec<String>,
}

impl Profile {
    pub fn new(
        key: impl Into<String>,
        program: impl Into<String>,
        user: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            program: program.into(),
            user: user.into(),
            name: name.into(),
            email: email.into(),
            is_student: false,
            is_mentor: false,
            is_org_admin: false,
            mentor_for: Vec::new(),
            org_admin_for: Vec::new(),
        }
    }

    pub fn student(mut self) -> Self {
        self.is_student = true;
        self
    }

    pub fn is_mentor_for(&self, org: &str) -> bool {
        self.mentor_for.iter().any(|o| o == org)
    }

    pub fn is_org_admin_for(&self, org: &str) -> bool {
        self.org_admin_for.iter().any(|o| o == org)
    }

    /// Grant `role` for `org`. Granting twice changes nothing; org admins
    /// are mentors as well.
    pub fn grant_role(&mut self, org: &str, role: Role) -> Result<()> {
        if self.is_student {
            return Err(MelangeError::PermissionDenied(format!(
                "{} is a student and cannot hold organization roles",
                self.key
            )));
        }
        if role == Role::OrgAdmin {
            self.is_org_admin = true;
            if !self.is_org_admin_for(org) {
                self.org_admin_for.push(org.to_string());
            }
        }
        self.is_mentor = true;
        if !self.is_mentor_for(org) {
            self.mentor_for.push(org.to_string());
        }
        Ok(())
    }

    pub fn has_role(&self, org: &str, role: Role) -> bool {
        match role {
            Role::Mentor => self.is_mentor_for(org),
            Role::OrgAdmin => self.is_org_admin_for(org),
        }
    }
}

/// Keys of every profile that mentors or administers `org`, in profile order.
pub fn all_mentor_keys_for_org(profiles: &[Profile], org: &str) -> Vec<String> {
    profiles
        .iter()
        .filter(|p| p.is_mentor_for(org) || p.is_org_admin_for(org))
        .map(|p| p.key.clone())
        .collect()
}
