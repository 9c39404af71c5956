use crate::dicts::Record;
use crate::program::Program;
use crate::task::Task;
use crate::types::OrgStatus;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub key: String,
    pub program: String,
    pub name: String,
    pub status: OrgStatus,
    /// GSoC: number of proposals the org may accept.
    #[serde(default)]
    pub slots: u32,
    /// GCI: number of tasks the org may publish.
    #[serde(default)]
    pub task_quota_limit: u32,
}

impl Organization {
    pub fn new(key: impl Into<String>, program: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            program: program.into(),
            name: name.into(),
            status: OrgStatus::Active,
            slots: 0,
            task_quota_limit: 0,
        }
    }
}

impl Record for Organization {
    fn scalar_fields(&self) -> &'static [&'static str] {
        &["key", "name", "status", "slots", "task_quota_limit"]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "key" => Some(json!(self.key)),
            "program" => Some(json!(self.program)),
            "name" => Some(json!(self.name)),
            "status" => Some(json!(self.status.to_string())),
            "slots" => Some(json!(self.slots)),
            "task_quota_limit" => Some(json!(self.task_quota_limit)),
            _ => None,
        }
    }
}

/// Active organizations of `program`.
pub fn participating_orgs<'a>(program: &Program, orgs: &'a [Organization]) -> Vec<&'a Organization> {
    orgs.iter()
        .filter(|o| o.program == program.key && o.status == OrgStatus::Active)
        .collect()
}

/// Tasks `org` may still publish. Negative when the quota was lowered below
/// what is already published.
pub fn remaining_task_quota(org: &Organization, tasks: &[Task]) -> i64 {
    let published = tasks
        .iter()
        .filter(|t| t.org == org.key && t.status.is_published())
        .count() as i64;
    i64::from(org.task_quota_limit) - published
}
