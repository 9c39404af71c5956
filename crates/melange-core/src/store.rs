use crate::accounts::{normalize_account, Account};
use crate::comment::{self, Comment};
use crate::config::Config;
use crate::duplicates::{self, DuplicatesStatus, ProposalDuplicate};
use crate::error::{MelangeError, Result};
use crate::notification::{Notification, Outbox};
use crate::organization::{self, Organization};
use crate::paths;
use crate::profile::Profile;
use crate::program::Program;
use crate::proposal::{Project, Proposal};
use crate::ranking::{self, StudentRanking};
use crate::request::{self, Request, RequestAction};
use crate::slots::{self, SlotTransfer};
use crate::system::RequestContext;
use crate::task::{self, Task, TaskAction, TaskEnv, TaskJob, TaskOutcome};
use crate::types::{RequestKind, RequestStatus, Role, TaskDifficulty, TaskStatus};
use crate::user::{User, UserDirectory};
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Author name on comments the system posts by itself.
pub const SYSTEM_COMMENTER: &str = "Melange";

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Monotonic id counters, one per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    #[serde(default)]
    pub request: u32,
    #[serde(default)]
    pub task: u32,
    #[serde(default)]
    pub comment: u32,
    #[serde(default)]
    pub proposal: u32,
    #[serde(default)]
    pub project: u32,
}

fn next(seq: &mut u32, prefix: &str) -> String {
    *seq += 1;
    format!("{prefix}{}", *seq)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Every entity of one program, persisted as `.melange/state.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default = "default_version")]
    pub version: u32,
    pub program: Program,
    #[serde(default)]
    pub seq: Sequences,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub orgs: Vec<Organization>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub requests: Vec<Request>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub duplicates: Vec<ProposalDuplicate>,
    #[serde(default)]
    pub duplicate_statuses: Vec<DuplicatesStatus>,
    #[serde(default)]
    pub slot_transfers: Vec<SlotTransfer>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub rankings: Vec<StudentRanking>,
    /// Deferred task work, in queue order.
    #[serde(default)]
    pub jobs: Vec<TaskJob>,
    #[serde(default)]
    pub outbox: Outbox,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Registry {
    pub fn new(program: Program) -> Self {
        Self {
            version: default_version(),
            program,
            seq: Sequences::default(),
            users: Vec::new(),
            orgs: Vec::new(),
            profiles: Vec::new(),
            requests: Vec::new(),
            proposals: Vec::new(),
            projects: Vec::new(),
            duplicates: Vec::new(),
            duplicate_statuses: Vec::new(),
            slot_transfers: Vec::new(),
            tasks: Vec::new(),
            comments: Vec::new(),
            rankings: Vec::new(),
            jobs: Vec::new(),
            outbox: Outbox::default(),
            last_updated: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Err(MelangeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let registry: Registry = serde_yaml::from_str(&data)?;
        Ok(registry)
    }

    pub fn save(&mut self, root: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn org(&self, key: &str) -> Result<&Organization> {
        self.orgs
            .iter()
            .find(|o| o.key == key)
            .ok_or_else(|| MelangeError::not_found("organization", key))
    }

    pub fn profile(&self, key: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| MelangeError::not_found("profile", key))
    }

    fn profile_mut(&mut self, key: &str) -> Result<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| MelangeError::not_found("profile", key))
    }

    /// Profile of the logged-in user described by `ctx`.
    pub fn profile_for_context(&self, ctx: &RequestContext) -> Result<&Profile> {
        let user = self
            .current_user(ctx)
            .ok_or_else(|| MelangeError::PermissionDenied("nobody is logged in".to_string()))?;
        self.profiles
            .iter()
            .find(|p| p.user == user.link_id)
            .ok_or_else(|| MelangeError::not_found("profile", user.link_id))
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        task::find(&self.tasks, id)
    }

    pub fn request(&self, id: &str) -> Result<&Request> {
        self.requests
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| MelangeError::not_found("request", id))
    }

    fn emails_of<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        keys.into_iter()
            .filter_map(|k| self.profiles.iter().find(|p| &p.key == k))
            .map(|p| p.email.clone())
            .collect()
    }

    fn org_admin_emails(&self, org: &str) -> Vec<String> {
        self.profiles
            .iter()
            .filter(|p| p.is_org_admin_for(org))
            .map(|p| p.email.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Users, profiles and organizations
    // -----------------------------------------------------------------------

    pub fn add_user(&mut self, user: User) -> Result<()> {
        if !validate::is_link_id_format_valid(&user.link_id) {
            return Err(MelangeError::invalid_name("link id", user.link_id));
        }
        if self.user_by_link_id(&user.link_id).is_some() {
            return Err(MelangeError::AlreadyExists {
                kind: "user",
                key: user.link_id,
            });
        }
        if self.user_by_account(&user.account).is_some() {
            return Err(MelangeError::AlreadyExists {
                kind: "account",
                key: user.account.email,
            });
        }
        self.users.push(user);
        Ok(())
    }

    /// Create a user and their profile in this program under the same key.
    pub fn register(&mut self, link_id: &str, email: &str, name: &str, student: bool) -> Result<()> {
        if !validate::is_email_valid(email) {
            return Err(MelangeError::invalid_name("email", email));
        }
        if self.profile(link_id).is_ok() {
            return Err(MelangeError::AlreadyExists {
                kind: "profile",
                key: link_id.to_string(),
            });
        }
        let account = normalize_account(&Account::new(email));
        self.add_user(User::new(link_id, account.email.clone(), name))?;
        let mut profile = Profile::new(link_id, self.program.key.clone(), link_id, name, account.email);
        profile.is_student = student;
        self.profiles.push(profile);
        tracing::info!(profile = link_id, student, "profile registered");
        Ok(())
    }

    pub fn add_org(&mut self, org: Organization) -> Result<()> {
        if !validate::is_link_id_format_valid(&org.key) {
            return Err(MelangeError::invalid_name("organization key", org.key));
        }
        if self.org(&org.key).is_ok() {
            return Err(MelangeError::AlreadyExists {
                kind: "organization",
                key: org.key,
            });
        }
        self.orgs.push(org);
        Ok(())
    }

    /// Grant a role directly, as a program host would.
    pub fn grant_role(&mut self, profile: &str, org: &str, role: Role) -> Result<()> {
        self.org(org)?;
        self.profile_mut(profile)?.grant_role(org, role)
    }

    pub fn participating_orgs(&self) -> Vec<&Organization> {
        organization::participating_orgs(&self.program, &self.orgs)
    }

    pub fn remaining_task_quota(&self, org: &str) -> Result<i64> {
        Ok(organization::remaining_task_quota(self.org(org)?, &self.tasks))
    }

    // -----------------------------------------------------------------------
    // Requests and invitations
    // -----------------------------------------------------------------------

    pub fn create_request(
        &mut self,
        kind: RequestKind,
        role: Role,
        sender: &str,
        user: &str,
        org: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let org_name = self.org(org)?.name.clone();
        let sender_profile = self.profile(sender)?.clone();
        let user_profile = self.profile(user)?.clone();
        if self.requests.iter().any(|r| {
            r.user == user && r.org == org && r.role == role && r.status == RequestStatus::Pending
        }) {
            return Err(MelangeError::AlreadyExists {
                kind: "request",
                key: format!("{user} {role} for {org}"),
            });
        }

        let id = format!("R{}", self.seq.request + 1);
        let req = Request::create(id.clone(), kind, role, &sender_profile, &user_profile, org, now)?;
        self.seq.request += 1;
        self.requests.push(req);

        let mail = match kind {
            RequestKind::Request => Notification::bcc(
                self.org_admin_emails(org),
                format!("New {} request from {}", role, user_profile.name),
                format!("{} would like to become a {} for {}.", user_profile.name, role, org_name),
            ),
            RequestKind::Invitation => Notification::to(
                user_profile.email.clone(),
                format!("Invitation to become a {} for {}", role, org_name),
                format!("{} invited you to become a {} for {}.", sender_profile.name, role, org_name),
            ),
        };
        self.outbox.push(mail);
        tracing::info!(request = %id, kind = %kind, role = %role, org, "request created");
        Ok(id)
    }

    /// Apply `action` to a request. Accepting grants the role; the other side
    /// of the request is notified.
    pub fn act_on_request(
        &mut self,
        id: &str,
        actor: &str,
        action: RequestAction,
        now: DateTime<Utc>,
    ) -> Result<RequestStatus> {
        let actor = self.profile(actor)?.clone();
        let current = self.request(id)?.clone();

        let granted = if action == RequestAction::Accept {
            let mut target = self.profile(&current.user)?.clone();
            target.grant_role(&current.org, current.role)?;
            Some(target)
        } else {
            None
        };

        let req = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| MelangeError::not_found("request", id))?;
        let status = request::apply(req, &actor, action, now)?;
        let req = req.clone();

        if let Some(target) = granted {
            let key = target.key.clone();
            *self.profile_mut(&key)? = target;
        }

        let org_name = self.org(&req.org)?.name.clone();
        let user_email = self.profile(&req.user)?.email.clone();
        let recipients = match (req.kind, action.is_receiver_action()) {
            (RequestKind::Request, true) => vec![user_email],
            (RequestKind::Request, false) => self.org_admin_emails(&req.org),
            (RequestKind::Invitation, true) => self.emails_of([&req.sender]),
            (RequestKind::Invitation, false) => vec![user_email],
        };
        self.outbox.push(Notification::bcc(
            recipients,
            format!("{} to become a {} for {} is now {}", req.kind, req.role, org_name, status),
            format!("{} {} the {}.", actor.name, status, req.kind.to_string().to_lowercase()),
        ));
        Ok(status)
    }

    // -----------------------------------------------------------------------
    // GSoC proposals
    // -----------------------------------------------------------------------

    pub fn add_proposal(
        &mut self,
        org: &str,
        student: &str,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        self.org(org)?;
        if !self.profile(student)?.is_student {
            return Err(MelangeError::PermissionDenied(format!(
                "{student} is not a student"
            )));
        }
        let id = next(&mut self.seq.proposal, "P");
        self.proposals.push(Proposal::new(
            id.clone(),
            self.program.key.clone(),
            org,
            student,
            title,
            now,
        ));
        Ok(id)
    }

    /// Score, flag and assign a mentor to a proposal on behalf of its org.
    pub fn review_proposal(
        &mut self,
        id: &str,
        score: Option<i64>,
        accept_as_project: Option<bool>,
        mentor: Option<&str>,
    ) -> Result<()> {
        let org = self
            .proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| MelangeError::not_found("proposal", id))?
            .org
            .clone();
        if let Some(mentor) = mentor {
            if !self.profile(mentor)?.is_mentor_for(&org) {
                return Err(MelangeError::PermissionDenied(format!(
                    "{mentor} does not mentor for {org}"
                )));
            }
        }
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| MelangeError::not_found("proposal", id))?;
        if let Some(score) = score {
            proposal.score = score;
        }
        if let Some(flag) = accept_as_project {
            proposal.accept_as_project = flag;
        }
        if let Some(mentor) = mentor {
            proposal.mentor = Some(mentor.to_string());
        }
        Ok(())
    }

    pub fn next_project_id(&mut self) -> String {
        next(&mut self.seq.project, "J")
    }

    pub fn recalculate_duplicates(&mut self, now: DateTime<Utc>) -> usize {
        let program = self.program.key.clone();
        duplicates::recalculate(
            &mut self.duplicates,
            &mut self.duplicate_statuses,
            &program,
            &self.proposals,
            now,
        )
    }

    pub fn request_slot_transfer(&mut self, org: &str, nr_slots: u32, remarks: &str) -> Result<()> {
        let transfer = SlotTransfer::new(self.org(org)?, nr_slots, remarks);
        self.slot_transfers.push(transfer);
        Ok(())
    }

    /// Settle the oldest pending transfer of `org`.
    pub fn resolve_slot_transfer(&mut self, org: &str, accept: bool) -> Result<()> {
        let org_entry = self
            .orgs
            .iter_mut()
            .find(|o| o.key == org)
            .ok_or_else(|| MelangeError::not_found("organization", org))?;
        let transfer = self
            .slot_transfers
            .iter_mut()
            .find(|t| t.org == org && t.status == slots::SlotTransferStatus::Pending)
            .ok_or_else(|| MelangeError::not_found("pending slot transfer", org))?;
        slots::resolve_transfer(transfer, org_entry, accept)
    }

    // -----------------------------------------------------------------------
    // GCI tasks
    // -----------------------------------------------------------------------

    /// Create a task. Tasks by org admins start unpublished, tasks by other
    /// mentors need approval first.
    pub fn create_task(
        &mut self,
        org: &str,
        creator: &str,
        title: &str,
        difficulty: TaskDifficulty,
        hours: Option<u32>,
    ) -> Result<String> {
        self.org(org)?;
        let creator = self.profile(creator)?;
        if !creator.is_mentor_for(org) && !creator.is_org_admin_for(org) {
            return Err(MelangeError::PermissionDenied(format!(
                "{} does not mentor for {}",
                creator.key, org
            )));
        }
        let status = if creator.is_org_admin_for(org) {
            TaskStatus::Unpublished
        } else {
            TaskStatus::Unapproved
        };
        let creator_key = creator.key.clone();

        let id = next(&mut self.seq.task, "T");
        let mut t = Task::new(id.clone(), self.program.key.clone(), org, title);
        t.difficulty = difficulty;
        t.time_to_complete_hours = hours;
        t.status = status;
        t.mentors.push(creator_key.clone());
        t.subscribe(&creator_key);
        self.tasks.push(t);
        tracing::info!(task = %id, org, status = %status, "task created");
        Ok(id)
    }

    /// Post a comment on a task and mail its subscribers.
    fn post_comment(
        &mut self,
        task_id: &str,
        author: Option<&Profile>,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let t = self.task(task_id)?;
        let task_title = t.title.clone();
        let bcc = self.emails_of(&t.subscribers);
        let id = comment::add_comment(
            &mut self.comments,
            &mut self.seq.comment,
            task_id,
            author.map(|a| a.key.clone()),
            title,
            content,
            now,
        );
        let commenter = author.map_or(SYSTEM_COMMENTER, |a| a.name.as_str());
        self.outbox.push(Notification::bcc(
            bcc,
            comment::new_comment_subject(&self.program.name, &task_title, commenter),
            format!("{title}\n\n{content}"),
        ));
        Ok(id)
    }

    pub fn act_on_task(
        &mut self,
        id: &str,
        actor: &str,
        action: &TaskAction,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<TaskOutcome> {
        let actor = self.profile(actor)?.clone();
        match action {
            TaskAction::Claim => {
                if let Some(active) = task::active_task_for_student(&self.tasks, &actor.key) {
                    return Err(MelangeError::InvalidTransition {
                        from: active.status.to_string(),
                        action: action.to_string(),
                        reason: format!("{} is already working on {}", actor.key, active.id),
                    });
                }
            }
            TaskAction::Publish => {
                let org = self.task(id)?.org.clone();
                if self.remaining_task_quota(&org)? <= 0 {
                    return Err(MelangeError::PermissionDenied(format!(
                        "{org} has no task quota left"
                    )));
                }
            }
            _ => {}
        }

        let env = TaskEnv {
            timeline: &self.program.timeline,
            config: &config.tasks,
            now,
        };
        let t = task::find_mut(&mut self.tasks, id)?;
        let outcome = task::apply(t, &actor, action, &env)?;

        if let Some((title, content)) = &outcome.comment {
            self.post_comment(id, Some(&actor), title, content, now)?;
        }
        self.jobs.extend(outcome.jobs.iter().cloned());
        if outcome.deleted {
            self.tasks.retain(|t| t.id != id);
            comment::remove_comments_for(&mut self.comments, id);
            self.jobs.retain(|j| j.task() != id);
            tracing::info!(task = id, "task deleted");
        }
        Ok(outcome)
    }

    /// Run every queued job that is due at `now`. Returns how many ran.
    /// A failing job and the due jobs after it stay queued.
    pub fn run_jobs(&mut self, config: &Config, now: DateTime<Utc>) -> Result<usize> {
        let (due, later): (Vec<TaskJob>, Vec<TaskJob>) =
            std::mem::take(&mut self.jobs).into_iter().partition(|j| match j {
                TaskJob::UpdateTaskStatus { eta, .. } => *eta <= now,
                TaskJob::UpdateRanking { .. } => true,
            });
        self.jobs = later;

        let mut ran = 0;
        let mut due = due.into_iter();
        while let Some(job) = due.next() {
            if let Err(e) = self.run_job(&job, config, now) {
                tracing::warn!(job = ?job, error = %e, "job failed, requeued");
                self.jobs.push(job);
                self.jobs.extend(due);
                return Err(e);
            }
            ran += 1;
        }
        Ok(ran)
    }

    fn run_job(&mut self, job: &TaskJob, config: &Config, now: DateTime<Utc>) -> Result<()> {
        match job {
            TaskJob::UpdateTaskStatus { task: id, .. } => {
                if self.task(id).is_ok() {
                    self.update_task_status(id, config, now)?;
                }
            }
            TaskJob::UpdateRanking { task: id } => {
                if let Ok(t) = self.task(id) {
                    let t = t.clone();
                    ranking::update_ranking_with_task(&mut self.rankings, &t, &config.ranking)?;
                }
            }
        }
        Ok(())
    }

    fn update_task_status(&mut self, id: &str, config: &Config, now: DateTime<Utc>) -> Result<bool> {
        let t = task::find_mut(&mut self.tasks, id)?;
        let outcome = task::update_task_status(t, &config.tasks, now);
        self.jobs.extend(outcome.jobs.iter().cloned());
        match &outcome.comment {
            Some((title, content)) => {
                self.post_comment(id, None, title, content, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply the deadline rules to every task, queued or not. Returns how
    /// many tasks changed.
    pub fn sweep(&mut self, config: &Config, now: DateTime<Utc>) -> Result<usize> {
        let ids: Vec<String> = self.tasks.iter().map(|t| t.id.clone()).collect();
        let mut changed = 0;
        for id in ids {
            if self.update_task_status(&id, config, now)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn recalculate_ranking(&mut self, student: &str, config: &Config) -> Result<u32> {
        self.profile(student)?;
        let program = self.program.key.clone();
        let r = ranking::calculate_ranking_for_student(
            &mut self.rankings,
            &program,
            student,
            &self.tasks,
            &config.ranking,
        );
        Ok(r.points)
    }
}

impl UserDirectory for Registry {
    fn user_by_link_id(&self, link_id: &str) -> Option<User> {
        self.users.user_by_link_id(link_id)
    }

    fn user_by_account(&self, account: &Account) -> Option<User> {
        self.users.user_by_account(account)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ProgramPhase;
    use crate::types::ProgramKind;
    use chrono::Duration;
    use tempfile::TempDir;

    fn gci() -> (Registry, Config, DateTime<Utc>) {
        let now = Utc::now();
        let mut program = Program::new("gci2013", "Google Code-in 2013", ProgramKind::Gci).unwrap();
        ProgramPhase::TasksPubliclyVisible
            .apply(&mut program.timeline, ProgramKind::Gci, now)
            .unwrap();
        let mut reg = Registry::new(program);
        let mut org = Organization::new("melange", "gci2013", "Melange");
        org.task_quota_limit = 10;
        reg.add_org(org).unwrap();
        reg.register("admin", "admin@example.com", "Test Admin", false).unwrap();
        reg.grant_role("admin", "melange", Role::OrgAdmin).unwrap();
        reg.register("mentor", "mentor@example.com", "Test Mentor", false).unwrap();
        reg.grant_role("mentor", "melange", Role::Mentor).unwrap();
        reg.register("student", "student@example.com", "Test Student", true).unwrap();
        for i in 0..4 {
            reg.register(
                &format!("subscriber{i}"),
                &format!("subscriber{i}@example.com"),
                &format!("Subscriber {i}"),
                false,
            )
            .unwrap();
        }
        (reg, Config::default(), now)
    }

    fn open_task(reg: &mut Registry, cfg: &Config, now: DateTime<Utc>) -> String {
        let id = reg
            .create_task("melange", "admin", "Fix the docs", TaskDifficulty::Medium, None)
            .unwrap();
        reg.act_on_task(&id, "admin", &TaskAction::Publish, cfg, now).unwrap();
        let t = task::find_mut(&mut reg.tasks, &id).unwrap();
        for i in 0..4 {
            t.subscribe(&format!("subscriber{i}"));
        }
        reg.outbox.clear();
        reg.comments.clear();
        id
    }

    #[test]
    fn close_posts_one_comment_and_mails_each_subscriber_once() {
        let (mut reg, cfg, now) = gci();
        let id = open_task(&mut reg, &cfg, now);
        {
            let t = task::find_mut(&mut reg.tasks, &id).unwrap();
            t.status = TaskStatus::NeedsReview;
            t.student = Some("student".into());
            t.deadline = Some(now + Duration::hours(3));
        }

        reg.act_on_task(&id, "mentor", &TaskAction::Close, &cfg, now).unwrap();

        let t = reg.task(&id).unwrap();
        assert_eq!(t.status, TaskStatus::Closed);
        assert_eq!(t.deadline, None);
        assert_eq!(t.student.as_deref(), Some("student"));
        assert_eq!(comment::comments_for(&reg.comments, &id).len(), 1);
        let subject = "[Google Code-in 2013] New comment on Fix the docs by Test Mentor";
        for i in 0..4 {
            let mails = reg.outbox.sent_to(&format!("subscriber{i}@example.com"));
            assert_eq!(mails.len(), 1);
            assert_eq!(mails[0].subject, subject);
        }
        assert_eq!(reg.jobs, vec![TaskJob::UpdateRanking { task: id.clone() }]);

        assert_eq!(reg.run_jobs(&cfg, now).unwrap(), 1);
        assert_eq!(reg.rankings[0].points, 2);
        assert!(reg.jobs.is_empty());
    }

    #[test]
    fn claim_assign_and_overrun() {
        let (mut reg, cfg, now) = gci();
        let id = open_task(&mut reg, &cfg, now);

        reg.act_on_task(&id, "student", &TaskAction::Claim, &cfg, now).unwrap();
        reg.act_on_task(&id, "mentor", &TaskAction::Assign, &cfg, now).unwrap();
        assert_eq!(reg.task(&id).unwrap().status, TaskStatus::Claimed);
        assert_eq!(reg.jobs.len(), 1);

        // not due yet
        assert_eq!(reg.run_jobs(&cfg, now).unwrap(), 0);

        let overdue = now + Duration::hours(73);
        assert_eq!(reg.run_jobs(&cfg, overdue).unwrap(), 1);
        assert_eq!(reg.task(&id).unwrap().status, TaskStatus::ActionNeeded);
        let auto = comment::comments_for(&reg.comments, &id);
        assert_eq!(auto.last().unwrap().author, None);

        let final_pass = overdue + Duration::hours(25);
        assert_eq!(reg.run_jobs(&cfg, final_pass).unwrap(), 1);
        let t = reg.task(&id).unwrap();
        assert_eq!(t.status, TaskStatus::Reopened);
        assert_eq!(t.student, None);
    }

    #[test]
    fn failed_job_keeps_the_rest_queued() {
        let (mut reg, cfg, now) = gci();
        let open = open_task(&mut reg, &cfg, now);
        let due = TaskJob::UpdateTaskStatus {
            task: open.clone(),
            eta: now,
        };
        // ranking an open task fails
        reg.jobs = vec![TaskJob::UpdateRanking { task: open.clone() }, due.clone()];

        assert!(reg.run_jobs(&cfg, now).is_err());
        assert_eq!(reg.jobs, vec![TaskJob::UpdateRanking { task: open }, due]);
        assert!(reg.rankings.is_empty());
    }

    #[test]
    fn one_task_per_student() {
        let (mut reg, cfg, now) = gci();
        let first = open_task(&mut reg, &cfg, now);
        let second = open_task(&mut reg, &cfg, now);
        reg.act_on_task(&first, "student", &TaskAction::Claim, &cfg, now).unwrap();
        assert!(reg
            .act_on_task(&second, "student", &TaskAction::Claim, &cfg, now)
            .is_err());
    }

    #[test]
    fn publish_respects_quota() {
        let (mut reg, cfg, now) = gci();
        reg.orgs[0].task_quota_limit = 1;
        open_task(&mut reg, &cfg, now);
        let id = reg
            .create_task("melange", "admin", "Second", TaskDifficulty::Easy, None)
            .unwrap();
        assert!(reg.act_on_task(&id, "admin", &TaskAction::Publish, &cfg, now).is_err());
        assert_eq!(reg.remaining_task_quota("melange").unwrap(), 0);
    }

    #[test]
    fn mentor_tasks_need_approval() {
        let (mut reg, _, _) = gci();
        let id = reg
            .create_task("melange", "mentor", "Draft", TaskDifficulty::Hard, Some(24))
            .unwrap();
        assert_eq!(reg.task(&id).unwrap().status, TaskStatus::Unapproved);
        assert!(reg
            .create_task("melange", "student", "Nope", TaskDifficulty::Easy, None)
            .is_err());
    }

    #[test]
    fn delete_removes_task_and_comments() {
        let (mut reg, cfg, now) = gci();
        let id = open_task(&mut reg, &cfg, now);
        reg.act_on_task(
            &id,
            "mentor",
            &TaskAction::Comment {
                title: "Hello".into(),
                content: "World".into(),
            },
            &cfg,
            now,
        )
        .unwrap();
        reg.act_on_task(&id, "admin", &TaskAction::Delete, &cfg, now).unwrap();
        assert!(reg.task(&id).is_err());
        assert!(comment::comments_for(&reg.comments, &id).is_empty());
    }

    #[test]
    fn request_withdraw_resubmit_accept() {
        let (mut reg, _, now) = gci();
        reg.register("newbie", "newbie@example.com", "New Mentor", false).unwrap();
        let id = reg
            .create_request(RequestKind::Request, Role::Mentor, "newbie", "newbie", "melange", now)
            .unwrap();
        assert_eq!(reg.outbox.sent_to("admin@example.com").len(), 1);

        reg.act_on_request(&id, "newbie", RequestAction::Withdraw, now).unwrap();
        assert_eq!(reg.request(&id).unwrap().status, RequestStatus::Withdrawn);
        reg.act_on_request(&id, "newbie", RequestAction::Resubmit, now).unwrap();
        assert_eq!(reg.request(&id).unwrap().status, RequestStatus::Pending);

        reg.act_on_request(&id, "admin", RequestAction::Accept, now).unwrap();
        let p = reg.profile("newbie").unwrap();
        assert!(p.is_mentor);
        assert_eq!(p.mentor_for, vec!["melange"]);
        assert!(!p.is_org_admin);
        assert_eq!(reg.outbox.sent_to("newbie@example.com").len(), 1);

        let before = reg.request(&id).unwrap().clone();
        assert!(reg.act_on_request(&id, "admin", RequestAction::Reject, now).is_err());
        assert_eq!(reg.request(&id).unwrap(), &before);
    }

    #[test]
    fn invitation_resubmit_mails_invitee() {
        let (mut reg, _, now) = gci();
        reg.register("invitee", "invitee@example.com", "Invitee", false).unwrap();
        let id = reg
            .create_request(RequestKind::Invitation, Role::OrgAdmin, "admin", "invitee", "melange", now)
            .unwrap();
        reg.act_on_request(&id, "admin", RequestAction::Withdraw, now).unwrap();
        reg.act_on_request(&id, "admin", RequestAction::Resubmit, now).unwrap();
        assert_eq!(reg.outbox.sent_to("invitee@example.com").len(), 3);

        reg.act_on_request(&id, "invitee", RequestAction::Accept, now).unwrap();
        let p = reg.profile("invitee").unwrap();
        assert!(p.is_org_admin_for("melange"));
        assert!(p.is_mentor_for("melange"));
    }

    #[test]
    fn accepted_org_admin_request_updates_stored_profile_once() {
        let (mut reg, _, now) = gci();
        reg.register("helper", "helper@example.com", "Helper", false).unwrap();
        reg.grant_role("helper", "melange", Role::Mentor).unwrap();
        let id = reg
            .create_request(RequestKind::Request, Role::OrgAdmin, "helper", "helper", "melange", now)
            .unwrap();

        let status = reg.act_on_request(&id, "admin", RequestAction::Accept, now).unwrap();
        assert_eq!(status, RequestStatus::Accepted);
        let p = reg.profile("helper").unwrap();
        assert_eq!(p.org_admin_for, vec!["melange"]);
        assert_eq!(p.mentor_for, vec!["melange"]);
        assert_eq!(reg.profiles.iter().filter(|p| p.key == "helper").count(), 1);
    }

    #[test]
    fn duplicate_pending_request_is_refused() {
        let (mut reg, _, now) = gci();
        reg.register("newbie", "newbie@example.com", "New Mentor", false).unwrap();
        reg.create_request(RequestKind::Request, Role::Mentor, "newbie", "newbie", "melange", now)
            .unwrap();
        assert!(reg
            .create_request(RequestKind::Request, Role::Mentor, "newbie", "newbie", "melange", now)
            .is_err());
    }

    #[test]
    fn register_rejects_duplicates() {
        let (mut reg, _, _) = gci();
        assert!(reg.register("student", "x@example.com", "X", true).is_err());
        assert!(reg.register("other", "STUDENT@example.com", "X", true).is_err());
        assert!(reg.register("Bad-Id", "y@example.com", "Y", true).is_err());
    }

    #[test]
    fn profile_from_context() {
        let (reg, _, _) = gci();
        let ctx = RequestContext {
            user_email: "Mentor@Example.com".into(),
            ..RequestContext::default()
        };
        assert_eq!(reg.profile_for_context(&ctx).unwrap().key, "mentor");
        assert!(reg.profile_for_context(&RequestContext::default()).is_err());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Registry::load(dir.path()),
            Err(MelangeError::NotInitialized)
        ));
        let (mut reg, cfg, now) = gci();
        open_task(&mut reg, &cfg, now);
        reg.save(dir.path()).unwrap();
        let loaded = Registry::load(dir.path()).unwrap();
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.profiles.len(), reg.profiles.len());
        assert_eq!(loaded.program.timeline, reg.program.timeline);
    }
}
