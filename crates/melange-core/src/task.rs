use crate::config::TaskConfig;
use crate::error::{MelangeError, Result};
use crate::profile::Profile;
use crate::timeline::{self, Timeline};
use crate::types::{TaskDifficulty, TaskStatus};
use crate::validate;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSubmission {
    pub id: String,
    /// Profile key of the submitting student.
    pub student: String,
    pub url: String,
    pub submitted_at: DateTime<Utc>,
}

/// A GCI task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub program: String,
    pub org: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: TaskDifficulty,
    /// Hours granted on assignment; the configured default when unset.
    #[serde(default)]
    pub time_to_complete_hours: Option<u32>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentors: Vec<String>,
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscribers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submissions: Vec<WorkSubmission>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        program: impl Into<String>,
        org: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            org: org.into(),
            title: title.into(),
            description: String::new(),
            difficulty: TaskDifficulty::Easy,
            time_to_complete_hours: None,
            status: TaskStatus::Unpublished,
            mentors: Vec::new(),
            student: None,
            deadline: None,
            subscribers: Vec::new(),
            submissions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_student(&self, profile: &Profile) -> bool {
        self.student.as_deref() == Some(profile.key.as_str())
    }

    pub fn subscribe(&mut self, profile: &str) -> bool {
        if self.subscribers.iter().any(|s| s == profile) {
            return false;
        }
        self.subscribers.push(profile.to_string());
        true
    }

    pub fn unsubscribe(&mut self, profile: &str) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s != profile);
        before != self.subscribers.len()
    }

    fn hours_to_complete(&self, config: &TaskConfig) -> u32 {
        self.time_to_complete_hours
            .unwrap_or(config.default_hours_to_complete)
    }
}

// ---------------------------------------------------------------------------
// TaskAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Comment { title: String, content: String },
    Publish,
    Unpublish,
    Delete,
    Claim,
    Unclaim,
    Assign,
    Unassign,
    Close,
    NeedsWork,
    ExtendDeadline { hours: u32 },
    Subscribe,
    Unsubscribe,
    SubmitWork { url: String },
    DeleteSubmission { id: String },
    SendForReview,
}

impl TaskAction {
    pub fn name(&self) -> &'static str {
        match self {
            TaskAction::Comment { .. } => "comment",
            TaskAction::Publish => "publish",
            TaskAction::Unpublish => "unpublish",
            TaskAction::Delete => "delete",
            TaskAction::Claim => "claim",
            TaskAction::Unclaim => "unclaim",
            TaskAction::Assign => "assign",
            TaskAction::Unassign => "unassign",
            TaskAction::Close => "close",
            TaskAction::NeedsWork => "needs_work",
            TaskAction::ExtendDeadline { .. } => "extend_deadline",
            TaskAction::Subscribe => "subscribe",
            TaskAction::Unsubscribe => "unsubscribe",
            TaskAction::SubmitWork { .. } => "submit_work",
            TaskAction::DeleteSubmission { .. } => "delete_submission",
            TaskAction::SendForReview => "send_for_review",
        }
    }

    /// Parse an action that takes no argument. Accepts the `button_` prefix
    /// used by the task page forms.
    pub fn parse_simple(name: &str) -> Result<Self> {
        let name = name.strip_prefix("button_").unwrap_or(name).replace('-', "_");
        let action = match name.as_str() {
            "publish" => TaskAction::Publish,
            "unpublish" => TaskAction::Unpublish,
            "delete" => TaskAction::Delete,
            "claim" => TaskAction::Claim,
            "unclaim" => TaskAction::Unclaim,
            "assign" => TaskAction::Assign,
            "unassign" => TaskAction::Unassign,
            "close" => TaskAction::Close,
            "needs_work" => TaskAction::NeedsWork,
            "subscribe" => TaskAction::Subscribe,
            "unsubscribe" => TaskAction::Unsubscribe,
            "send_for_review" => TaskAction::SendForReview,
            _ => return Err(MelangeError::invalid_name("task action", name)),
        };
        Ok(action)
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Deferred work queued by a task action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskJob {
    /// Re-check the task's deadline once `eta` has passed.
    UpdateTaskStatus { task: String, eta: DateTime<Utc> },
    /// Credit the task's student with its difficulty points.
    UpdateRanking { task: String },
}

impl TaskJob {
    pub fn task(&self) -> &str {
        match self {
            TaskJob::UpdateTaskStatus { task, .. } | TaskJob::UpdateRanking { task } => task,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutcome {
    /// Title and content of the comment to post; subscribers are notified.
    pub comment: Option<(String, String)>,
    pub jobs: Vec<TaskJob>,
    pub deleted: bool,
}

impl TaskOutcome {
    fn comment(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            comment: Some((title.into(), content.into())),
            ..Self::default()
        }
    }
}

/// Everything a task action reads besides the task and the actor.
#[derive(Debug, Clone, Copy)]
pub struct TaskEnv<'a> {
    pub timeline: &'a Timeline,
    pub config: &'a TaskConfig,
    pub now: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Permission checks
// ---------------------------------------------------------------------------

fn denied(actor: &Profile, action: &TaskAction, task: &Task) -> MelangeError {
    MelangeError::PermissionDenied(format!(
        "{} may not {} task {}",
        actor.key, action, task.id
    ))
}

fn require_mentor(task: &Task, actor: &Profile, action: &TaskAction) -> Result<()> {
    if actor.is_mentor_for(&task.org) || actor.is_org_admin_for(&task.org) {
        Ok(())
    } else {
        Err(denied(actor, action, task))
    }
}

fn require_org_admin(task: &Task, actor: &Profile, action: &TaskAction) -> Result<()> {
    if actor.is_org_admin_for(&task.org) {
        Ok(())
    } else {
        Err(denied(actor, action, task))
    }
}

fn require_task_student(task: &Task, actor: &Profile, action: &TaskAction) -> Result<()> {
    if actor.is_student && task.is_student(actor) {
        Ok(())
    } else {
        Err(denied(actor, action, task))
    }
}

fn require_status(task: &Task, action: &TaskAction, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(MelangeError::InvalidTransition {
            from: task.status.to_string(),
            action: action.to_string(),
            reason: format!("task {} is {}", task.id, task.status),
        })
    }
}

fn require_work_allowed(task: &Task, action: &TaskAction, env: &TaskEnv<'_>) -> Result<()> {
    if timeline::is_after_event(env.timeline, "stop_all_work_deadline", env.now) {
        return Err(MelangeError::InvalidTransition {
            from: task.status.to_string(),
            action: action.to_string(),
            reason: "all work on tasks has stopped".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Apply `action` to `task` on behalf of `actor`.
///
/// The task is left untouched when an error is returned. Every change of
/// status produces exactly one comment in the outcome.
pub fn apply(
    task: &mut Task,
    actor: &Profile,
    action: &TaskAction,
    env: &TaskEnv<'_>,
) -> Result<TaskOutcome> {
    let from = task.status;
    let outcome = match action {
        TaskAction::Comment { title, content } => {
            if title.trim().is_empty() && content.trim().is_empty() {
                return Err(MelangeError::MissingKey("comment".to_string()));
            }
            TaskOutcome::comment(title.clone(), content.clone())
        }
        TaskAction::Publish => {
            require_org_admin(task, actor, action)?;
            require_status(
                task,
                action,
                matches!(from, TaskStatus::Unpublished | TaskStatus::Unapproved),
            )?;
            task.status = TaskStatus::Open;
            TaskOutcome::comment("Task Published", "The task has been published.")
        }
        TaskAction::Unpublish => {
            require_org_admin(task, actor, action)?;
            require_status(task, action, from.is_claimable())?;
            task.status = TaskStatus::Unpublished;
            TaskOutcome::comment("Task Unpublished", "The task has been unpublished.")
        }
        TaskAction::Delete => {
            require_org_admin(task, actor, action)?;
            require_status(task, action, task.student.is_none())?;
            TaskOutcome {
                deleted: true,
                ..TaskOutcome::default()
            }
        }
        TaskAction::Claim => {
            if !actor.is_student {
                return Err(denied(actor, action, task));
            }
            require_status(task, action, from.is_claimable())?;
            let visible = timeline::is_after_event(env.timeline, "tasks_publicly_visible", env.now);
            let claim_closed = timeline::is_after_event(env.timeline, "task_claim_deadline", env.now);
            if !visible || claim_closed {
                return Err(MelangeError::InvalidTransition {
                    from: from.to_string(),
                    action: action.to_string(),
                    reason: "tasks cannot be claimed at this time".to_string(),
                });
            }
            task.status = TaskStatus::ClaimRequested;
            task.student = Some(actor.key.clone());
            task.subscribe(&actor.key);
            TaskOutcome::comment(
                "Task Claimed",
                format!("{} would like to work on this task.", actor.name),
            )
        }
        TaskAction::Unclaim => {
            require_task_student(task, actor, action)?;
            require_status(
                task,
                action,
                from == TaskStatus::ClaimRequested || from.is_assigned(),
            )?;
            task.status = TaskStatus::Reopened;
            task.student = None;
            task.deadline = None;
            TaskOutcome::comment(
                "Claim Removed",
                format!("{} has withdrawn from this task.", actor.name),
            )
        }
        TaskAction::Assign => {
            require_mentor(task, actor, action)?;
            require_status(task, action, from == TaskStatus::ClaimRequested)?;
            let deadline = env.now + Duration::hours(i64::from(task.hours_to_complete(env.config)));
            task.status = TaskStatus::Claimed;
            task.deadline = Some(deadline);
            let mut outcome = TaskOutcome::comment(
                "Task Assigned",
                format!("This task has been assigned. The deadline is {}.", deadline.format("%Y-%m-%d %H:%M UTC")),
            );
            outcome.jobs.push(TaskJob::UpdateTaskStatus {
                task: task.id.clone(),
                eta: deadline,
            });
            outcome
        }
        TaskAction::Unassign => {
            require_mentor(task, actor, action)?;
            require_status(
                task,
                action,
                from == TaskStatus::ClaimRequested || from.is_assigned(),
            )?;
            task.status = TaskStatus::Reopened;
            task.student = None;
            task.deadline = None;
            TaskOutcome::comment("Task Reopened", "This task has been unassigned and reopened.")
        }
        TaskAction::Close => {
            require_mentor(task, actor, action)?;
            require_status(task, action, from == TaskStatus::NeedsReview)?;
            task.status = TaskStatus::Closed;
            task.deadline = None;
            let mut outcome =
                TaskOutcome::comment("Task Closed", "Congratulations, this task has been closed.");
            outcome.jobs.push(TaskJob::UpdateRanking {
                task: task.id.clone(),
            });
            outcome
        }
        TaskAction::NeedsWork => {
            require_mentor(task, actor, action)?;
            require_status(task, action, from == TaskStatus::NeedsReview)?;
            task.status = TaskStatus::NeedsWork;
            task.deadline = None;
            TaskOutcome::comment("Task Needs More Work", "The submitted work needs more work.")
        }
        TaskAction::ExtendDeadline { hours } => {
            require_mentor(task, actor, action)?;
            require_status(task, action, from.is_assigned())?;
            if *hours == 0 {
                return Err(MelangeError::invalid_name("deadline extension", hours.to_string()));
            }
            let deadline = task.deadline.unwrap_or(env.now) + Duration::hours(i64::from(*hours));
            task.deadline = Some(deadline);
            let mut outcome = TaskOutcome::comment(
                "Deadline Extended",
                format!("The deadline has been extended by {hours} hours."),
            );
            outcome.jobs.push(TaskJob::UpdateTaskStatus {
                task: task.id.clone(),
                eta: deadline,
            });
            outcome
        }
        TaskAction::Subscribe => {
            task.subscribe(&actor.key);
            TaskOutcome::default()
        }
        TaskAction::Unsubscribe => {
            task.unsubscribe(&actor.key);
            TaskOutcome::default()
        }
        TaskAction::SubmitWork { url } => {
            require_task_student(task, actor, action)?;
            require_status(task, action, from.is_assigned() && from != TaskStatus::NeedsReview)?;
            require_work_allowed(task, action, env)?;
            if !validate::is_url_valid(url) {
                return Err(MelangeError::invalid_name("work url", url.clone()));
            }
            let next = task.submissions.len() + 1;
            task.submissions.push(WorkSubmission {
                id: format!("{}-W{}", task.id, next),
                student: actor.key.clone(),
                url: url.clone(),
                submitted_at: env.now,
            });
            TaskOutcome::default()
        }
        TaskAction::DeleteSubmission { id } => {
            require_task_student(task, actor, action)?;
            let pos = task
                .submissions
                .iter()
                .position(|s| &s.id == id && s.student == actor.key)
                .ok_or_else(|| MelangeError::not_found("work submission", id.clone()))?;
            task.submissions.remove(pos);
            TaskOutcome::default()
        }
        TaskAction::SendForReview => {
            require_task_student(task, actor, action)?;
            require_status(task, action, from.is_assigned() && from != TaskStatus::NeedsReview)?;
            require_work_allowed(task, action, env)?;
            if task.submissions.is_empty() {
                return Err(MelangeError::InvalidTransition {
                    from: from.to_string(),
                    action: action.to_string(),
                    reason: "no work has been submitted".to_string(),
                });
            }
            task.status = TaskStatus::NeedsReview;
            TaskOutcome::comment(
                "Ready for review",
                format!("{} has submitted the work for review.", actor.name),
            )
        }
    };

    if task.status != from {
        tracing::info!(task = %task.id, from = %from, to = %task.status, action = %action, "task transition");
    }
    Ok(outcome)
}

/// Deadline sweep for one task.
///
/// A claimed task (or one sent back for more work) that is past its deadline
/// needs action from the student and gets a grace period. A task still
/// needing action after the grace period is reopened.
pub fn update_task_status(task: &mut Task, config: &TaskConfig, now: DateTime<Utc>) -> TaskOutcome {
    let Some(deadline) = task.deadline else {
        return TaskOutcome::default();
    };
    if now < deadline {
        return TaskOutcome::default();
    }
    let from = task.status;
    let outcome = match from {
        TaskStatus::Claimed | TaskStatus::NeedsWork => {
            let grace = now + Duration::hours(i64::from(config.action_needed_hours));
            task.status = TaskStatus::ActionNeeded;
            task.deadline = Some(grace);
            let mut outcome = TaskOutcome::comment(
                "Initial Deadline passed",
                format!(
                    "The deadline has passed. The student has {} more hours to finish the task.",
                    config.action_needed_hours
                ),
            );
            outcome.jobs.push(TaskJob::UpdateTaskStatus {
                task: task.id.clone(),
                eta: grace,
            });
            outcome
        }
        TaskStatus::ActionNeeded => {
            task.status = TaskStatus::Reopened;
            task.student = None;
            task.deadline = None;
            TaskOutcome::comment(
                "Task Reopened",
                "The final deadline has passed and the task has been reopened.",
            )
        }
        _ => TaskOutcome::default(),
    };
    if task.status != from {
        tracing::info!(task = %task.id, from = %from, to = %task.status, "task deadline sweep");
    }
    outcome
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn find<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| MelangeError::not_found("task", id))
}

pub fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| MelangeError::not_found("task", id))
}

/// The task `student` is currently requesting or working on, if any.
pub fn active_task_for_student<'a>(tasks: &'a [Task], student: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| {
        t.student.as_deref() == Some(student)
            && (t.status == TaskStatus::ClaimRequested || t.status.is_assigned())
    })
}

/// Closed tasks credited to `student`.
pub fn closed_tasks_for_student<'a>(tasks: &'a [Task], student: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Closed && t.student.as_deref() == Some(student))
        .collect()
}

/// "3/10 tasks closed, 2 in progress, 4 open"
pub fn summarize(tasks: &[Task]) -> String {
    let total = tasks.len();
    let closed = tasks.iter().filter(|t| t.status == TaskStatus::Closed).count();
    let in_progress = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::ClaimRequested || t.status.is_assigned())
        .count();
    let open = tasks.iter().filter(|t| t.status.is_claimable()).count();
    format!("{closed}/{total} tasks closed, {in_progress} in progress, {open} open")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ProgramPhase;
    use crate::types::{ProgramKind, Role};

    struct Fixture {
        timeline: Timeline,
        config: TaskConfig,
        now: DateTime<Utc>,
        task: Task,
        mentor: Profile,
        admin: Profile,
        student: Profile,
    }

    impl Fixture {
        fn new(status: TaskStatus) -> Self {
            let now = Utc::now();
            let mut timeline = Timeline::default();
            ProgramPhase::TasksPubliclyVisible
                .apply(&mut timeline, ProgramKind::Gci, now)
                .unwrap();
            let mut mentor = Profile::new("mentor", "gci2013", "mentor", "Test Mentor", "mentor@example.com");
            mentor.grant_role("melange", Role::Mentor).unwrap();
            let mut admin = Profile::new("admin", "gci2013", "admin", "Test Admin", "admin@example.com");
            admin.grant_role("melange", Role::OrgAdmin).unwrap();
            let student =
                Profile::new("student", "gci2013", "student", "Test Student", "student@example.com").student();
            let mut task = Task::new("T1", "gci2013", "melange", "Fix the docs");
            task.status = status;
            task.mentors.push("mentor".into());
            Self {
                timeline,
                config: TaskConfig::default(),
                now,
                task,
                mentor,
                admin,
                student,
            }
        }

        fn with_student(mut self) -> Self {
            self.task.student = Some("student".into());
            self.task.deadline = Some(self.now + Duration::hours(10));
            self
        }

        fn act(&mut self, who: &str, action: TaskAction) -> Result<TaskOutcome> {
            let actor = match who {
                "mentor" => self.mentor.clone(),
                "admin" => self.admin.clone(),
                _ => self.student.clone(),
            };
            let env = TaskEnv {
                timeline: &self.timeline,
                config: &self.config,
                now: self.now,
            };
            apply(&mut self.task, &actor, &action, &env)
        }
    }

    #[test]
    fn assign_sets_deadline_and_queues_update() {
        let mut f = Fixture::new(TaskStatus::ClaimRequested);
        f.task.student = Some("student".into());
        let out = f.act("mentor", TaskAction::Assign).unwrap();
        assert_eq!(f.task.status, TaskStatus::Claimed);
        assert_eq!(f.task.student.as_deref(), Some("student"));
        assert_eq!(f.task.deadline, Some(f.now + Duration::hours(72)));
        assert!(out.comment.is_some());
        assert_eq!(out.jobs.len(), 1);
        assert!(matches!(out.jobs[0], TaskJob::UpdateTaskStatus { .. }));
    }

    #[test]
    fn unassign_clears_student_and_deadline() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        f.act("mentor", TaskAction::Unassign).unwrap();
        assert_eq!(f.task.status, TaskStatus::Reopened);
        assert_eq!(f.task.student, None);
        assert_eq!(f.task.deadline, None);
    }

    #[test]
    fn close_keeps_student_and_queues_ranking() {
        let mut f = Fixture::new(TaskStatus::NeedsReview).with_student();
        let out = f.act("mentor", TaskAction::Close).unwrap();
        assert_eq!(f.task.status, TaskStatus::Closed);
        assert_eq!(f.task.student.as_deref(), Some("student"));
        assert_eq!(f.task.deadline, None);
        assert_eq!(out.jobs, vec![TaskJob::UpdateRanking { task: "T1".into() }]);
    }

    #[test]
    fn needs_work_clears_deadline() {
        let mut f = Fixture::new(TaskStatus::NeedsReview).with_student();
        f.act("mentor", TaskAction::NeedsWork).unwrap();
        assert_eq!(f.task.status, TaskStatus::NeedsWork);
        assert_eq!(f.task.student.as_deref(), Some("student"));
        assert_eq!(f.task.deadline, None);
    }

    #[test]
    fn extend_deadline_by_one_hour() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        let before = f.task.deadline.unwrap();
        let out = f.act("mentor", TaskAction::ExtendDeadline { hours: 1 }).unwrap();
        let after = f.task.deadline.unwrap();
        assert_eq!((after - before).num_seconds(), 3600);
        assert!(out.comment.is_some());
    }

    #[test]
    fn extend_deadline_by_zero_hours_is_refused() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        let before = f.task.clone();
        assert!(f.act("mentor", TaskAction::ExtendDeadline { hours: 0 }).is_err());
        assert_eq!(f.task, before);
    }

    #[test]
    fn claim_and_unclaim() {
        let mut f = Fixture::new(TaskStatus::Open);
        let out = f.act("student", TaskAction::Claim).unwrap();
        assert_eq!(f.task.status, TaskStatus::ClaimRequested);
        assert_eq!(f.task.student.as_deref(), Some("student"));
        assert!(f.task.subscribers.contains(&"student".to_string()));
        assert!(out.comment.is_some());

        f.act("student", TaskAction::Unclaim).unwrap();
        assert_eq!(f.task.status, TaskStatus::Reopened);
        assert_eq!(f.task.student, None);
        assert_eq!(f.task.deadline, None);
    }

    #[test]
    fn claim_is_gated_by_timeline() {
        let mut f = Fixture::new(TaskStatus::Open);
        ProgramPhase::OrgsAnnounced
            .apply(&mut f.timeline, ProgramKind::Gci, f.now)
            .unwrap();
        assert!(f.act("student", TaskAction::Claim).is_err());

        ProgramPhase::TaskClaimEnded
            .apply(&mut f.timeline, ProgramKind::Gci, f.now)
            .unwrap();
        assert!(f.act("student", TaskAction::Claim).is_err());
        assert_eq!(f.task.status, TaskStatus::Open);
    }

    #[test]
    fn hidden_tasks_must_be_published_before_claiming() {
        for hidden in [TaskStatus::Unpublished, TaskStatus::Unapproved] {
            let mut f = Fixture::new(hidden);
            assert!(matches!(
                f.act("student", TaskAction::Claim),
                Err(MelangeError::InvalidTransition { .. })
            ));
            assert_eq!(f.task.status, hidden);
            assert_eq!(f.task.student, None);

            f.act("admin", TaskAction::Publish).unwrap();
            f.act("student", TaskAction::Claim).unwrap();
            assert_eq!(f.task.status, TaskStatus::ClaimRequested);
        }
    }

    #[test]
    fn mentors_cannot_claim_and_students_cannot_assign() {
        let mut f = Fixture::new(TaskStatus::Open);
        assert!(matches!(
            f.act("mentor", TaskAction::Claim),
            Err(MelangeError::PermissionDenied(_))
        ));
        f.task.status = TaskStatus::ClaimRequested;
        f.task.student = Some("student".into());
        assert!(matches!(
            f.act("student", TaskAction::Assign),
            Err(MelangeError::PermissionDenied(_))
        ));
        assert_eq!(f.task.status, TaskStatus::ClaimRequested);
    }

    #[test]
    fn subscribe_toggles() {
        let mut f = Fixture::new(TaskStatus::Open);
        let out = f.act("mentor", TaskAction::Subscribe).unwrap();
        assert!(out.comment.is_none());
        assert!(f.task.subscribers.contains(&"mentor".to_string()));
        f.act("mentor", TaskAction::Subscribe).unwrap();
        assert_eq!(f.task.subscribers.len(), 1);
        f.act("mentor", TaskAction::Unsubscribe).unwrap();
        assert!(f.task.subscribers.is_empty());
    }

    #[test]
    fn submit_review_and_delete_work() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        assert!(f.act("student", TaskAction::SendForReview).is_err());

        f.act(
            "student",
            TaskAction::SubmitWork {
                url: "http://example.com/work".into(),
            },
        )
        .unwrap();
        assert_eq!(f.task.submissions.len(), 1);
        assert_eq!(f.task.submissions[0].url, "http://example.com/work");

        let id = f.task.submissions[0].id.clone();
        f.act("student", TaskAction::DeleteSubmission { id }).unwrap();
        assert!(f.task.submissions.is_empty());

        f.act(
            "student",
            TaskAction::SubmitWork {
                url: "https://example.com/pr/1".into(),
            },
        )
        .unwrap();
        f.act("student", TaskAction::SendForReview).unwrap();
        assert_eq!(f.task.status, TaskStatus::NeedsReview);
    }

    #[test]
    fn invalid_work_url_is_refused() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        let err = f.act("student", TaskAction::SubmitWork { url: "not a url".into() });
        assert!(err.is_err());
        assert!(f.task.submissions.is_empty());
    }

    #[test]
    fn work_stops_after_deadline() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        ProgramPhase::PencilDown
            .apply(&mut f.timeline, ProgramKind::Gci, f.now)
            .unwrap();
        assert!(f
            .act("student", TaskAction::SubmitWork { url: "http://example.com".into() })
            .is_err());
    }

    #[test]
    fn admin_unpublishes_and_deletes() {
        let mut f = Fixture::new(TaskStatus::Open);
        assert!(f.act("mentor", TaskAction::Unpublish).is_err());
        f.act("admin", TaskAction::Unpublish).unwrap();
        assert_eq!(f.task.status, TaskStatus::Unpublished);
        f.act("admin", TaskAction::Publish).unwrap();
        assert_eq!(f.task.status, TaskStatus::Open);
        let out = f.act("admin", TaskAction::Delete).unwrap();
        assert!(out.deleted);
    }

    #[test]
    fn sweep_moves_overdue_tasks() {
        let mut f = Fixture::new(TaskStatus::Claimed).with_student();
        let config = TaskConfig::default();

        assert_eq!(update_task_status(&mut f.task, &config, f.now), TaskOutcome::default());

        let later = f.now + Duration::hours(11);
        let out = update_task_status(&mut f.task, &config, later);
        assert_eq!(f.task.status, TaskStatus::ActionNeeded);
        assert_eq!(f.task.deadline, Some(later + Duration::hours(24)));
        assert_eq!(out.jobs.len(), 1);

        let much_later = later + Duration::hours(25);
        update_task_status(&mut f.task, &config, much_later);
        assert_eq!(f.task.status, TaskStatus::Reopened);
        assert_eq!(f.task.student, None);
        assert_eq!(f.task.deadline, None);
    }

    #[test]
    fn parse_simple_actions() {
        assert_eq!(TaskAction::parse_simple("button_close").unwrap(), TaskAction::Close);
        assert_eq!(TaskAction::parse_simple("needs-work").unwrap(), TaskAction::NeedsWork);
        assert!(TaskAction::parse_simple("extend_deadline").is_err());
    }

    #[test]
    fn summary_counts() {
        let mut f = Fixture::new(TaskStatus::Open);
        let mut closed = f.task.clone();
        closed.status = TaskStatus::Closed;
        f.task.id = "T2".into();
        assert_eq!(
            summarize(&[f.task.clone(), closed]),
            "1/2 tasks closed, 0 in progress, 1 open"
        );
    }
}
