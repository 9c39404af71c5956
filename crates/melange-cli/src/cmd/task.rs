use super::Invocation;
use crate::output::{fmt_opt, fmt_time, print_json, print_table};
use anyhow::Context;
use clap::{Args, Subcommand};
use melange_core::comment::comments_for;
use melange_core::ranking::leaderboard;
use melange_core::task::{summarize, TaskAction};
use melange_core::types::{TaskDifficulty, TaskStatus};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Create a task for an organization
    Create {
        #[arg(long)]
        org: String,
        #[arg(long)]
        title: String,
        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: String,
        /// Hours the student gets once assigned (default: from config)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Perform an action on a task as the acting profile
    Act {
        id: String,
        /// publish, claim, assign, close, needs_work, comment, submit_work, ...
        action: String,
        #[command(flatten)]
        args: ActionArgs,
    },

    /// Run due jobs and apply deadline transitions to every task
    Sweep,

    /// List tasks
    List {
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Only tasks of this student
        #[arg(long)]
        student: Option<String>,
    },

    /// Show a task with its comments and submissions
    Show { id: String },

    /// Show the student leaderboard
    Ranking {
        /// Recompute this student's points from their closed tasks first
        #[arg(long)]
        recalculate: Option<String>,
    },
}

#[derive(Args)]
pub struct ActionArgs {
    /// Hours to add for extend_deadline (at least 1)
    #[arg(long)]
    hours: Option<u32>,
    /// Work URL for submit_work
    #[arg(long)]
    url: Option<String>,
    /// Comment title
    #[arg(long)]
    title: Option<String>,
    /// Comment content
    #[arg(long)]
    content: Option<String>,
    /// Submission id for delete_submission
    #[arg(long)]
    submission: Option<String>,
}

impl ActionArgs {
    fn into_action(self, name: &str) -> anyhow::Result<TaskAction> {
        let action = match name.replace('-', "_").as_str() {
            "comment" => TaskAction::Comment {
                title: self.title.unwrap_or_default(),
                content: self.content.context("comment requires --content")?,
            },
            "extend_deadline" => TaskAction::ExtendDeadline {
                hours: self.hours.context("extend_deadline requires --hours")?,
            },
            "submit_work" => TaskAction::SubmitWork {
                url: self.url.context("submit_work requires --url")?,
            },
            "delete_submission" => TaskAction::DeleteSubmission {
                id: self
                    .submission
                    .context("delete_submission requires --submission")?,
            },
            other => TaskAction::parse_simple(other)?,
        };
        Ok(action)
    }
}

pub fn run(root: &Path, subcmd: TaskSubcommand, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::Create {
            org,
            title,
            difficulty,
            hours,
        } => create(root, &org, &title, &difficulty, hours, inv, json),
        TaskSubcommand::Act { id, action, args } => act(root, &id, &action, args, inv, json),
        TaskSubcommand::Sweep => sweep(root, inv, json),
        TaskSubcommand::List {
            org,
            status,
            student,
        } => list(root, org.as_deref(), status.as_deref(), student.as_deref(), json),
        TaskSubcommand::Show { id } => show(root, &id, json),
        TaskSubcommand::Ranking { recalculate } => ranking(root, recalculate.as_deref(), json),
    }
}

// ---------------------------------------------------------------------------
// create / act
// ---------------------------------------------------------------------------

fn create(
    root: &Path,
    org: &str,
    title: &str,
    difficulty: &str,
    hours: Option<u32>,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let difficulty: TaskDifficulty = difficulty.parse()?;
    let creator = super::actor(&reg, &config, inv)?;

    let id = reg.create_task(org, &creator, title, difficulty, hours)?;
    super::save(root, &mut reg)?;

    let task = reg.task(&id)?;
    if json {
        return print_json(task);
    }
    println!("Created task {id} [{}]: {title}", task.status);
    Ok(())
}

fn act(
    root: &Path,
    id: &str,
    action: &str,
    args: ActionArgs,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let action = args.into_action(action)?;
    let actor = super::actor(&reg, &config, inv)?;

    let outcome = reg
        .act_on_task(id, &actor, &action, &config, inv.now)
        .with_context(|| format!("{actor} cannot {action} task {id}"))?;
    super::save(root, &mut reg)?;

    if outcome.deleted {
        if json {
            return print_json(&serde_json::json!({ "id": id, "deleted": true }));
        }
        println!("Deleted task {id}");
        return Ok(());
    }

    let task = reg.task(id)?;
    if json {
        return print_json(task);
    }
    println!("{id}: {action} -> {}", task.status);
    if let Some(deadline) = task.deadline {
        println!("  deadline: {}", fmt_time(Some(deadline)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// sweep
// ---------------------------------------------------------------------------

fn sweep(root: &Path, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let jobs = reg.run_jobs(&config, inv.now)?;
    let changed = reg.sweep(&config, inv.now)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(&serde_json::json!({
            "jobs_run": jobs,
            "tasks_changed": changed,
            "jobs_pending": reg.jobs.len(),
        }));
    }
    println!("Ran {jobs} job(s); {changed} task(s) changed; {} job(s) pending", reg.jobs.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(
    root: &Path,
    org: Option<&str>,
    status: Option<&str>,
    student: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let status: Option<TaskStatus> = status.map(str::parse::<TaskStatus>).transpose()?;
    let tasks: Vec<_> = reg
        .tasks
        .iter()
        .filter(|t| org.map_or(true, |o| t.org == o))
        .filter(|t| status.map_or(true, |s| t.status == s))
        .filter(|t| student.map_or(true, |s| t.student.as_deref() == Some(s)))
        .cloned()
        .collect();

    if json {
        return print_json(&tasks);
    }

    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.org.clone(),
                t.status.to_string(),
                t.difficulty.to_string(),
                fmt_opt(t.student.as_deref()),
                fmt_time(t.deadline),
                t.title.clone(),
            ]
        })
        .collect();
    print_table(
        &["ID", "ORG", "STATUS", "DIFFICULTY", "STUDENT", "DEADLINE", "TITLE"],
        &rows,
        "No tasks.",
    );
    if !tasks.is_empty() {
        println!();
        println!("{}", summarize(&tasks));
    }
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let task = reg.task(id)?;
    let comments = comments_for(&reg.comments, id);

    if json {
        return print_json(&serde_json::json!({ "task": task, "comments": comments }));
    }

    println!("{} [{}] {}", task.id, task.status, task.title);
    println!("  org:        {}", task.org);
    println!("  difficulty: {}", task.difficulty);
    println!("  student:    {}", fmt_opt(task.student.as_deref()));
    println!("  deadline:   {}", fmt_time(task.deadline));
    println!("  mentors:    {}", task.mentors.join(", "));
    if !task.submissions.is_empty() {
        println!("\nSubmissions:");
        for s in &task.submissions {
            println!("  {} {} by {} at {}", s.id, s.url, s.student, fmt_time(Some(s.submitted_at)));
        }
    }
    if !comments.is_empty() {
        println!("\nComments:");
        for c in comments {
            let author = c.author.as_deref().unwrap_or(melange_core::store::SYSTEM_COMMENTER);
            println!("  [{}] {author}: {}", c.id, c.title);
            if !c.content.is_empty() {
                println!("      {}", c.content);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ranking
// ---------------------------------------------------------------------------

fn ranking(root: &Path, recalculate: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    if let Some(student) = recalculate {
        let points = reg.recalculate_ranking(student, &config)?;
        super::save(root, &mut reg)?;
        if !json {
            println!("Recalculated {student}: {points} point(s)");
        }
    }

    let board = leaderboard(&reg.rankings, &reg.program.key);
    if json {
        return print_json(&board);
    }
    let rows: Vec<Vec<String>> = board
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.student.clone(),
                r.points.to_string(),
                r.tasks.to_string(),
            ]
        })
        .collect();
    print_table(&["#", "STUDENT", "POINTS", "TASKS"], &rows, "No rankings yet.");
    Ok(())
}
