use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a GCI task. State changes post one automatically, with no
/// author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub task: String,
    /// Profile key of the commenter; `None` for automatic comments.
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append a comment and return its id.
///
/// `seq` is a counter owned by the registry so ids stay unique after tasks
/// and their comments are deleted.
pub fn add_comment(
    comments: &mut Vec<Comment>,
    seq: &mut u32,
    task: &str,
    author: Option<String>,
    title: impl Into<String>,
    content: impl Into<String>,
    now: DateTime<Utc>,
) -> String {
    *seq += 1;
    let id = format!("C{}", *seq);
    comments.push(Comment {
        id: id.clone(),
        task: task.to_string(),
        author,
        title: title.into(),
        content: content.into(),
        created_at: now,
    });
    id
}

/// Comments on `task` in posting order.
pub fn comments_for<'a>(comments: &'a [Comment], task: &str) -> Vec<&'a Comment> {
    comments.iter().filter(|c| c.task == task).collect()
}

/// Drop every comment on `task`; returns how many were removed.
pub fn remove_comments_for(comments: &mut Vec<Comment>, task: &str) -> usize {
    let before = comments.len();
    comments.retain(|c| c.task != task);
    before - comments.len()
}

pub fn new_comment_subject(program_name: &str, task_title: &str, commenter: &str) -> String {
    format!("[{program_name}] New comment on {task_title} by {commenter}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
