use crate::config::RankingConfig;
use crate::error::{MelangeError, Result};
use crate::task::Task;
use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};

/// Points a GCI student earned from closed tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRanking {
    pub program: String,
    pub student: String,
    pub points: u32,
    #[serde(default)]
    pub tasks: u32,
}

pub fn get_or_create_for_student<'a>(
    rankings: &'a mut Vec<StudentRanking>,
    program: &str,
    student: &str,
) -> &'a mut StudentRanking {
    let pos = match rankings
        .iter()
        .position(|r| r.program == program && r.student == student)
    {
        Some(pos) => pos,
        None => {
            rankings.push(StudentRanking {
                program: program.to_string(),
                student: student.to_string(),
                points: 0,
                tasks: 0,
            });
            rankings.len() - 1
        }
    };
    &mut rankings[pos]
}

fn closed_student(task: &Task) -> Result<&str> {
    if task.status != TaskStatus::Closed {
        return Err(MelangeError::InvalidTransition {
            from: task.status.to_string(),
            action: "rank".to_string(),
            reason: format!("task {} is not closed", task.id),
        });
    }
    task.student
        .as_deref()
        .ok_or_else(|| MelangeError::MissingKey(format!("student of task {}", task.id)))
}

/// Add the points of one newly closed task to its student's ranking.
pub fn update_ranking_with_task<'a>(
    rankings: &'a mut Vec<StudentRanking>,
    task: &Task,
    points: &RankingConfig,
) -> Result<&'a StudentRanking> {
    let student = closed_student(task)?;
    let ranking = get_or_create_for_student(rankings, &task.program, student);
    ranking.points += points.points_for(task.difficulty);
    ranking.tasks += 1;
    tracing::info!(student = %ranking.student, points = ranking.points, task = %task.id, "ranking updated");
    Ok(ranking)
}

/// Recompute a student's ranking from scratch over `tasks`. Tasks that are
/// not closed or belong to someone else are ignored.
pub fn calculate_ranking_for_student<'a>(
    rankings: &'a mut Vec<StudentRanking>,
    program: &str,
    student: &str,
    tasks: &[Task],
    points: &RankingConfig,
) -> &'a StudentRanking {
    let credited: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Closed && t.student.as_deref() == Some(student))
        .collect();
    let ranking = get_or_create_for_student(rankings, program, student);
    ranking.points = credited.iter().map(|t| points.points_for(t.difficulty)).sum();
    ranking.tasks = credited.len() as u32;
    ranking
}

/// Rankings of `program`, best first; ties by student key.
pub fn leaderboard<'a>(rankings: &'a [StudentRanking], program: &str) -> Vec<&'a StudentRanking> {
    let mut board: Vec<&StudentRanking> = rankings.iter().filter(|r| r.program == program).collect();
    board.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.student.cmp(&b.student)));
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskDifficulty;

    fn closed(id: &str, student: &str, difficulty: TaskDifficulty) -> Task {
        let mut t = Task::new(id, "gci2013", "melange", id);
        t.status = TaskStatus::Closed;
        t.student = Some(student.into());
        t.difficulty = difficulty;
        t
    }

    #[test]
    fn get_or_create_returns_existing() {
        let mut rankings = Vec::new();
        get_or_create_for_student(&mut rankings, "gci2013", "alice").points = 5;
        let again = get_or_create_for_student(&mut rankings, "gci2013", "alice");
        assert_eq!(again.points, 5);
        assert_eq!(rankings.len(), 1);
    }

    #[test]
    fn update_adds_task_points() {
        let cfg = RankingConfig::default();
        let mut rankings = Vec::new();
        let r = update_ranking_with_task(&mut rankings, &closed("T1", "alice", TaskDifficulty::Medium), &cfg)
            .unwrap();
        assert_eq!(r.points, 2);
        let r = update_ranking_with_task(&mut rankings, &closed("T2", "alice", TaskDifficulty::Hard), &cfg)
            .unwrap();
        assert_eq!(r.points, 6);

        get_or_create_for_student(&mut rankings, "gci2013", "bob").points = 5;
        let r = update_ranking_with_task(&mut rankings, &closed("T3", "bob", TaskDifficulty::Easy), &cfg)
            .unwrap();
        assert_eq!(r.points, 6);
    }

    #[test]
    fn open_tasks_are_not_ranked() {
        let mut t = closed("T1", "alice", TaskDifficulty::Easy);
        t.status = TaskStatus::NeedsReview;
        assert!(update_ranking_with_task(&mut Vec::new(), &t, &RankingConfig::default()).is_err());
    }

    #[test]
    fn calculate_overwrites_points() {
        let cfg = RankingConfig::default();
        let mut rankings = Vec::new();
        get_or_create_for_student(&mut rankings, "gci2013", "alice").points = 5;
        let tasks: Vec<Task> = (0..5)
            .map(|i| closed(&format!("T{i}"), "alice", TaskDifficulty::Medium))
            .chain(std::iter::once(closed("T9", "bob", TaskDifficulty::Hard)))
            .collect();
        let r = calculate_ranking_for_student(&mut rankings, "gci2013", "alice", &tasks, &cfg);
        assert_eq!(r.points, 10);
        assert_eq!(r.tasks, 5);
    }

    #[test]
    fn leaderboard_orders_by_points() {
        let mut rankings = Vec::new();
        get_or_create_for_student(&mut rankings, "gci2013", "bob").points = 3;
        get_or_create_for_student(&mut rankings, "gci2013", "alice").points = 3;
        get_or_create_for_student(&mut rankings, "gci2013", "carol").points = 7;
        let board: Vec<&str> = leaderboard(&rankings, "gci2013")
            .iter()
            .map(|r| r.student.as_str())
            .collect();
        assert_eq!(board, vec!["carol", "alice", "bob"]);
    }
}
