use crate::error::Result;
use crate::paths;
use crate::system::RequestContext;
use crate::types::TaskDifficulty;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TaskConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Hours a student gets when a task has no explicit time to complete.
    #[serde(default = "default_hours_to_complete")]
    pub default_hours_to_complete: u32,
    /// Grace period granted when a claimed task overruns its deadline.
    #[serde(default = "default_action_needed_hours")]
    pub action_needed_hours: u32,
}

fn default_hours_to_complete() -> u32 {
    72
}

fn default_action_needed_hours() -> u32 {
    24
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_hours_to_complete: default_hours_to_complete(),
            action_needed_hours: default_action_needed_hours(),
        }
    }
}

// ---------------------------------------------------------------------------
// RankingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_easy_points")]
    pub easy: u32,
    #[serde(default = "default_medium_points")]
    pub medium: u32,
    #[serde(default = "default_hard_points")]
    pub hard: u32,
}

fn default_easy_points() -> u32 {
    1
}

fn default_medium_points() -> u32 {
    2
}

fn default_hard_points() -> u32 {
    4
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            easy: default_easy_points(),
            medium: default_medium_points(),
            hard: default_hard_points(),
        }
    }
}

impl RankingConfig {
    pub fn points_for(&self, difficulty: TaskDifficulty) -> u32 {
        match difficulty {
            TaskDifficulty::Easy => self.easy,
            TaskDifficulty::Medium => self.medium,
            TaskDifficulty::Hard => self.hard,
        }
    }
}

// ---------------------------------------------------------------------------
// MailConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_accepted_subject")]
    pub accepted_subject: String,
    /// `{program}` is replaced with the program name.
    #[serde(default = "default_rejected_subject")]
    pub rejected_subject: String,
}

fn default_accepted_subject() -> String {
    "Congratulations!".to_string()
}

fn default_rejected_subject() -> String {
    "Thank you for applying to {program}".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            accepted_subject: default_accepted_subject(),
            rejected_subject: default_rejected_subject(),
        }
    }
}

impl MailConfig {
    pub fn rejected_subject_for(&self, program_name: &str) -> String {
        self.rejected_subject.replace("{program}", program_name)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub mail: MailConfig,
    /// Defaults for the request context; the CLI overlays env and flags.
    #[serde(default)]
    pub context: RequestContext,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            tasks: TaskConfig::default(),
            ranking: RankingConfig::default(),
            mail: MailConfig::default(),
            context: RequestContext::default(),
        }
    }
}

impl Config {
    /// Load `.melange/config.yaml`; a missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Write the default config unless one exists. Returns true if written.
    pub fn create_default(root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(&Config::default())?;
        crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.tasks.default_hours_to_complete == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tasks.default_hours_to_complete must be at least 1".to_string(),
            });
        }
        if self.tasks.action_needed_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tasks.action_needed_hours must be at least 1".to_string(),
            });
        }

        let r = &self.ranking;
        if r.easy > r.medium || r.medium > r.hard {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "ranking points are not ordered by difficulty (easy={}, medium={}, hard={})",
                    r.easy, r.medium, r.hard
                ),
            });
        }

        if !self.mail.rejected_subject.contains("{program}") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "mail.rejected_subject does not mention {program}".to_string(),
            });
        }

        if self.context.application_id.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "context.application_id is empty; application emails cannot be built"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.tasks.default_hours_to_complete, 72);
        assert_eq!(cfg.ranking.points_for(TaskDifficulty::Hard), 4);
        assert_eq!(cfg.mail.accepted_subject, "Congratulations!");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "version: 1\nranking:\n  hard: 8\ncontext:\n  application_id: gsoc-app\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.ranking.easy, 1);
        assert_eq!(cfg.ranking.hard, 8);
        assert_eq!(cfg.tasks.action_needed_hours, 24);
        assert_eq!(cfg.context.application_id, "gsoc-app");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::load(dir.path()).unwrap();
        cfg.tasks.default_hours_to_complete = 48;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.tasks.default_hours_to_complete, 48);
    }

    #[test]
    fn create_default_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create_default(dir.path()).unwrap());

        let mut cfg = Config::load(dir.path()).unwrap();
        cfg.tasks.action_needed_hours = 12;
        cfg.save(dir.path()).unwrap();

        assert!(!Config::create_default(dir.path()).unwrap());
        assert_eq!(Config::load(dir.path()).unwrap().tasks.action_needed_hours, 12);
    }

    #[test]
    fn rejected_subject_names_program() {
        let mail = MailConfig::default();
        assert_eq!(
            mail.rejected_subject_for("Google Summer of Code 2013"),
            "Thank you for applying to Google Summer of Code 2013"
        );
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.context.application_id = "app".into();
        assert!(cfg.validate().is_empty());

        cfg.tasks.default_hours_to_complete = 0;
        cfg.ranking.easy = 9;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("not ordered by difficulty")));
    }
}
