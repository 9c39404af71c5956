use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MelangeError {
    #[error("not initialized: run 'melange init'")]
    NotInitialized,

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("invalid transition from {from} via {action}: {reason}")]
    InvalidTransition {
        from: String,
        action: String,
        reason: String,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid {kind} '{value}'")]
    InvalidName { kind: &'static str, value: String },

    #[error("application id is not set")]
    MissingApplicationId,

    #[error("feed fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MelangeError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        MelangeError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid_name(kind: &'static str, value: impl Into<String>) -> Self {
        MelangeError::InvalidName {
            kind,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MelangeError>;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A user-facing form error attached to a single submitted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}
