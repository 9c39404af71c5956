use crate::error::{MelangeError, Result};
use crate::timeline::Timeline;
use crate::types::ProgramKind;
use crate::validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Link id style key, e.g. `gsoc2013`.
    pub key: String,
    pub name: String,
    pub kind: ProgramKind,
    #[serde(default)]
    pub timeline: Timeline,
}

impl Program {
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: ProgramKind) -> Result<Self> {
        let key = key.into();
        if !validate::is_link_id_format_valid(&key) {
            return Err(MelangeError::invalid_name("program key", key));
        }
        Ok(Self {
            key,
            name: name.into(),
            kind,
            timeline: Timeline::default(),
        })
    }
}
