use thiserror::Error;

use crate::domain::PhaseId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Experiment declares no phases")]
    NoPhases,

    #[error("Phase listed but not configured: {0}")]
    MissingPhaseConfig(PhaseId),

    #[error("Invalid experiment document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
