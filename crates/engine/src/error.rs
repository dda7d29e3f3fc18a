use drawlang_core::CoreError;
use thiserror::Error;

use crate::screen::Screen;
use crate::validation::ValidationFailure;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load experiment configuration: {0}")]
    ConfigFetch(String),

    #[error("Invalid experiment configuration: {0}")]
    InvalidConfig(#[from] CoreError),

    #[error("{0}")]
    IncompleteInput(ValidationFailure),

    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Session already completed")]
    SessionFinished,

    #[error("Navigation is locked while the stimulus plays")]
    NavigationLocked,
}

impl EngineError {
    pub fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfRange { what, index, len }
    }

    /// Whether the participant can fix the cause and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::IncompleteInput(_) | Self::NavigationLocked)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// A session that could not start, with the screen to show in its place.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LoadFailure {
    #[source]
    pub error: EngineError,
    pub screen: Screen,
}

impl LoadFailure {
    pub fn new(error: EngineError) -> Self {
        let screen = Screen::failed(error.to_string());
        Self { error, screen }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = EngineError::out_of_range("phase", 3, 2);
        assert_eq!(err.to_string(), "phase index 3 out of range (len 2)");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable() {
        assert!(EngineError::NavigationLocked.is_recoverable());
        assert!(!EngineError::SessionFinished.is_recoverable());
        assert!(!EngineError::ConfigFetch("down".into()).is_recoverable());
    }

    #[test]
    fn test_load_failure_keeps_cause() {
        use std::error::Error as _;

        let failure = LoadFailure::new(EngineError::ConfigFetch("down".into()));
        assert_eq!(
            failure.to_string(),
            "Failed to load experiment configuration: down"
        );
        assert!(failure.source().is_some());
        assert_eq!(
            failure.screen.notice().unwrap().text,
            "Failed to load experiment configuration: down"
        );
    }
}
