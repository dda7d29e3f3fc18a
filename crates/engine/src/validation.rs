use drawlang_core::{Capability, PhaseConfig};
use thiserror::Error;

use crate::options::EngineOptions;

/// A missing input. Display is the text shown to the participant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please make sure you have accurately placed all your strokes on the sketchpad.")]
    IncompleteDrawing { strokes: usize, required: usize },

    #[error("Please make sure you have entered an accurate description before moving on.")]
    IncompleteDescription,
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IncompleteDrawing { .. } => "incomplete_drawing",
            Self::IncompleteDescription => "incomplete_description",
        }
    }
}

/// Every reason the current trial cannot advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub fn contains(&self, kind: &str) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// Participant-facing text for every error, in order.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks the current trial's input against the phase's input capabilities.
#[derive(Debug, Clone, Copy)]
pub struct ValidationGate {
    min_strokes: usize,
    bypass: bool,
}

impl ValidationGate {
    pub fn new(min_strokes: usize) -> Self {
        Self {
            min_strokes,
            bypass: false,
        }
    }

    pub fn from_options(options: &EngineOptions) -> Self {
        Self {
            min_strokes: options.min_strokes,
            bypass: options.debug_bypass,
        }
    }

    /// Disable all checks.
    pub fn bypassed(mut self) -> Self {
        self.bypass = true;
        self
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn check(
        &self,
        phase: &PhaseConfig,
        stroke_count: usize,
        description: &str,
    ) -> Result<(), ValidationFailure> {
        if self.bypass {
            return Ok(());
        }

        let mut errors = Vec::new();
        if phase.has(Capability::Draw) && stroke_count < self.min_strokes {
            errors.push(ValidationError::IncompleteDrawing {
                strokes: stroke_count,
                required: self.min_strokes,
            });
        }
        if phase.has(Capability::Describe) && description.is_empty() {
            errors.push(ValidationError::IncompleteDescription);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure { errors })
        }
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::from_options(&EngineOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_and_describe() -> PhaseConfig {
        PhaseConfig::new([Capability::Draw, Capability::Describe])
    }

    #[test]
    fn test_blocks_with_both_errors() {
        let gate = ValidationGate::default();
        let failure = gate.check(&draw_and_describe(), 1, "").unwrap_err();

        assert_eq!(failure.errors.len(), 2);
        assert!(failure.contains("incomplete_drawing"));
        assert!(failure.contains("incomplete_description"));
        assert_eq!(
            failure.errors[0],
            ValidationError::IncompleteDrawing {
                strokes: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_failure_is_an_error() {
        let failure = ValidationGate::default()
            .check(&draw_and_describe(), 0, "")
            .unwrap_err();
        let err: &dyn std::error::Error = &failure;
        assert_eq!(
            err.to_string(),
            "Please make sure you have accurately placed all your strokes on the sketchpad. \
             Please make sure you have entered an accurate description before moving on."
        );
        assert_eq!(failure.message(), err.to_string());
    }

    #[test]
    fn test_allows_complete_input() {
        let gate = ValidationGate::default();
        assert!(gate.check(&draw_and_describe(), 2, "a square").is_ok());
    }

    #[test]
    fn test_only_declared_inputs_are_required() {
        let gate = ValidationGate::default();
        let look = PhaseConfig::new([Capability::Images]);
        assert!(gate.check(&look, 0, "").is_ok());

        let describe = PhaseConfig::new([Capability::Images, Capability::Describe]);
        let failure = gate.check(&describe, 0, "").unwrap_err();
        assert_eq!(failure.errors, vec![ValidationError::IncompleteDescription]);
    }

    #[test]
    fn test_whitespace_description_passes() {
        let gate = ValidationGate::default();
        let describe = PhaseConfig::new([Capability::Describe]);
        assert!(gate.check(&describe, 0, " ").is_ok());
    }

    #[test]
    fn test_configurable_threshold() {
        let gate = ValidationGate::new(5);
        let draw = PhaseConfig::new([Capability::Draw]);
        assert!(gate.check(&draw, 4, "").is_err());
        assert!(gate.check(&draw, 5, "").is_ok());
    }

    #[test]
    fn test_bypass() {
        let gate = ValidationGate::from_options(&EngineOptions::default().with_debug_bypass(true));
        assert!(gate.is_bypassed());
        assert!(gate.check(&draw_and_describe(), 0, "").is_ok());
        assert!(ValidationGate::new(2).bypassed().check(&draw_and_describe(), 0, "").is_ok());
    }
}
