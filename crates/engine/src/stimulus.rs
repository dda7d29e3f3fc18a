use drawlang_core::{DisplayMode, PhaseConfig, StrokeSet};
use serde::Serialize;

use crate::error::{EngineError, Result};

/// What is presented for one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    Image { path: String },
    Description { text: String },
}

/// Response recorded for one trial of a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorResponse<'a> {
    pub strokes: Option<&'a StrokeSet>,
    pub description: Option<&'a str>,
}

/// Looks up stimuli and recorded responses for a phase.
#[derive(Debug, Clone, Copy)]
pub struct StimulusProvider<'a> {
    phase: &'a PhaseConfig,
    mode: DisplayMode,
    asset_base: &'a str,
}

impl<'a> StimulusProvider<'a> {
    pub fn new(phase: &'a PhaseConfig, asset_base: &'a str) -> Self {
        Self {
            phase,
            mode: phase.display_mode(),
            asset_base,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.phase.active_stimulus_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stimulus for trial `index`.
    ///
    /// Phases without stimuli (sampling phases, empty lists, `null` slots)
    /// yield `None`.
    pub fn stimulus(&self, index: usize) -> Result<Option<Stimulus>> {
        if self.is_empty() {
            return Ok(None);
        }
        match self.mode {
            DisplayMode::Images => {
                let slot = self
                    .phase
                    .images
                    .get(index)
                    .ok_or_else(|| EngineError::out_of_range("image", index, self.len()))?;
                Ok(slot.as_ref().map(|name| Stimulus::Image {
                    path: format!("{}{}", self.asset_base, name),
                }))
            }
            DisplayMode::Descriptions => {
                let text = self
                    .phase
                    .descriptions
                    .get(index)
                    .ok_or_else(|| EngineError::out_of_range("description", index, self.len()))?;
                Ok(Some(Stimulus::Description { text: text.clone() }))
            }
        }
    }

    pub fn prior_response(&self, index: usize) -> PriorResponse<'a> {
        PriorResponse {
            strokes: self.phase.responses.strokes_at(index),
            description: self.phase.responses.description_at(index),
        }
    }
}
