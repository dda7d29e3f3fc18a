//! Seams between the engine and its collaborators.
//!
//! The engine never performs I/O or touches a drawing widget directly. A
//! configuration source, a persistence sink and a drawing backend are handed
//! in at construction; the HTTP client crate and the in-memory sketchpad are
//! the implementations shipped in this workspace.

use async_trait::async_trait;
use drawlang_core::{ExperimentConfig, StrokeSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PortError {
    pub message: String,
}

impl PortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where experiment documents come from.
#[async_trait]
pub trait ExperimentSource: Send + Sync {
    /// Configuration for a new participant session.
    async fn experiment_config(&self) -> Result<ExperimentConfig, PortError>;

    /// A finished session with its recorded responses embedded.
    async fn user_results(&self) -> Result<ExperimentConfig, PortError>;
}

/// Reply from storage after a session snapshot was sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
}

impl RecordAck {
    /// Storage explicitly refused the snapshot.
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }
}

/// Where session snapshots go after every trial.
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn record(&self, session: &ExperimentConfig) -> Result<RecordAck, PortError>;
}

/// Placement and mode of a sketchpad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSpec {
    pub container_id: String,
    pub width: u32,
    pub height: u32,
    pub editable: bool,
}

/// A live drawing widget.
///
/// Stroke data is opaque to the engine; it only asks how many strokes exist.
pub trait DrawingSurface: Send {
    fn strokes(&self) -> StrokeSet;

    fn stroke_count(&self) -> usize;

    fn clear(&mut self);

    fn load_strokes(&mut self, strokes: &StrokeSet);

    /// Animate the loaded strokes in drawing order.
    fn replay(&mut self);
}

/// Factory for drawing widgets.
pub trait DrawingBackend: Send + Sync {
    fn create(&self, canvas: &CanvasSpec) -> Box<dyn DrawingSurface>;
}
