use std::sync::Arc;

use drawlang_core::{Capability, PhaseConfig, StrokeSet};
use tracing::debug;

use crate::ports::{CanvasSpec, DrawingBackend, DrawingSurface};

/// One trial's response, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialInput {
    pub strokes: StrokeSet,
    pub description: String,
}

/// Holds the participant's in-progress input for the current trial.
///
/// The sketchpad is created the first time a phase asks for drawing and is
/// reused for every later phase.
pub struct ResponseCollector {
    backend: Arc<dyn DrawingBackend>,
    canvas: CanvasSpec,
    sketchpad: Option<Box<dyn DrawingSurface>>,
    description: String,
}

impl ResponseCollector {
    pub fn new(backend: Arc<dyn DrawingBackend>, canvas: CanvasSpec) -> Self {
        Self {
            backend,
            canvas,
            sketchpad: None,
            description: String::new(),
        }
    }

    pub fn ensure_sketchpad(&mut self) {
        if self.sketchpad.is_none() {
            debug!(container = %self.canvas.container_id, editable = self.canvas.editable, "Creating sketchpad");
            self.sketchpad = Some(self.backend.create(&self.canvas));
        }
    }

    pub fn has_sketchpad(&self) -> bool {
        self.sketchpad.is_some()
    }

    pub fn stroke_count(&self) -> usize {
        self.sketchpad
            .as_ref()
            .map(|pad| pad.stroke_count())
            .unwrap_or(0)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    /// Gather the response for `phase`. Inactive inputs record as empty.
    pub fn collect(&self, phase: &PhaseConfig) -> TrialInput {
        let strokes = match (&self.sketchpad, phase.has(Capability::Draw)) {
            (Some(pad), true) => pad.strokes(),
            _ => StrokeSet::empty(),
        };
        let description = if phase.has(Capability::Describe) {
            self.description.clone()
        } else {
            String::new()
        };
        TrialInput {
            strokes,
            description,
        }
    }

    /// Clear the canvas and description between trials.
    pub fn reset(&mut self) {
        self.description.clear();
        if let Some(pad) = self.sketchpad.as_mut() {
            pad.clear();
        }
    }

    /// Show previously recorded strokes and animate them.
    pub fn play_back(&mut self, strokes: Option<&StrokeSet>) {
        if let Some(pad) = self.sketchpad.as_mut() {
            pad.clear();
            if let Some(strokes) = strokes {
                pad.load_strokes(strokes);
                pad.replay();
            }
        }
    }
}

impl std::fmt::Debug for ResponseCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCollector")
            .field("canvas", &self.canvas)
            .field("has_sketchpad", &self.has_sketchpad())
            .field("description", &self.description)
            .finish()
    }
}
