//! In-memory drawing widget.
//!
//! Stands in for the browser sketchpad in headless runs and tests. Handles are
//! cheap clones over shared state, so whoever drives the participant side can
//! keep one while the engine owns another.

use std::sync::{Arc, Mutex, MutexGuard};

use drawlang_core::StrokeSet;
use serde_json::Value;

use crate::ports::{CanvasSpec, DrawingBackend, DrawingSurface};

#[derive(Debug, Default)]
struct PadState {
    strokes: Vec<Value>,
    replays: usize,
    clears: usize,
}

#[derive(Debug, Clone)]
pub struct MemorySketchpad {
    canvas: CanvasSpec,
    state: Arc<Mutex<PadState>>,
}

impl MemorySketchpad {
    pub fn new(canvas: CanvasSpec) -> Self {
        Self {
            canvas,
            state: Arc::new(Mutex::new(PadState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, PadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn canvas(&self) -> &CanvasSpec {
        &self.canvas
    }

    /// Add one pen stroke, as a participant would.
    pub fn draw(&self, stroke: Value) {
        self.state().strokes.push(stroke);
    }

    pub fn replay_count(&self) -> usize {
        self.state().replays
    }

    pub fn clear_count(&self) -> usize {
        self.state().clears
    }
}

impl DrawingSurface for MemorySketchpad {
    fn strokes(&self) -> StrokeSet {
        StrokeSet::from_value(Value::Array(self.state().strokes.clone()))
    }

    fn stroke_count(&self) -> usize {
        self.state().strokes.len()
    }

    fn clear(&mut self) {
        let mut state = self.state();
        state.strokes.clear();
        state.clears += 1;
    }

    fn load_strokes(&mut self, strokes: &StrokeSet) {
        let mut state = self.state();
        state.strokes = match strokes.as_value() {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        };
    }

    fn replay(&mut self) {
        self.state().replays += 1;
    }
}

/// Backend handing out [`MemorySketchpad`]s and remembering them.
#[derive(Debug, Clone, Default)]
pub struct MemoryDrawingBackend {
    created: Arc<Mutex<Vec<MemorySketchpad>>>,
}

impl MemoryDrawingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently created sketchpad.
    pub fn last(&self) -> Option<MemorySketchpad> {
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl DrawingBackend for MemoryDrawingBackend {
    fn create(&self, canvas: &CanvasSpec) -> Box<dyn DrawingSurface> {
        let pad = MemorySketchpad::new(canvas.clone());
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(pad.clone());
        Box::new(pad)
    }
}
