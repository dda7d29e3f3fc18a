//! Trial and phase sequencing for drawlang sessions.
//!
//! [`SessionController`] drives a participant forward through an experiment,
//! validating and recording every trial. [`ReviewController`] replays a
//! finished session in both directions. Everything they touch outside this
//! crate goes through the traits in [`ports`].

pub mod collector;
pub mod controller;
pub mod drawing;
pub mod error;
pub mod options;
pub mod ports;
pub mod recorder;
pub mod renderer;
pub mod review;
pub mod screen;
pub mod sequencer;
pub mod stimulus;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use collector::{ResponseCollector, TrialInput};
pub use controller::{Collaborators, SessionController};
pub use drawing::{MemoryDrawingBackend, MemorySketchpad};
pub use error::{EngineError, LoadFailure, Result};
pub use options::{CanvasSize, EngineOptions};
pub use ports::{
    CanvasSpec, DrawingBackend, DrawingSurface, ExperimentSource, PortError, RecordAck,
    SessionSink,
};
pub use recorder::{PersistenceDispatcher, TrialRecorder};
pub use renderer::{CapabilityRenderer, Layout, Panel, PhaseBriefing};
pub use review::ReviewController;
pub use screen::{Notice, NoticeKind, Screen};
pub use sequencer::{Progress, SessionState, Transition, TrialSequencer};
pub use stimulus::{PriorResponse, Stimulus, StimulusProvider};
pub use validation::{ValidationError, ValidationFailure, ValidationGate};
