//! Event types emitted while a session runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every event with identity and time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Everything a running session reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Configuration loaded and the first phase rendered
    #[serde(rename = "session.started")]
    SessionStarted {
        session_id: Uuid,
        phase_id: String,
        review: bool,
    },

    /// A stimulus is on screen
    #[serde(rename = "trial.shown")]
    TrialShown {
        session_id: Uuid,
        phase_id: String,
        stimulus_index: usize,
    },

    /// Forward navigation refused because required input is missing
    #[serde(rename = "trial.blocked")]
    TrialBlocked {
        session_id: Uuid,
        phase_id: String,
        reasons: Vec<String>,
    },

    /// A response was appended to the phase record
    #[serde(rename = "trial.recorded")]
    TrialRecorded {
        session_id: Uuid,
        phase_id: String,
        trial_index: usize,
    },

    /// A new phase began
    #[serde(rename = "phase.changed")]
    PhaseChanged {
        session_id: Uuid,
        phase_id: String,
        phase_index: usize,
        phase_total: usize,
    },

    /// The final trial of the final phase was completed
    #[serde(rename = "session.completed")]
    SessionCompleted { session_id: Uuid },

    /// Storage accepted a session snapshot
    #[serde(rename = "persistence.acknowledged")]
    PersistenceAcknowledged { session_id: Uuid, message: String },

    /// A session snapshot could not be stored
    #[serde(rename = "persistence.failed")]
    PersistenceFailed { session_id: Uuid, error: String },
}

impl Event {
    pub fn session_id(&self) -> Uuid {
        match self {
            Event::SessionStarted { session_id, .. }
            | Event::TrialShown { session_id, .. }
            | Event::TrialBlocked { session_id, .. }
            | Event::TrialRecorded { session_id, .. }
            | Event::PhaseChanged { session_id, .. }
            | Event::SessionCompleted { session_id }
            | Event::PersistenceAcknowledged { session_id, .. }
            | Event::PersistenceFailed { session_id, .. } => *session_id,
        }
    }

    /// Phase the event refers to, if it concerns a single phase
    pub fn phase_id(&self) -> Option<&str> {
        match self {
            Event::SessionStarted { phase_id, .. }
            | Event::TrialShown { phase_id, .. }
            | Event::TrialBlocked { phase_id, .. }
            | Event::TrialRecorded { phase_id, .. }
            | Event::PhaseChanged { phase_id, .. } => Some(phase_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}
