//! Recording trials and shipping session snapshots to storage.

use std::sync::Arc;

use drawlang_core::{ExperimentConfig, PhaseId};
use events::{Event, EventBus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collector::TrialInput;
use crate::error::{EngineError, Result};
use crate::ports::SessionSink;

/// Appends trial responses to the session and queues a snapshot after each one.
///
/// Queuing never waits on storage; the snapshot is sent by the
/// [`PersistenceDispatcher`] in the background.
#[derive(Debug, Clone)]
pub struct TrialRecorder {
    outbox: mpsc::UnboundedSender<ExperimentConfig>,
}

impl TrialRecorder {
    pub fn new(outbox: mpsc::UnboundedSender<ExperimentConfig>) -> Self {
        Self { outbox }
    }

    /// Append `input` to `phase_id`'s record and queue the session.
    ///
    /// Returns the index of the recorded trial within the phase.
    pub fn record_trial(
        &self,
        session: &mut ExperimentConfig,
        phase_id: &PhaseId,
        input: TrialInput,
    ) -> Result<usize> {
        let phase_count = session.phase_count();
        let phase = session
            .phase_mut(phase_id)
            .ok_or_else(|| EngineError::out_of_range("phase", phase_count, phase_count))?;
        phase.responses.push(input.strokes, input.description);
        let trial_index = phase.responses.len() - 1;

        debug!(phase = %phase_id, trial = trial_index, "Recorded trial");
        self.dispatch(session);
        Ok(trial_index)
    }

    /// Stamp the session as completed and queue the final snapshot.
    pub fn finish(&self, session: &mut ExperimentConfig) {
        session.mark_completed();
        info!(
            experiment = session.metadata.experiment_id.as_deref().unwrap_or("-"),
            "Session completed"
        );
        self.dispatch(session);
    }

    fn dispatch(&self, session: &ExperimentConfig) {
        if self.outbox.send(session.clone()).is_err() {
            warn!("Persistence dispatcher stopped; snapshot dropped");
        }
    }
}

/// Background task sending queued snapshots to a [`SessionSink`] in order.
///
/// Failures are logged and published, never retried. The task ends once every
/// [`TrialRecorder`] feeding it has been dropped and the queue is drained.
pub struct PersistenceDispatcher;

impl PersistenceDispatcher {
    pub fn spawn(
        sink: Arc<dyn SessionSink>,
        events: EventBus,
        session_id: Uuid,
    ) -> (TrialRecorder, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ExperimentConfig>();

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                match sink.record(&snapshot).await {
                    Ok(ack) if ack.is_rejected() => {
                        warn!(%session_id, message = %ack.message, "Storage rejected session snapshot");
                        events.emit(Event::PersistenceFailed {
                            session_id,
                            error: ack.message,
                        });
                    }
                    Ok(ack) => {
                        debug!(%session_id, message = %ack.message, "Session snapshot stored");
                        events.emit(Event::PersistenceAcknowledged {
                            session_id,
                            message: ack.message,
                        });
                    }
                    Err(e) => {
                        warn!(%session_id, error = %e, "Failed to store session snapshot");
                        events.emit(Event::PersistenceFailed {
                            session_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
            debug!(%session_id, "Persistence dispatcher finished");
        });

        (TrialRecorder::new(tx), handle)
    }
}
