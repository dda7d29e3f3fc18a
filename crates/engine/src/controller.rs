//! Forward-mode session driver.

use std::sync::Arc;

use drawlang_core::{Capability, ExperimentConfig, PhaseId};
use events::{Event, EventBus};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collector::ResponseCollector;
use crate::error::{EngineError, LoadFailure, Result};
use crate::options::EngineOptions;
use crate::ports::{CanvasSpec, DrawingBackend, ExperimentSource, SessionSink};
use crate::recorder::{PersistenceDispatcher, TrialRecorder};
use crate::renderer::{CapabilityRenderer, Layout};
use crate::screen::{NoticeKind, Screen};
use crate::sequencer::{SessionState, Transition, TrialSequencer};
use crate::stimulus::StimulusProvider;
use crate::validation::ValidationGate;

pub(crate) const COMPLETED_NOTICE: &str = "Experiment completed!";
const EDITOR_CONTAINER: &str = "editor";

/// External collaborators a session needs.
#[derive(Clone)]
pub struct Collaborators {
    pub drawing: Arc<dyn DrawingBackend>,
    pub sink: Arc<dyn SessionSink>,
    pub events: EventBus,
}

/// Drives one participant through an experiment, trial by trial.
///
/// Each [`next`](Self::next) call validates the current input, records it,
/// persists the session in the background and moves on.
pub struct SessionController {
    session_id: Uuid,
    session: ExperimentConfig,
    sequencer: TrialSequencer,
    gate: ValidationGate,
    recorder: TrialRecorder,
    dispatcher: JoinHandle<()>,
    collector: ResponseCollector,
    screen: Screen,
    layout: Layout,
    options: EngineOptions,
    events: EventBus,
    listening: bool,
}

impl SessionController {
    /// Fetch a configuration from `source` and start a session with it.
    ///
    /// On failure the returned [`LoadFailure`] carries the error screen.
    pub async fn load(
        source: &dyn ExperimentSource,
        collaborators: Collaborators,
        options: EngineOptions,
    ) -> std::result::Result<Self, LoadFailure> {
        let config = source.experiment_config().await.map_err(|e| {
            error!(error = %e, "Failed to fetch experiment configuration");
            LoadFailure::new(EngineError::ConfigFetch(e.to_string()))
        })?;
        Self::start(config, collaborators, options).map_err(|e| {
            error!(error = %e, "Failed to start session");
            LoadFailure::new(e)
        })
    }

    /// Start a session on an already fetched configuration.
    ///
    /// Must be called from within a tokio runtime; the persistence dispatcher
    /// is spawned here.
    pub fn start(
        config: ExperimentConfig,
        collaborators: Collaborators,
        options: EngineOptions,
    ) -> Result<Self> {
        let sequencer = TrialSequencer::new(&config)?;
        let session_id = Uuid::new_v4();
        let (recorder, dispatcher) = PersistenceDispatcher::spawn(
            collaborators.sink,
            collaborators.events.clone(),
            session_id,
        );
        let canvas = CanvasSpec {
            container_id: EDITOR_CONTAINER.to_string(),
            width: options.editor_canvas.width,
            height: options.editor_canvas.height,
            editable: true,
        };

        let mut controller = Self {
            session_id,
            session: config,
            sequencer,
            gate: ValidationGate::from_options(&options),
            recorder,
            dispatcher,
            collector: ResponseCollector::new(collaborators.drawing, canvas),
            screen: Screen::new(),
            layout: Layout::default(),
            options,
            events: collaborators.events,
            listening: true,
        };

        if controller.gate.is_bypassed() {
            warn!(%session_id, "Input validation is bypassed");
        }

        controller.enter_phase()?;
        let phase_id = controller.current_phase_id()?;
        info!(
            %session_id,
            phases = controller.sequencer.phase_total(),
            trials = controller.session.total_trials(),
            "Session started"
        );
        controller.events.emit(Event::SessionStarted {
            session_id,
            phase_id: phase_id.to_string(),
            review: false,
        });
        controller.show_trial()?;
        Ok(controller)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn session(&self) -> &ExperimentConfig {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.sequencer.state()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn collector(&self) -> &ResponseCollector {
        &self.collector
    }

    /// Whether forward navigation is still accepted.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Text typed into the describe box.
    pub fn set_description(&mut self, text: impl Into<String>) {
        self.collector.set_description(text);
    }

    pub fn dismiss_notice(&mut self) {
        self.screen.dismiss_notice();
    }

    /// Submit the current trial and move to the next one.
    pub fn next(&mut self) -> Result<Transition> {
        if !self.listening {
            return Err(EngineError::SessionFinished);
        }

        let phase_id = self.current_phase_id()?;
        let phase = self.sequencer.current_phase(&self.session)?;
        if let Err(failure) =
            self.gate
                .check(phase, self.collector.stroke_count(), self.collector.description())
        {
            debug!(phase = %phase_id, reasons = ?failure.errors, "Trial blocked");
            self.screen.notify(NoticeKind::Warning, failure.message());
            self.events.emit(Event::TrialBlocked {
                session_id: self.session_id,
                phase_id: phase_id.to_string(),
                reasons: failure.errors.iter().map(|e| e.kind().to_string()).collect(),
            });
            return Err(EngineError::IncompleteInput(failure));
        }

        let input = self.collector.collect(phase);
        let trial_index = self
            .recorder
            .record_trial(&mut self.session, &phase_id, input)?;
        self.events.emit(Event::TrialRecorded {
            session_id: self.session_id,
            phase_id: phase_id.to_string(),
            trial_index,
        });

        let transition = self.sequencer.advance()?;
        match transition {
            Transition::Trial { .. } => {
                self.collector.reset();
                self.show_trial()?;
            }
            Transition::PhaseChanged { phase_index } => {
                self.enter_phase()?;
                let briefing = CapabilityRenderer::briefing(
                    self.sequencer.current_phase(&self.session)?,
                    phase_index + 1,
                );
                self.screen.notify(NoticeKind::Info, briefing.to_string());
                self.collector.reset();
                let new_phase = self.current_phase_id()?;
                info!(session_id = %self.session_id, phase = %new_phase, "Phase changed");
                self.events.emit(Event::PhaseChanged {
                    session_id: self.session_id,
                    phase_id: new_phase.to_string(),
                    phase_index,
                    phase_total: self.sequencer.phase_total(),
                });
                self.show_trial()?;
            }
            Transition::Completed => self.complete(),
            Transition::Unchanged => {}
        }
        Ok(transition)
    }

    /// Wait until every queued snapshot has been handed to the sink and
    /// return the final session document.
    pub async fn close(self) -> ExperimentConfig {
        let Self {
            session,
            recorder,
            dispatcher,
            session_id,
            ..
        } = self;
        drop(recorder);
        if let Err(e) = dispatcher.await {
            warn!(%session_id, error = %e, "Persistence dispatcher ended abnormally");
        }
        session
    }

    fn complete(&mut self) {
        self.recorder.finish(&mut self.session);
        self.listening = false;
        self.screen.notify(NoticeKind::Info, COMPLETED_NOTICE);
        self.screen.set_navigation_enabled(false);
        if let Some(url) = &self.options.feedback_url {
            self.screen.redirect_to(url.clone());
        }
        self.events.emit(Event::SessionCompleted {
            session_id: self.session_id,
        });
    }

    fn current_phase_id(&self) -> Result<PhaseId> {
        self.sequencer.current_phase_id().cloned()
    }

    fn enter_phase(&mut self) -> Result<()> {
        let phase = self.sequencer.current_phase(&self.session)?;
        self.layout = CapabilityRenderer::layout(phase);
        self.screen.apply_layout(&self.layout);
        if phase.has(Capability::Draw) {
            self.collector.ensure_sketchpad();
        }
        Ok(())
    }

    fn show_trial(&mut self) -> Result<()> {
        let state = self.sequencer.state();
        let phase = self.sequencer.current_phase(&self.session)?;
        let stimulus = StimulusProvider::new(phase, &self.options.asset_base)
            .stimulus(state.stimulus_index)?;
        self.screen.show_stimulus(stimulus);
        self.screen.set_progress(self.sequencer.progress()?);
        self.events.emit(Event::TrialShown {
            session_id: self.session_id,
            phase_id: self.current_phase_id()?.to_string(),
            stimulus_index: state.stimulus_index,
        });
        Ok(())
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session_id", &self.session_id)
            .field("state", &self.sequencer.state())
            .field("listening", &self.listening)
            .finish()
    }
}
