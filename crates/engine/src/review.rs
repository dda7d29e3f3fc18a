//! Review mode: step through a finished session and replay its responses.
//!
//! Nothing is validated or persisted. On passive phases navigation is held
//! back for a playback delay so every stimulus is actually seen.

use std::sync::Arc;

use drawlang_core::{Capability, ExperimentConfig};
use events::{Event, EventBus};
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::collector::ResponseCollector;
use crate::controller::COMPLETED_NOTICE;
use crate::error::{EngineError, LoadFailure, Result};
use crate::options::EngineOptions;
use crate::ports::{CanvasSpec, DrawingBackend, ExperimentSource};
use crate::renderer::{CapabilityRenderer, Layout};
use crate::screen::{NoticeKind, Screen};
use crate::sequencer::{SessionState, Transition, TrialSequencer};
use crate::stimulus::StimulusProvider;

const VIEWER_CONTAINER: &str = "viewer";

pub struct ReviewController {
    session_id: Uuid,
    session: ExperimentConfig,
    sequencer: TrialSequencer,
    collector: ResponseCollector,
    screen: Screen,
    layout: Layout,
    options: EngineOptions,
    events: EventBus,
    locked_until: Option<Instant>,
}

impl ReviewController {
    pub async fn load(
        source: &dyn ExperimentSource,
        drawing: Arc<dyn DrawingBackend>,
        events: EventBus,
        options: EngineOptions,
    ) -> std::result::Result<Self, LoadFailure> {
        let results = source.user_results().await.map_err(|e| {
            error!(error = %e, "Failed to fetch session results");
            LoadFailure::new(EngineError::ConfigFetch(e.to_string()))
        })?;
        Self::start(results, drawing, events, options).map_err(|e| {
            error!(error = %e, "Failed to start review");
            LoadFailure::new(e)
        })
    }

    pub fn start(
        results: ExperimentConfig,
        drawing: Arc<dyn DrawingBackend>,
        events: EventBus,
        options: EngineOptions,
    ) -> Result<Self> {
        let sequencer = TrialSequencer::new(&results)?;
        let canvas = CanvasSpec {
            container_id: VIEWER_CONTAINER.to_string(),
            width: options.viewer_canvas.width,
            height: options.viewer_canvas.height,
            editable: false,
        };

        let mut controller = Self {
            session_id: Uuid::new_v4(),
            session: results,
            sequencer,
            collector: ResponseCollector::new(drawing, canvas),
            screen: Screen::new(),
            layout: Layout::default(),
            options,
            events,
            locked_until: None,
        };

        controller.enter_phase()?;
        info!(
            session_id = %controller.session_id,
            user = controller.session.metadata.user_id.as_deref().unwrap_or("-"),
            "Review started"
        );
        controller.events.emit(Event::SessionStarted {
            session_id: controller.session_id,
            phase_id: controller.sequencer.current_phase_id()?.to_string(),
            review: true,
        });
        controller.show_trial()?;
        Ok(controller)
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

    pub fn collector(&self) -> &ResponseCollector {
        &self.collector
    }

    pub fn dismiss_notice(&mut self) {
        self.screen.dismiss_notice();
    }

    /// Whether navigation is still held back, releasing the lock once the
    /// playback delay has passed.
    pub fn navigation_locked(&mut self) -> bool {
        match self.locked_until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                self.unlock();
                false
            }
            None => false,
        }
    }

    /// Sleep until the playback delay is over.
    pub async fn wait_for_navigation(&mut self) {
        if let Some(deadline) = self.locked_until {
            tokio::time::sleep_until(deadline).await;
            self.unlock();
        }
    }

    pub fn next(&mut self) -> Result<Transition> {
        self.ensure_navigable()?;
        let transition = self.sequencer.advance()?;
        self.apply(transition)?;
        Ok(transition)
    }

    pub fn previous(&mut self) -> Result<Transition> {
        self.ensure_navigable()?;
        let transition = self.sequencer.retreat()?;
        self.apply(transition)?;
        Ok(transition)
    }

    /// Animate the current trial's recorded strokes again.
    pub fn replay(&mut self) -> Result<()> {
        let index = self.sequencer.state().stimulus_index;
        let phase = self.sequencer.current_phase(&self.session)?;
        let prior = StimulusProvider::new(phase, &self.options.asset_base).prior_response(index);
        self.collector.play_back(prior.strokes);
        Ok(())
    }

    fn ensure_navigable(&mut self) -> Result<()> {
        if self.sequencer.state().completed {
            return Err(EngineError::SessionFinished);
        }
        if self.navigation_locked() {
            return Err(EngineError::NavigationLocked);
        }
        Ok(())
    }

    fn apply(&mut self, transition: Transition) -> Result<()> {
        match transition {
            Transition::Trial { .. } => self.show_trial(),
            Transition::PhaseChanged { phase_index } => {
                self.enter_phase()?;
                let briefing = CapabilityRenderer::briefing(
                    self.sequencer.current_phase(&self.session)?,
                    phase_index + 1,
                );
                self.screen.notify(NoticeKind::Info, briefing.to_string());
                self.events.emit(Event::PhaseChanged {
                    session_id: self.session_id,
                    phase_id: self.sequencer.current_phase_id()?.to_string(),
                    phase_index,
                    phase_total: self.sequencer.phase_total(),
                });
                self.show_trial()
            }
            Transition::Completed => {
                self.session.mark_completed();
                self.screen.notify(NoticeKind::Info, COMPLETED_NOTICE);
                self.screen.set_navigation_enabled(false);
                if let Some(url) = &self.options.feedback_url {
                    self.screen.redirect_to(url.clone());
                }
                info!(session_id = %self.session_id, "Review completed");
                self.events.emit(Event::SessionCompleted {
                    session_id: self.session_id,
                });
                Ok(())
            }
            Transition::Unchanged => Ok(()),
        }
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
        let index = self.sequencer.state().stimulus_index;
        let phase = self.sequencer.current_phase(&self.session)?;
        let provider = StimulusProvider::new(phase, &self.options.asset_base);
        let prior = provider.prior_response(index);

        self.screen.show_stimulus(provider.stimulus(index)?);
        self.screen.set_progress(self.sequencer.progress()?);
        self.collector
            .set_description(prior.description.unwrap_or_default());
        self.collector.play_back(prior.strokes);

        if self.layout.passive {
            let delay = self.options.playback_delay();
            debug!(delay_ms = delay.as_millis() as u64, "Locking navigation during playback");
            self.locked_until = Some(Instant::now() + delay);
            self.screen.set_navigation_enabled(false);
        } else {
            self.unlock();
        }

        self.events.emit(Event::TrialShown {
            session_id: self.session_id,
            phase_id: self.sequencer.current_phase_id()?.to_string(),
            stimulus_index: index,
        });
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked_until = None;
        self.screen.set_navigation_enabled(true);
    }
}

impl std::fmt::Debug for ReviewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewController")
            .field("session_id", &self.session_id)
            .field("state", &self.sequencer.state())
            .field("locked_until", &self.locked_until)
            .finish()
    }
}
