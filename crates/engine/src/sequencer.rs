use std::fmt;

use drawlang_core::{ExperimentConfig, PhaseConfig, PhaseId};
use serde::Serialize;

use crate::error::{EngineError, Result};

/// Position of a session within its experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub phase_index: usize,
    pub stimulus_index: usize,
    pub completed: bool,
}

/// Outcome of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to another trial of the same phase
    Trial { stimulus_index: usize },
    /// Crossed into another phase
    PhaseChanged { phase_index: usize },
    /// The last trial of the last phase was completed
    Completed,
    /// Already at the start; nothing moved
    Unchanged,
}

#[derive(Debug, Clone)]
struct PlannedPhase {
    id: PhaseId,
    stimulus_count: usize,
}

impl PlannedPhase {
    fn trial_count(&self) -> usize {
        self.stimulus_count.max(1)
    }
}

/// Index arithmetic over the fixed phase plan of an experiment.
///
/// The plan is captured when the sequencer is built; stimulus counts never
/// change afterwards.
#[derive(Debug, Clone)]
pub struct TrialSequencer {
    plan: Vec<PlannedPhase>,
    state: SessionState,
}

impl TrialSequencer {
    pub fn new(config: &ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let plan = config
            .phases
            .iter()
            .map(|id| PlannedPhase {
                id: id.clone(),
                stimulus_count: config
                    .phase(id)
                    .map(PhaseConfig::active_stimulus_count)
                    .unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            plan,
            state: SessionState::default(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase_total(&self) -> usize {
        self.plan.len()
    }

    fn planned(&self) -> Result<&PlannedPhase> {
        self.plan
            .get(self.state.phase_index)
            .ok_or_else(|| EngineError::out_of_range("phase", self.state.phase_index, self.plan.len()))
    }

    pub fn current_phase_id(&self) -> Result<&PhaseId> {
        self.planned().map(|p| &p.id)
    }

    pub fn current_phase<'a>(&self, config: &'a ExperimentConfig) -> Result<&'a PhaseConfig> {
        let id = self.current_phase_id()?;
        config
            .phase(id)
            .ok_or_else(|| EngineError::out_of_range("phase", self.state.phase_index, self.plan.len()))
    }

    pub fn active_stimulus_count(&self) -> Result<usize> {
        self.planned().map(|p| p.stimulus_count)
    }

    /// Whether the current trial is the last one of the session.
    pub fn is_final_trial(&self) -> bool {
        match self.planned() {
            Ok(phase) => {
                self.state.phase_index + 1 == self.plan.len()
                    && self.state.stimulus_index + 1 >= phase.trial_count()
            }
            Err(_) => false,
        }
    }

    /// Move past the current trial.
    pub fn advance(&mut self) -> Result<Transition> {
        if self.state.completed {
            return Err(EngineError::SessionFinished);
        }
        let count = self.active_stimulus_count()?;

        self.state.stimulus_index += 1;
        if self.state.stimulus_index < count {
            return Ok(Transition::Trial {
                stimulus_index: self.state.stimulus_index,
            });
        }

        self.state.stimulus_index = 0;
        self.state.phase_index += 1;
        if self.state.phase_index >= self.plan.len() {
            self.state.completed = true;
            return Ok(Transition::Completed);
        }
        Ok(Transition::PhaseChanged {
            phase_index: self.state.phase_index,
        })
    }

    /// Step back one trial, crossing into the last trial of the previous
    /// phase when at the start of a phase. A no-op at the very first trial.
    pub fn retreat(&mut self) -> Result<Transition> {
        if self.state.completed {
            return Err(EngineError::SessionFinished);
        }
        if self.state.stimulus_index > 0 {
            self.state.stimulus_index -= 1;
            return Ok(Transition::Trial {
                stimulus_index: self.state.stimulus_index,
            });
        }
        if self.state.phase_index == 0 {
            return Ok(Transition::Unchanged);
        }

        self.state.phase_index -= 1;
        self.state.stimulus_index = self.planned()?.trial_count() - 1;
        Ok(Transition::PhaseChanged {
            phase_index: self.state.phase_index,
        })
    }

    /// Share of the current phase's stimuli already passed, 0 to 100.
    pub fn percent_complete(&self) -> u32 {
        match self.active_stimulus_count() {
            Ok(count) if count > 0 => {
                (100.0 * self.state.stimulus_index as f64 / count as f64).round() as u32
            }
            _ => 0,
        }
    }

    pub fn progress(&self) -> Result<Progress> {
        let phase = self.planned()?;
        Ok(Progress {
            phase_id: phase.id.clone(),
            phase_number: self.state.phase_index + 1,
            phase_total: self.plan.len(),
            trial_number: self.state.stimulus_index + 1,
            trial_total: phase.trial_count(),
            percent: self.percent_complete(),
        })
    }
}

/// Progress display for the current trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub phase_id: PhaseId,
    pub phase_number: usize,
    pub phase_total: usize,
    pub trial_number: usize,
    pub trial_total: usize,
    pub percent: u32,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.phase_id.as_str();
        let mut chars = id.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_uppercase(), chars.as_str())?;
        }
        write!(f, ": {}/{}", self.trial_number, self.trial_total)
    }
}
