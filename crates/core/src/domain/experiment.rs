use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::phase::PhaseConfig;
use crate::error::{CoreError, Result};

/// Identifier of a phase, e.g. `phase_1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PhaseId(String);

impl PhaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PhaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata carried alongside an experiment document.
///
/// Known keys are typed; anything else the config author or server adds is
/// kept verbatim so the document round-trips.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An experiment document: ordered phases, their configuration and metadata.
///
/// The same shape is used for the configuration handed to a new participant,
/// for the session object sent to storage after every trial, and for the
/// review data of a finished session.
///
/// Only top-level keys named in `phases` are read as phase configurations.
/// Any other key (a store's `_id`, a `version` number) lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawExperimentConfig")]
pub struct ExperimentConfig {
    pub phases: Vec<PhaseId>,
    pub metadata: SessionMetadata,
    #[serde(flatten)]
    pub phase_configs: BTreeMap<PhaseId, PhaseConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawExperimentConfig {
    phases: Vec<PhaseId>,
    #[serde(default, alias = "meta")]
    metadata: SessionMetadata,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawExperimentConfig> for ExperimentConfig {
    type Error = String;

    fn try_from(raw: RawExperimentConfig) -> std::result::Result<Self, Self::Error> {
        let mut phase_configs = BTreeMap::new();
        let mut extra = Map::new();
        for (key, value) in raw.rest {
            let id = PhaseId::from(key);
            if raw.phases.contains(&id) {
                let config = serde_json::from_value(value)
                    .map_err(|e| format!("invalid phase '{}': {}", id, e))?;
                phase_configs.insert(id, config);
            } else {
                extra.insert(id.0, value);
            }
        }

        Ok(Self {
            phases: raw.phases,
            metadata: raw.metadata,
            phase_configs,
            extra,
        })
    }
}

impl ExperimentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase to the running order.
    pub fn with_phase(mut self, id: impl Into<PhaseId>, config: PhaseConfig) -> Self {
        let id = id.into();
        self.phases.push(id.clone());
        self.phase_configs.insert(id, config);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every listed phase has a configuration.
    pub fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            return Err(CoreError::NoPhases);
        }
        match self
            .phases
            .iter()
            .find(|id| !self.phase_configs.contains_key(*id))
        {
            Some(missing) => Err(CoreError::MissingPhaseConfig(missing.clone())),
            None => Ok(()),
        }
    }

    pub fn phase(&self, id: &PhaseId) -> Option<&PhaseConfig> {
        self.phase_configs.get(id)
    }

    pub fn phase_mut(&mut self, id: &PhaseId) -> Option<&mut PhaseConfig> {
        self.phase_configs.get_mut(id)
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Total number of responses a participant gives across all phases.
    pub fn total_trials(&self) -> usize {
        self.phases
            .iter()
            .filter_map(|id| self.phase(id))
            .map(PhaseConfig::trial_count)
            .sum()
    }

    pub fn mark_completed(&mut self) {
        self.metadata.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.metadata.completed
    }
}
