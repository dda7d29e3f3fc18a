use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use drawlang_core::{Capability, ExperimentConfig, PhaseConfig};

use crate::ports::{ExperimentSource, PortError, RecordAck, SessionSink};

/// `phase_1` shows two images to copy, `phase_2` is a single describe trial.
pub fn two_phase_config() -> ExperimentConfig {
    ExperimentConfig::new()
        .with_phase(
            "phase_1",
            PhaseConfig::new([Capability::Images, Capability::Draw])
                .with_images(["a.png", "b.png"]),
        )
        .with_phase(
            "phase_2",
            PhaseConfig::new([Capability::Descriptions, Capability::Describe])
                .with_descriptions(["two stacked squares"]),
        )
}

/// Sink that keeps every snapshot it receives.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    snapshots: Arc<Mutex<Vec<ExperimentConfig>>>,
    failure: Option<String>,
}

impl MemorySink {
    pub fn failing(message: &str) -> Self {
        Self {
            snapshots: Arc::default(),
            failure: Some(message.to_string()),
        }
    }

    pub fn snapshots(&self) -> Vec<ExperimentConfig> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionSink for MemorySink {
    async fn record(&self, session: &ExperimentConfig) -> Result<RecordAck, PortError> {
        if let Some(message) = &self.failure {
            return Err(PortError::new(message.clone()));
        }
        self.snapshots.lock().unwrap().push(session.clone());
        Ok(RecordAck {
            success: Some(true),
            message: "Successfully updated record".to_string(),
        })
    }
}

/// Source serving fixed documents.
#[derive(Debug, Clone)]
pub struct StaticSource {
    pub config: Option<ExperimentConfig>,
    pub results: Option<ExperimentConfig>,
}

impl StaticSource {
    pub fn config(config: ExperimentConfig) -> Self {
        Self {
            config: Some(config),
            results: None,
        }
    }

    pub fn results(results: ExperimentConfig) -> Self {
        Self {
            config: None,
            results: Some(results),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            config: None,
            results: None,
        }
    }
}

#[async_trait]
impl ExperimentSource for StaticSource {
    async fn experiment_config(&self) -> Result<ExperimentConfig, PortError> {
        self.config
            .clone()
            .ok_or_else(|| PortError::new("connection refused"))
    }

    async fn user_results(&self) -> Result<ExperimentConfig, PortError> {
        self.results
            .clone()
            .ok_or_else(|| PortError::new("not found"))
    }
}
