use async_trait::async_trait;
use drawlang_core::ExperimentConfig;
use engine::{ExperimentSource, PortError, RecordAck, SessionSink};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Identifiers of the participant this client acts for, sent as query
/// parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Participant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
}

impl Participant {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_experiment(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    pub fn with_study(
        mut self,
        study_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        self.study_id = Some(study_id.into());
        self.session_id = Some(session_id.into());
        self
    }
}

pub struct ExperimentClient {
    base_url: String,
    client: Client,
    participant: Participant,
}

impl ExperimentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            participant: Participant::default(),
        }
    }

    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participant = participant;
        self
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub async fn fetch_config(&self) -> Result<ExperimentConfig> {
        let response = self
            .client
            .get(format!("{}/experiment_config", self.base_url))
            .query(&self.participant)
            .send()
            .await?;

        let value = self.handle_response(response).await?;
        Ok(ExperimentConfig::from_value(value)?)
    }

    pub async fn fetch_results(&self) -> Result<ExperimentConfig> {
        let response = self
            .client
            .get(format!("{}/user_results", self.base_url))
            .query(&self.participant)
            .send()
            .await?;

        let value = self.handle_response(response).await?;
        Ok(ExperimentConfig::from_value(value)?)
    }

    /// Send the whole session document to storage.
    pub async fn record_data(&self, session: &ExperimentConfig) -> Result<RecordAck> {
        let response = self
            .client
            .post(format!("{}/record_data", self.base_url))
            .json(session)
            .send()
            .await?;

        let ack: RecordAck = serde_json::from_value(self.handle_response(response).await?)?;
        debug!(success = ?ack.success, message = %ack.message, "record_data acknowledged");
        Ok(ack)
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            let url = response.url().path().to_string();
            return Err(ClientError::NotFound(url));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::InvalidResponse(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

fn port_error(e: ClientError) -> PortError {
    PortError::new(e.to_string())
}

#[async_trait]
impl ExperimentSource for ExperimentClient {
    async fn experiment_config(&self) -> std::result::Result<ExperimentConfig, PortError> {
        self.fetch_config().await.map_err(port_error)
    }

    async fn user_results(&self) -> std::result::Result<ExperimentConfig, PortError> {
        self.fetch_results().await.map_err(port_error)
    }
}

#[async_trait]
impl SessionSink for ExperimentClient {
    async fn record(&self, session: &ExperimentConfig) -> std::result::Result<RecordAck, PortError> {
        self.record_data(session).await.map_err(port_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawlang_core::{Capability, PhaseConfig, PhaseId};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_body() -> serde_json::Value {
        json!({
            "phases": ["phase_1"],
            "phase_1": {"ui_components": ["images", "draw"], "images": ["a.png"]},
            "metadata": {"experiment_id": "drawOnly", "user_id": "u1"}
        })
    }

    #[test]
    fn test_client_creation() {
        let client = ExperimentClient::new("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
        assert!(client.participant().user_id.is_none());
    }

    #[tokio::test]
    async fn test_fetch_config_sends_participant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/experiment_config"))
            .and(query_param("user_id", "u1"))
            .and(query_param("study_id", "s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(config_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExperimentClient::new(server.uri())
            .with_participant(Participant::new("u1").with_study("s1", "sess"));
        let config = client.experiment_config().await.unwrap();

        assert_eq!(config.phases, vec![PhaseId::from("phase_1")]);
        assert_eq!(config.metadata.experiment_id.as_deref(), Some("drawOnly"));
    }

    #[tokio::test]
    async fn test_fetch_config_rejects_invalid_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/experiment_config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"phases": ["phase_1"]})),
            )
            .mount(&server)
            .await;

        let client = ExperimentClient::new(server.uri());
        let err = client.fetch_config().await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_user_results_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user_results"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ExperimentClient::new(server.uri())
            .with_participant(Participant::new("u1").with_experiment("drawOnly"));
        assert!(matches!(
            client.fetch_results().await,
            Err(ClientError::NotFound(_))
        ));
        let err = client.user_results().await.unwrap_err();
        assert!(err.message.contains("Not found"));
    }

    #[tokio::test]
    async fn test_record_data_posts_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/record_data"))
            .and(body_partial_json(json!({"phases": ["phase_1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": true, "message": "Successfully updated record"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let session = ExperimentConfig::new().with_phase(
            "phase_1",
            PhaseConfig::new([Capability::Draw]).with_images(["a.png"]),
        );
        let client = ExperimentClient::new(server.uri());
        let ack = client.record(&session).await.unwrap();
        assert_eq!(ack.success, Some(true));
        assert!(!ack.is_rejected());
    }

    #[tokio::test]
    async fn test_record_data_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/record_data"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ExperimentClient::new(server.uri());
        let err = client
            .record_data(&ExperimentConfig::new())
            .await
            .unwrap_err();
        match err {
            ClientError::InvalidResponse(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
