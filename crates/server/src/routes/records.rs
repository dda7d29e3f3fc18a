use axum::extract::State;
use axum::Json;
use drawlang_core::ExperimentConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::{AppState, ADMIN_USER, TEST_EXPERIMENT};

pub const RECORD_UPDATED: &str = "Successfully updated record";
pub const ALREADY_COMPLETED: &str = "User already completed experiment";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/record_data",
    request_body(content = Object, description = "Full session document"),
    responses(
        (status = 200, description = "Outcome of the write", body = RecordResponse),
        (status = 400, description = "Document lacks experiment_id or user_id")
    ),
    tag = "records"
)]
pub async fn record_data(
    State(state): State<AppState>,
    Json(document): Json<ExperimentConfig>,
) -> Result<Json<RecordResponse>, AppError> {
    let metadata = &document.metadata;
    let (Some(experiment_id), Some(user_id)) = (
        metadata.experiment_id.as_deref().filter(|s| !s.is_empty()),
        metadata.user_id.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "metadata.experiment_id and metadata.user_id are required".to_string(),
        ));
    };

    let experiment_id = if user_id == ADMIN_USER {
        TEST_EXPERIMENT
    } else {
        experiment_id
    };

    if state.responses.is_completed(experiment_id, user_id).await? {
        warn!(experiment_id, user_id, "Rejected write to completed session");
        return Ok(Json(RecordResponse {
            success: false,
            message: ALREADY_COMPLETED.to_string(),
        }));
    }

    let stored = state
        .responses
        .upsert(experiment_id, user_id, &document)
        .await?;
    info!(
        experiment_id,
        user_id,
        completed = stored.completed,
        "Recorded session data"
    );

    Ok(Json(RecordResponse {
        success: true,
        message: RECORD_UPDATED.to_string(),
    }))
}
