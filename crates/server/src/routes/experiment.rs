use axum::extract::{Query, State};
use axum::Json;
use drawlang_core::ExperimentConfig;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Participant identifiers passed by the recruiting platform.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ConfigQuery {
    /// Participant id; a fresh one is generated when absent
    pub user_id: Option<String>,
    pub study_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ResultsQuery {
    pub user_id: String,
    pub experiment_id: String,
}

#[utoipa::path(
    get,
    path = "/experiment_config",
    params(ConfigQuery),
    responses(
        (status = 200, description = "Experiment configuration assigned to the participant", body = Object),
        (status = 500, description = "No readable configuration available")
    ),
    tag = "experiment"
)]
pub async fn experiment_config(
    State(state): State<AppState>,
    Query(query): Query<ConfigQuery>,
) -> Result<Json<ExperimentConfig>, AppError> {
    let user_id = query
        .user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut config = state.catalog.config_for(&user_id).await?;
    let metadata = &mut config.metadata;
    metadata.user_id = Some(user_id);
    metadata.study_id = query.study_id;
    metadata.session_id = query.session_id;
    if metadata.condition.is_none() {
        metadata.condition = Some(state.catalog.condition().to_string());
    }

    info!(
        user_id = metadata.user_id.as_deref().unwrap_or_default(),
        experiment_id = metadata.experiment_id.as_deref().unwrap_or("-"),
        "Served experiment config"
    );
    Ok(Json(config))
}

#[utoipa::path(
    get,
    path = "/user_results",
    params(ResultsQuery),
    responses(
        (status = 200, description = "Stored session document with recorded responses", body = Object),
        (status = 404, description = "No session stored for this participant")
    ),
    tag = "experiment"
)]
pub async fn user_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ExperimentConfig>, AppError> {
    let stored = state
        .responses
        .find(&query.experiment_id, &query.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No results for user {} in experiment {}",
                query.user_id, query.experiment_id
            ))
        })?;

    Ok(Json(stored.document))
}
