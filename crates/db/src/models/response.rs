use chrono::{DateTime, TimeZone, Utc};
use drawlang_core::ExperimentConfig;

use crate::error::DbError;

/// A participant's session document as kept in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub experiment_id: String,
    pub user_id: String,
    pub document: ExperimentConfig,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseRow {
    pub experiment_id: String,
    pub user_id: String,
    pub document: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ResponseRow {
    pub fn into_domain(self) -> Result<StoredResponse, DbError> {
        // Stored documents are parsed without phase validation so partial
        // sessions written by older clients still load.
        let document = serde_json::from_str(&self.document).map_err(|source| {
            DbError::CorruptDocument {
                experiment_id: self.experiment_id.clone(),
                user_id: self.user_id.clone(),
                source,
            }
        })?;

        Ok(StoredResponse {
            experiment_id: self.experiment_id,
            user_id: self.user_id,
            document,
            completed: self.completed,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }
}

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}
