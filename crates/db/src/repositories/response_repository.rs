use chrono::Utc;
use drawlang_core::ExperimentConfig;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbError;
use crate::models::{ResponseRow, StoredResponse};

/// Session documents keyed by experiment and participant.
#[derive(Clone)]
pub struct ResponseRepository {
    pool: SqlitePool,
}

impl ResponseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the document for `(experiment_id, user_id)`.
    ///
    /// The completed flag is taken from the document's metadata.
    pub async fn upsert(
        &self,
        experiment_id: &str,
        user_id: &str,
        document: &ExperimentConfig,
    ) -> Result<StoredResponse, DbError> {
        let json = serde_json::to_string(document)?;
        let now = Utc::now().timestamp();

        let row: ResponseRow = sqlx::query_as(
            r#"
            INSERT INTO responses (experiment_id, user_id, document, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (experiment_id, user_id) DO UPDATE SET
                document = excluded.document,
                completed = excluded.completed,
                updated_at = excluded.updated_at
            RETURNING experiment_id, user_id, document, completed, created_at, updated_at
            "#,
        )
        .bind(experiment_id)
        .bind(user_id)
        .bind(&json)
        .bind(document.is_completed())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            experiment_id,
            user_id,
            completed = row.completed,
            "Stored session document"
        );
        row.into_domain()
    }

    pub async fn find(
        &self,
        experiment_id: &str,
        user_id: &str,
    ) -> Result<Option<StoredResponse>, DbError> {
        let row: Option<ResponseRow> = sqlx::query_as(
            r#"
            SELECT experiment_id, user_id, document, completed, created_at, updated_at
            FROM responses
            WHERE experiment_id = ? AND user_id = ?
            "#,
        )
        .bind(experiment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResponseRow::into_domain).transpose()
    }

    pub async fn is_completed(&self, experiment_id: &str, user_id: &str) -> Result<bool, DbError> {
        let completed: Option<bool> = sqlx::query_scalar(
            "SELECT completed FROM responses WHERE experiment_id = ? AND user_id = ?",
        )
        .bind(experiment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(completed.unwrap_or(false))
    }

    pub async fn list_by_experiment(
        &self,
        experiment_id: &str,
    ) -> Result<Vec<StoredResponse>, DbError> {
        let rows: Vec<ResponseRow> = sqlx::query_as(
            r#"
            SELECT experiment_id, user_id, document, completed, created_at, updated_at
            FROM responses
            WHERE experiment_id = ?
            ORDER BY user_id
            "#,
        )
        .bind(experiment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResponseRow::into_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, run_migrations};
    use drawlang_core::{Capability, PhaseConfig, PhaseId, StrokeSet};

    async fn setup() -> ResponseRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        ResponseRepository::new(pool)
    }

    fn document() -> ExperimentConfig {
        ExperimentConfig::new().with_phase(
            "phase_1",
            PhaseConfig::new([Capability::Images, Capability::Draw]).with_images(["a.png"]),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let repo = setup().await;
        let stored = repo.upsert("drawOnly", "u1", &document()).await.unwrap();
        assert!(!stored.completed);

        let found = repo.find("drawOnly", "u1").await.unwrap().unwrap();
        assert_eq!(found.document, document());
        assert!(repo.find("drawOnly", "u2").await.unwrap().is_none());
        assert!(repo.find("other", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_document() {
        let repo = setup().await;
        let first = repo.upsert("drawOnly", "u1", &document()).await.unwrap();

        let mut updated = document();
        updated
            .phase_mut(&PhaseId::from("phase_1"))
            .unwrap()
            .responses
            .push(StrokeSet::empty(), String::new());
        updated.mark_completed();
        let second = repo.upsert("drawOnly", "u1", &updated).await.unwrap();

        assert!(second.completed);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.list_by_experiment("drawOnly").await.unwrap().len(), 1);
        assert!(repo.is_completed("drawOnly", "u1").await.unwrap());
        let found = repo.find("drawOnly", "u1").await.unwrap().unwrap();
        assert_eq!(
            found
                .document
                .phase(&PhaseId::from("phase_1"))
                .unwrap()
                .responses
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_is_completed_for_unknown_user() {
        let repo = setup().await;
        assert!(!repo.is_completed("drawOnly", "nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_experiment() {
        let repo = setup().await;
        repo.upsert("drawOnly", "u2", &document()).await.unwrap();
        repo.upsert("drawOnly", "u1", &document()).await.unwrap();
        repo.upsert("describeOnly", "u3", &document()).await.unwrap();

        let users: Vec<String> = repo
            .list_by_experiment("drawOnly")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(users, vec!["u1", "u2"]);
    }
}
