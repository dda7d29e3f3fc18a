use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored document for {experiment_id}/{user_id} is unreadable: {source}")]
    CorruptDocument {
        experiment_id: String,
        user_id: String,
        source: serde_json::Error,
    },

    #[error("Document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
