use std::path::PathBuf;
use std::sync::Arc;

use db::ResponseRepository;
use sqlx::SqlitePool;

use crate::config::ConfigCatalog;

/// User whose sessions are filed under [`TEST_EXPERIMENT`] instead of their
/// own experiment.
pub const ADMIN_USER: &str = "admin";
pub const TEST_EXPERIMENT: &str = "test";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ConfigCatalog>,
    pub responses: ResponseRepository,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(pool: SqlitePool, catalog: ConfigCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            responses: ResponseRepository::new(pool),
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, static_dir: PathBuf) -> Self {
        self.static_dir = Some(static_dir);
        self
    }
}
