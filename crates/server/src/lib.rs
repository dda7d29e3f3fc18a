pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use config::{ConfigCatalog, DEFAULT_CONDITION};
use state::AppState;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "drawlang API",
        version = "0.1.0",
        description = "Experiment configuration and response storage for drawing and description studies"
    ),
    paths(
        routes::health_check,
        routes::experiment_config,
        routes::user_results,
        routes::record_data,
    ),
    components(schemas(routes::HealthResponse, routes::RecordResponse)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "experiment", description = "Experiment configuration and review data"),
        (name = "records", description = "Session persistence"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        .route("/api/openapi.json", get(openapi_json))
        .route("/health", get(routes::health_check))
        .route("/experiment_config", get(routes::experiment_config))
        .route("/user_results", get(routes::user_results))
        .route("/record_data", post(routes::record_data));

    let router = match static_dir {
        Some(dir) => router.nest_service("/static", ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Everything needed to run the server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub configs_dir: PathBuf,
    pub condition: String,
    pub static_dir: Option<PathBuf>,
    pub database_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            configs_dir: PathBuf::from("configs"),
            condition: DEFAULT_CONDITION.to_string(),
            static_dir: Some(PathBuf::from("static")),
            database_url: "sqlite:drawlang.db".to_string(),
        }
    }
}

/// Open storage, load the config catalog and serve until the process ends.
pub async fn serve(settings: ServerSettings) -> anyhow::Result<()> {
    let pool = db::create_pool(&settings.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", settings.database_url))?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let catalog = ConfigCatalog::load(&settings.configs_dir, &settings.condition)?;
    let mut state = AppState::new(pool, catalog);
    if let Some(dir) = settings.static_dir.clone() {
        if dir.is_dir() {
            state = state.with_static_dir(dir);
        } else {
            tracing::warn!(path = %dir.display(), "Static directory not found, not serving /static");
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
