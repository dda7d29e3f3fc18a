use server::{serve, ServerSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut settings = ServerSettings::default();
    if let Ok(port) = std::env::var("PORT") {
        settings.port = port.parse()?;
    }
    if let Ok(dir) = std::env::var("DRAWLANG_CONFIGS_DIR") {
        settings.configs_dir = dir.into();
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        settings.database_url = url;
    }

    serve(settings).await
}
