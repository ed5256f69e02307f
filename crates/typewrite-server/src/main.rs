use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use typewrite_api::auth::{AppState, AppStateInner};
use typewrite_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typewrite=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::load()?;
    let db = typewrite_db::Database::open(&config.db_path)?;

    std::fs::create_dir_all(&config.story_cache_dir)?;
    info!("Story cache at {}", config.story_cache_dir.display());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state: AppState = Arc::new(AppStateInner { db, config });
    let app = typewrite_server::app(state);

    info!("TypeWrite server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
