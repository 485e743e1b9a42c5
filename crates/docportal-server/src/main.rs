use std::sync::Arc;

use anyhow::Context;
use docportal_core::config::PortalConfig;
use docportal_core::Dialect;
use docportal_server::pg::PgStore;
use docportal_server::routes;
use docportal_server::state::{check_queries, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path =
        std::env::var("DOCPORTAL_CONFIG").unwrap_or_else(|_| "config/portal.json".to_string());
    let config = PortalConfig::load(&config_path)?;
    if config.dialect != Dialect::Postgres {
        anyhow::bail!(
            "{config_path}: dialect {:?} is not supported by the server, use postgres",
            config.dialect
        );
    }
    check_queries(&config).context("startup query check")?;

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let store = Arc::new(PgStore::connect(&db_url, &config).await?);
    let state = AppState::new(&config, store.clone(), store.clone(), store)?;

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("{}:{}", host, port);

    let app = routes::router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    tracing::info!(tables = config.tables.len(), "server running on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
