use anyhow::Context;
use axum::serve;
use tokio::net::TcpListener;

use mdnotes::{build_app, config::AppConfig, db, logging, store::NoteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    logging::init_tracing(&config.log_filter);

    db::run_migrations(&config.database.url)
        .await
        .context("failed to migrate database")?;
    let pool = db::establish_pool(&config.database)
        .await
        .context("failed to open database pool")?;

    let app = build_app(NoteStore::new(pool));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
