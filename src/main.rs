//! Demo server for the work-time accounting engine.
//!
//! Day plans and evaluation rules come from the YAML configuration directory;
//! bookings, holidays, absences and computed values live in memory.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use worktime_engine::api::{AppState, create_router};
use worktime_engine::config::ConfigLoader;
use worktime_engine::service::{CalculationService, Collaborators, RecalcQueue};
use worktime_engine::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir =
        env::var("WORKTIME_CONFIG_DIR").unwrap_or_else(|_| "./config/default".to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .context("SERVICE_PORT must be a port number")?;

    let config = Arc::new(
        ConfigLoader::load(&config_dir)
            .with_context(|| format!("failed to load configuration from {}", config_dir))?,
    );
    let settings = config.settings().clone();
    info!(config_dir = %config_dir, "Configuration loaded");

    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators {
        day_plans: config.clone(),
        evaluation_rules: config,
        ..Collaborators::from_store(store)
    };
    let service = Arc::new(CalculationService::new(
        collaborators,
        settings.holiday_average,
    ));
    let queue = Arc::new(RecalcQueue::start(service.clone(), settings.queue));
    let router = create_router(AppState::new(service, queue.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    info!(port, "Work-time engine listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("server error")?;

    queue.shutdown().await;
    info!("Work-time engine stopped");
    Ok(())
}
