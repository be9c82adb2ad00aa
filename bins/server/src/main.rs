//! Tutora API Server
//!
//! Serves the HTTP API and runs the settlement job that completes lessons,
//! records earnings and matures the wallet ledger.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutora_api::{AppState, create_router};
use tutora_core::engine::{Engines, SettlementJob, Stores};
use tutora_core::notify::TracingNotifier;
use tutora_core::rail::LoggingRail;
use tutora_db::migration::Migrator;
use tutora_db::{MemoryStore, PgStore, connect_with};
use tutora_shared::config::StorageBackend;
use tutora_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutora=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = connect_with(&config.database)
                .await
                .context("failed to connect to database")?;
            if config.database.run_migrations {
                Migrator::up(&db, None).await.context("failed to run migrations")?;
            }
            info!("Connected to database");
            Stores::shared(Arc::new(PgStore::new(db)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Stores::shared(Arc::new(MemoryStore::new()))
        }
    };

    let engines = Engines::new(
        stores,
        Arc::new(TracingNotifier),
        Arc::new(LoggingRail),
        &config,
    )
    .context("invalid wallet configuration")?;

    spawn_settlement(
        engines.settlement.clone(),
        Duration::from_secs(config.jobs.settlement_interval_secs.max(1)),
    );

    let state = AppState::new(
        engines,
        JwtService::new(&config.auth.jwt_secret),
        &config.webhook.secret,
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Runs the settlement job every `interval` until the process exits.
fn spawn_settlement(job: Arc<SettlementJob>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = job.run(Utc::now()).await;
            tracing::debug!(
                completed = report.completed,
                expired = report.expired,
                earnings = report.earnings,
                promoted = report.sweep.promoted,
                "Settlement tick"
            );
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
