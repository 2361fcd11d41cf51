use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use tutorly::adapters::http::{billing_router, BillingAppState, BillingSettings};
use tutorly::adapters::postgres::MIGRATOR;
use tutorly::adapters::{ExpiryScheduler, ExpirySchedulerConfig, InMemoryBillingStore};
use tutorly::config::{AppConfig, ServerConfig};
use tutorly::domain::payment::PaymentSignatureVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    init_tracing(&config.server);

    let verifier = Arc::new(PaymentSignatureVerifier::new(
        config.payment.gateway_key_secret.expose_secret().clone(),
    ));
    let settings = BillingSettings {
        trial_days: config.subscription.trial_days,
        sweep_batch_size: config.scheduler.batch_size,
        default_currency: config.payment.default_currency.clone(),
    };

    let state = match config.database.url() {
        Some(url) => {
            let pool = config
                .database
                .pool_options()
                .connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            if config.database.run_migrations {
                MIGRATOR.run(&pool).await.context("failed to run migrations")?;
            }
            BillingAppState::postgres(pool, verifier, settings)
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            BillingAppState::in_memory(Arc::new(InMemoryBillingStore::new()), verifier, settings)
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = if config.scheduler.enabled {
        let scheduler = ExpiryScheduler::new(
            Arc::new(state.sweep_handler()),
            ExpirySchedulerConfig::from(&config.scheduler),
        );
        Some(tokio::spawn(async move { scheduler.run(shutdown_rx).await }))
    } else {
        None
    };

    let app = billing_router(state, config.server.request_timeout());
    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        environment = ?config.server.environment,
        "Tutorly listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    if let Some(task) = scheduler_task {
        task.await.context("expiry scheduler panicked")?;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
