//! Clip relay API server entry point.

use std::error::Error;
use std::sync::Arc;

use relay_api::config::RelayConfig;
use relay_api::notify::{FileResultsSink, LogNotifier};
use relay_api::routes;
use relay_api::state::AppState;
use relay_api::telemetry;
use relay_core::clock::{Clock, SystemClock};
use relay_core::rng::{DeterministicRng, StdRandom};
use relay_game::application::service::{RelayPorts, RelayService, RelaySettings};
use relay_game::application::watchdog::Watchdog;
use relay_ledger::SqliteLedgerStore;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = RelayConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting clip relay API server");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger = SqliteLedgerStore::open(config.ledger.clone(), Arc::clone(&clock)).await?;
    let rng: Box<dyn DeterministicRng> = match config.rng_seed {
        Some(seed) => Box::new(StdRandom::seeded(seed)),
        None => Box::new(StdRandom::from_entropy()),
    };

    let relay = Arc::new(RelayService::new(
        RelaySettings {
            deadline_duration: config.turn_deadline,
            results_destination: config.results_destination.clone(),
            delivery_timeout: config.delivery_timeout,
        },
        RelayPorts {
            ledger: Arc::new(ledger),
            notifier: Arc::new(LogNotifier),
            results: Arc::new(FileResultsSink::new(
                config.results_dir.clone(),
                Arc::clone(&clock),
            )),
            clock,
            rng,
        },
    )?);

    let recovery = relay.recover().await?;
    tracing::info!(
        hops = recovery.hops,
        finalized = recovery.finalization.is_some(),
        "ledger recovered"
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let watchdog =
        Watchdog::new(Arc::clone(&relay), config.watchdog_interval).spawn(shutdown_rx);

    if config.admin_token.is_none() {
        tracing::warn!("RELAY_ADMIN_TOKEN is not set; admin routes will refuse every request");
    }
    let app = routes::app(AppState::new(relay, config.admin_token.clone()));

    tracing::info!("Listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
            // The watchdog may already be gone.
            let _ = shutdown_tx.send(());
        })
        .await?;

    if let Err(err) = watchdog.await {
        tracing::error!(error = %err, "watchdog task failed");
    }
    telemetry.shutdown();

    Ok(())
}
