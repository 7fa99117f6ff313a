//! Deadline watchdog.
//!
//! Polls the engine at a fixed interval and hands overdue turns to a random
//! waiting participant. Each tick runs in its own task so a failing or
//! panicking tick never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::application::outcomes::Handover;
use crate::application::service::RelayService;

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Periodic deadline checker.
#[derive(Debug, Clone)]
pub struct Watchdog {
    service: Arc<RelayService>,
    poll_interval: Duration,
}

impl Watchdog {
    /// Creates a watchdog polling `service` every `poll_interval`.
    #[must_use]
    pub fn new(service: Arc<RelayService>, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
        }
    }

    /// Runs one check. Errors and panics are logged and swallowed.
    pub async fn tick(&self) {
        let service = Arc::clone(&self.service);
        let outcome = tokio::spawn(async move { service.expire_overdue_turn().await }).await;
        match outcome {
            Ok(Ok(None)) => {}
            Ok(Ok(Some(Handover::Passed { assigned, hop }))) => info!(
                holder = %assigned.holder.id,
                backfilled = hop.is_some(),
                "watchdog reassigned overdue turn"
            ),
            Ok(Ok(Some(Handover::Finished(finalization)))) => info!(
                delivered = finalization.delivered,
                archive = ?finalization.archive,
                "watchdog finalized the relay"
            ),
            Ok(Err(err)) => error!(error = %err, "watchdog tick failed"),
            Err(join_err) => error!(error = %join_err, "watchdog tick panicked"),
        }
    }

    /// Ticks until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = self.poll_interval.as_secs_f64(),
            "deadline watchdog started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.recv() => {
                    info!("deadline watchdog stopping");
                    break;
                }
            }
        }
    }

    /// Spawns [`Watchdog::run`] on the current runtime.
    #[must_use]
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
