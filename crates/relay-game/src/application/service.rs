//! The turn engine.
//!
//! `RelayService` owns the single live [`GameState`] behind one async mutex.
//! Commands and the watchdog go through the same lock, so no two transitions
//! interleave. Ledger writes happen under the lock and before the in-memory
//! change they back. Notifications are sent after the lock is released and
//! their failures are only logged.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use relay_core::clock::Clock;
use relay_core::command::Command;
use relay_core::error::RelayError;
use relay_core::hop::CompletedHop;
use relay_core::ledger::LedgerStore;
use relay_core::notify::{Notification, Notifier, RelayReport, ResultsSink};
use relay_core::participant::{Participant, ParticipantId};
use relay_core::rng::DeterministicRng;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::application::outcomes::{
    Departure, Finalization, Handover, Recovery, Registration, Submission, TurnAssigned,
};
use crate::application::results::compile_report;
use crate::application::status::{ChainView, RelayStatusView};
use crate::domain::commands::{
    ChooseReceiver, Leave, Register, SetDeadlineDuration, SetResultsDestination, StartTurn,
    SubmitArtifact,
};
use crate::domain::state::{GameState, Reassignment, SubmissionPlan};

/// Tunables for a relay game.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Deadline applied to each new assignment.
    pub deadline_duration: TimeDelta,
    /// Where final reports go, if anywhere.
    pub results_destination: Option<String>,
    /// Upper bound on each notification or report delivery.
    pub delivery_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            deadline_duration: TimeDelta::hours(12),
            results_destination: None,
            delivery_timeout: Duration::from_secs(5),
        }
    }
}

/// Collaborators injected into the engine.
pub struct RelayPorts {
    /// Durable ledger.
    pub ledger: Arc<dyn LedgerStore>,
    /// Player notifications.
    pub notifier: Arc<dyn Notifier>,
    /// Report delivery.
    pub results: Arc<dyn ResultsSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Randomness for candidate sampling.
    pub rng: Box<dyn DeterministicRng>,
}

struct Engine {
    state: GameState,
    rng: Box<dyn DeterministicRng>,
}

type Outbox = Vec<(Participant, Notification)>;

/// Serialized access to the relay game.
pub struct RelayService {
    engine: Mutex<Engine>,
    ledger: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
    results: Arc<dyn ResultsSink>,
    clock: Arc<dyn Clock>,
    delivery_timeout: Duration,
}

impl fmt::Debug for RelayService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayService")
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}

impl RelayService {
    /// Creates an engine with an empty game.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidDuration` if the configured deadline is not
    /// positive.
    pub fn new(settings: RelaySettings, ports: RelayPorts) -> Result<Self, RelayError> {
        let state = GameState::new(settings.deadline_duration, settings.results_destination)?;
        Ok(Self {
            engine: Mutex::new(Engine {
                state,
                rng: ports.rng,
            }),
            ledger: ports.ledger,
            notifier: ports.notifier,
            results: ports.results,
            clock: ports.clock,
            delivery_timeout: settings.delivery_timeout,
        })
    }

    /// Rebuilds the chain from the ledger after a restart. If the stored
    /// chain already ended with its terminal hop, finalizes it right away.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Store` if the ledger cannot be read.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> Result<Recovery, RelayError> {
        let mut engine = self.engine.lock().await;
        let hops = self.ledger.load_all().await?;
        let count = hops.len();
        let ended = hops.last().is_some_and(CompletedHop::is_terminal);
        engine.state.rehydrate(hops);
        info!(hops = count, "recovered relay chain from ledger");

        let finalization = if ended {
            warn!("recovered chain had already ended; finalizing");
            Some(self.finalize_locked(&mut engine).await)
        } else {
            None
        };
        Ok(Recovery {
            hops: count,
            finalization,
        })
    }

    /// Registers a participant, or re-queues one who already took a turn.
    ///
    /// # Errors
    ///
    /// `AlreadyWaiting` or `AlreadyTaken`.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        participant_id = %command.participant.id,
    ))]
    pub async fn register(&self, command: &Register) -> Result<Registration, RelayError> {
        let mut engine = self.engine.lock().await;
        let registration = engine.state.register(command.participant.clone())?;
        info!(?registration, "participant registered");
        Ok(registration)
    }

    /// Removes a participant. If they hold the artifact, it is handed over
    /// exactly as on deadline expiry.
    ///
    /// # Errors
    ///
    /// `NotRegistered`, or `Store` if the back-filled hop cannot be written.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        participant_id = %command.participant_id,
    ))]
    pub async fn leave(&self, command: &Leave) -> Result<Departure, RelayError> {
        let mut outbox = Outbox::new();
        let result = {
            let mut engine = self.engine.lock().await;
            if engine.state.check_leave(command.participant_id)? {
                let now = self.clock.now();
                let handover = self
                    .reassign_locked(&mut engine, now, Some(command.participant_id), &mut outbox)
                    .await?;
                info!("holder left; turn handed over");
                Departure::LeftHolding(handover)
            } else {
                engine.state.remove(command.participant_id);
                info!("participant left");
                Departure::Left
            }
        };
        self.dispatch(outbox).await;
        Ok(result)
    }

    /// Hands the artifact to the opening holder.
    ///
    /// # Errors
    ///
    /// `NotRegistered` or `AlreadyTaken`.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        participant_id = %command.participant_id,
    ))]
    pub async fn start(&self, command: &StartTurn) -> Result<TurnAssigned, RelayError> {
        let assigned = {
            let mut engine = self.engine.lock().await;
            let (holder, turn) = engine.state.start(command.participant_id, self.clock.now())?;
            info!(deadline = %turn.deadline, "chain started");
            TurnAssigned {
                holder,
                deadline: turn.deadline,
            }
        };
        self.dispatch(vec![(assigned.holder.clone(), Notification::FirstInChain)])
            .await;
        Ok(assigned)
    }

    /// Submits the holder's clip. Offers up to four random receivers, or, if
    /// nobody is left, records the terminal self-loop and finalizes.
    ///
    /// # Errors
    ///
    /// `NotYourTurn`, or `Store` if the terminal hop cannot be written.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        sender_id = %command.sender_id,
    ))]
    pub async fn submit(&self, command: &SubmitArtifact) -> Result<Submission, RelayError> {
        let mut engine = self.engine.lock().await;
        let now = self.clock.now();
        let engine = &mut *engine;
        let plan = engine.state.plan_submission(
            command.sender_id,
            command.artifact.clone(),
            now,
            engine.rng.as_mut(),
        )?;

        match plan {
            SubmissionPlan::Offer(pending) => {
                let candidates = pending.candidates.clone();
                engine.state.offer(pending);
                info!(candidates = candidates.len(), "receivers offered");
                Ok(Submission::Offered { candidates })
            }
            SubmissionPlan::Terminal(hop) => {
                self.ledger.append(&hop).await?;
                engine.state.close(Some(hop));
                info!("no receivers left; chain closed");
                Ok(Submission::Finished(self.finalize_locked(engine).await))
            }
        }
    }

    /// Completes the pending hop with an offered receiver and passes the
    /// artifact on.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NotRegistered`, `AlreadyTaken`, or `Store` if the
    /// hop cannot be written.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        sender_id = %command.sender_id,
        receiver_id = %command.receiver_id,
    ))]
    pub async fn choose(&self, command: &ChooseReceiver) -> Result<TurnAssigned, RelayError> {
        let (assigned, notification) = {
            let mut engine = self.engine.lock().await;
            let now = self.clock.now();
            let hop = engine
                .state
                .plan_choice(command.sender_id, command.receiver_id, now)?;
            let entry_id = self.ledger.append(&hop).await?;
            let notification = Notification::YourTurn {
                from: hop.sender.clone(),
                artifact: hop.artifact.clone(),
            };
            let holder = hop.receiver.clone();
            let turn = engine.state.hand_over(hop, now);
            info!(entry_id = entry_id.0, deadline = %turn.deadline, "artifact passed on");
            (
                TurnAssigned {
                    holder,
                    deadline: turn.deadline,
                },
                notification,
            )
        };
        self.dispatch(vec![(assigned.holder.clone(), notification)])
            .await;
        Ok(assigned)
    }

    /// Changes the deadline for future assignments.
    ///
    /// # Errors
    ///
    /// `InvalidDuration` unless the duration is positive.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        seconds = command.seconds,
    ))]
    pub async fn set_deadline_duration(
        &self,
        command: &SetDeadlineDuration,
    ) -> Result<TimeDelta, RelayError> {
        let mut engine = self.engine.lock().await;
        let duration = engine.state.set_deadline_duration(command.seconds)?;
        info!("turn deadline changed");
        Ok(duration)
    }

    /// Sets where final reports go.
    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
    ))]
    pub async fn set_results_destination(&self, command: &SetResultsDestination) {
        let mut engine = self.engine.lock().await;
        engine
            .state
            .set_results_destination(command.destination.clone());
        info!(destination = ?command.destination, "results destination changed");
    }

    /// Watchdog tick body: if the live turn is overdue, hands the artifact to
    /// a random waiting participant, or finalizes when nobody is left.
    ///
    /// # Errors
    ///
    /// `Store` if the back-filled hop cannot be written. The turn is left
    /// untouched so the next tick retries.
    pub async fn expire_overdue_turn(&self) -> Result<Option<Handover>, RelayError> {
        let mut outbox = Outbox::new();
        let handover = {
            let mut engine = self.engine.lock().await;
            let now = self.clock.now();
            let Some(turn) = engine.state.turn().filter(|_| engine.state.is_overdue(now)) else {
                return Ok(None);
            };
            info!(holder = %turn.holder, deadline = %turn.deadline, "turn deadline expired");
            self.reassign_locked(&mut engine, now, None, &mut outbox)
                .await?
        };
        self.dispatch(outbox).await;
        Ok(Some(handover))
    }

    /// A consistent snapshot of the game state.
    pub async fn snapshot(&self) -> GameState {
        self.engine.lock().await.state.clone()
    }

    /// Counts and current holder, for status commands.
    pub async fn status(&self) -> RelayStatusView {
        RelayStatusView::from_state(&self.engine.lock().await.state)
    }

    /// The chain so far, including a pending hop.
    pub async fn chain(&self) -> ChainView {
        ChainView::from_state(&self.engine.lock().await.state)
    }

    async fn reassign_locked(
        &self,
        engine: &mut Engine,
        now: DateTime<Utc>,
        departing: Option<ParticipantId>,
        outbox: &mut Outbox,
    ) -> Result<Handover, RelayError> {
        match engine.state.plan_reassignment(now, engine.rng.as_mut()) {
            Reassignment::Pass { receiver, hop } => {
                if let Some(hop) = &hop {
                    self.ledger.append(hop).await?;
                }
                if let Some(id) = departing {
                    engine.state.remove(id);
                }
                let artifact = hop.as_ref().map(|h| h.artifact.clone());
                let turn = engine.state.reassign(receiver.id, hop.clone(), now);
                info!(receiver = %receiver.id, "artifact auto-assigned");
                outbox.push((receiver.clone(), Notification::AutoAssigned { artifact }));
                Ok(Handover::Passed {
                    assigned: TurnAssigned {
                        holder: receiver,
                        deadline: turn.deadline,
                    },
                    hop,
                })
            }
            Reassignment::Exhausted { terminal } => {
                if let Some(hop) = &terminal {
                    self.ledger.append(hop).await?;
                }
                if let Some(id) = departing {
                    engine.state.remove(id);
                }
                engine.state.close(terminal);
                info!("no participants left to reassign; chain closed");
                Ok(Handover::Finished(self.finalize_locked(engine).await))
            }
        }
    }

    /// Compiles and delivers the report, archives the ledger and resets the
    /// game. Runs to completion under the engine lock.
    async fn finalize_locked(&self, engine: &mut Engine) -> Finalization {
        let report = compile_report(engine.state.chain());
        let mut delivered = false;
        let mut archive = None;

        if let Some(report) = &report {
            let destination = engine.state.results_destination().map(str::to_owned);
            delivered = self.deliver(destination.as_deref(), report).await;
            match self.ledger.archive().await {
                Ok(id) => archive = Some(id),
                Err(err) => {
                    error!(error = %err, "failed to archive relay ledger; discarding live rows");
                    if let Err(err) = self.ledger.truncate().await {
                        error!(error = %err, "failed to clear relay ledger after archive failure");
                    }
                }
            }
        } else {
            info!("chain is empty; nothing to report");
        }

        engine.state.reset();
        info!(delivered, archive = ?archive, "relay game finalized");
        Finalization {
            report,
            delivered,
            archive,
        }
    }

    async fn deliver(&self, destination: Option<&str>, report: &RelayReport) -> bool {
        let Some(destination) = destination else {
            warn!("no results destination configured; skipping delivery");
            return false;
        };
        match timeout(self.delivery_timeout, self.results.deliver(destination, report)).await {
            Ok(Ok(())) => {
                info!(destination, pages = report.pages.len(), "results delivered");
                true
            }
            Ok(Err(err)) => {
                warn!(destination, error = %err, "failed to deliver results");
                false
            }
            Err(_) => {
                warn!(destination, "timed out delivering results");
                false
            }
        }
    }

    async fn dispatch(&self, outbox: Outbox) {
        for (participant, notification) in outbox {
            match timeout(
                self.delivery_timeout,
                self.notifier.notify(&participant, &notification),
            )
            .await
            {
                Ok(Ok(())) => debug!(participant_id = %participant.id, "participant notified"),
                Ok(Err(err)) => {
                    warn!(participant_id = %participant.id, error = %err, "failed to notify participant");
                }
                Err(_) => warn!(participant_id = %participant.id, "timed out notifying participant"),
            }
        }
    }
}
