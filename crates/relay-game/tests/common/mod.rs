//! Shared harness for turn engine tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use relay_core::hop::Artifact;
use relay_core::ledger::LedgerStore;
use relay_core::notify::{Notifier, ResultsSink};
use relay_core::participant::{Participant, ParticipantId};
use relay_core::rng::DeterministicRng;
use relay_game::application::service::{RelayPorts, RelayService, RelaySettings};
use relay_game::domain::commands::{ChooseReceiver, Register, StartTurn, SubmitArtifact};
use relay_test_support::{
    InMemoryLedgerStore, ManualClock, MockRng, RecordingNotifier, RecordingResultsSink,
};
use uuid::Uuid;

/// Fixed start time shared by all engine tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Engine plus handles on every collaborator.
pub struct Harness {
    pub service: Arc<RelayService>,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub results: Arc<RecordingResultsSink>,
    pub clock: Arc<ManualClock>,
}

pub struct HarnessBuilder {
    ledger: Arc<InMemoryLedgerStore>,
    notifier: Option<Arc<dyn Notifier>>,
    results: Option<Arc<dyn ResultsSink>>,
    store_override: Option<Arc<dyn LedgerStore>>,
    rng: Box<dyn DeterministicRng>,
    destination: Option<String>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(InMemoryLedgerStore::new()),
            notifier: None,
            results: None,
            store_override: None,
            rng: Box::new(MockRng),
            destination: Some("results".to_owned()),
        }
    }

    pub fn ledger(mut self, ledger: InMemoryLedgerStore) -> Self {
        self.ledger = Arc::new(ledger);
        self
    }

    /// Reuses a ledger that an earlier harness already wrote to.
    pub fn shared_ledger(mut self, ledger: Arc<InMemoryLedgerStore>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn results(mut self, results: Arc<dyn ResultsSink>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn rng(mut self, rng: impl DeterministicRng + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn destination(mut self, destination: Option<&str>) -> Self {
        self.destination = destination.map(str::to_owned);
        self
    }

    pub fn build(self) -> Harness {
        let notifier = Arc::new(RecordingNotifier::new());
        let results = Arc::new(RecordingResultsSink::new());
        let clock = Arc::new(ManualClock::new(fixed_now()));
        let settings = RelaySettings {
            deadline_duration: TimeDelta::hours(12),
            results_destination: self.destination,
            delivery_timeout: Duration::from_millis(200),
        };
        let ports = RelayPorts {
            ledger: self
                .store_override
                .unwrap_or_else(|| self.ledger.clone() as Arc<dyn LedgerStore>),
            notifier: self
                .notifier
                .unwrap_or_else(|| notifier.clone() as Arc<dyn Notifier>),
            results: self
                .results
                .unwrap_or_else(|| results.clone() as Arc<dyn ResultsSink>),
            clock: clock.clone(),
            rng: self.rng,
        };
        Harness {
            service: Arc::new(RelayService::new(settings, ports).unwrap()),
            ledger: self.ledger,
            notifier,
            results,
            clock,
        }
    }
}

pub fn player(id: u64) -> Participant {
    Participant::new(id, format!("player-{id}"))
}

pub fn clip(n: u32) -> Artifact {
    Artifact::new(format!("https://clips/{n}"), "Artist X", format!("Title {n}"))
}

pub fn register_cmd(id: u64) -> Register {
    Register {
        correlation_id: Uuid::new_v4(),
        participant: player(id),
    }
}

pub fn start_cmd(id: u64) -> StartTurn {
    StartTurn {
        correlation_id: Uuid::new_v4(),
        participant_id: ParticipantId(id),
    }
}

pub fn submit_cmd(sender: u64, n: u32) -> SubmitArtifact {
    SubmitArtifact {
        correlation_id: Uuid::new_v4(),
        sender_id: ParticipantId(sender),
        artifact: clip(n),
    }
}

pub fn choose_cmd(sender: u64, receiver: u64) -> ChooseReceiver {
    ChooseReceiver {
        correlation_id: Uuid::new_v4(),
        sender_id: ParticipantId(sender),
        receiver_id: ParticipantId(receiver),
    }
}

impl Harness {
    pub async fn register_all(&self, ids: &[u64]) {
        for id in ids {
            self.service.register(&register_cmd(*id)).await.unwrap();
        }
    }
}
