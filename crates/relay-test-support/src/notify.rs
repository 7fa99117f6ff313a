//! Test side channels: recording and failing notifiers and results sinks.

use std::sync::Mutex;

use async_trait::async_trait;
use relay_core::error::DeliveryError;
use relay_core::notify::{Notification, Notifier, RelayReport, ResultsSink};
use relay_core::participant::{Participant, ParticipantId};

/// A notifier that records every notification and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ParticipantId, Notification)>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all notifications sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<(ParticipantId, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        participant: &Participant,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((participant.id, notification.clone()));
        Ok(())
    }
}

/// A notifier whose recipients all have their direct messages closed.
#[derive(Debug)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        participant: &Participant,
        _notification: &Notification,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unreachable(participant.display_name.clone()))
    }
}

/// A results sink that records every delivered report.
#[derive(Debug, Default)]
pub struct RecordingResultsSink {
    delivered: Mutex<Vec<(String, RelayReport)>>,
}

impl RecordingResultsSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all delivered reports with their destination.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delivered(&self) -> Vec<(String, RelayReport)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultsSink for RecordingResultsSink {
    async fn deliver(&self, destination: &str, report: &RelayReport) -> Result<(), DeliveryError> {
        self.delivered
            .lock()
            .unwrap()
            .push((destination.to_owned(), report.clone()));
        Ok(())
    }
}
