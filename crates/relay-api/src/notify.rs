//! Outbound adapters: log-line notifications and on-disk result files.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::clock::Clock;
use relay_core::error::DeliveryError;
use relay_core::notify::{Notification, Notifier, RelayReport, ResultsSink};
use relay_core::participant::Participant;
use tracing::info;

/// Emits each notification as a structured log line. Whatever ships the
/// logs to players (a chat bridge, a mail relay) subscribes to these.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        participant: &Participant,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| DeliveryError::Unreachable(e.to_string()))?;
        info!(
            target: "relay::notify",
            participant_id = %participant.id,
            display_name = %participant.display_name,
            payload = %payload,
            "{notification}"
        );
        Ok(())
    }
}

/// Writes each report as `relay_results_<ts>.txt` plus a paginated
/// `relay_results_<ts>.json` under `<root>/<destination>/`.
#[derive(Clone)]
pub struct FileResultsSink {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileResultsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResultsSink")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl FileResultsSink {
    /// Creates a sink rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Resolves `destination` to a directory under the root. Only a single
    /// plain path segment is accepted.
    fn directory_for(&self, destination: &str) -> Result<PathBuf, DeliveryError> {
        let mut components = Path::new(destination).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) => Ok(self.root.join(segment)),
            _ => Err(DeliveryError::Unreachable(format!(
                "invalid results destination {destination:?}"
            ))),
        }
    }
}

#[async_trait]
impl ResultsSink for FileResultsSink {
    async fn deliver(&self, destination: &str, report: &RelayReport) -> Result<(), DeliveryError> {
        let dir = self.directory_for(destination)?;
        tokio::fs::create_dir_all(&dir).await?;

        let stamp = self.clock.now().format("%Y-%m-%d_%H-%M-%S");
        let pages = serde_json::to_vec_pretty(&report.pages)
            .map_err(|e| DeliveryError::Io(e.to_string()))?;

        tokio::fs::write(dir.join(format!("relay_results_{stamp}.txt")), &report.text).await?;
        tokio::fs::write(dir.join(format!("relay_results_{stamp}.json")), pages).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use relay_core::notify::{ReportLine, ReportPage};
    use relay_test_support::FixedClock;
    use uuid::Uuid;

    use super::*;

    fn report() -> RelayReport {
        RelayReport {
            pages: vec![ReportPage {
                number: 1,
                lines: vec![ReportLine {
                    ordinal: 1,
                    sender: "alice".into(),
                    receiver: "alice".into(),
                    artifact_ref: "https://clips/1".into(),
                    artist: "Artist".into(),
                    title: "Title".into(),
                }],
            }],
            text: "#1: alice \u{2794} alice\n".into(),
        }
    }

    fn sink(root: &Path) -> FileResultsSink {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        FileResultsSink::new(root, Arc::new(clock))
    }

    #[tokio::test]
    async fn test_deliver_writes_text_and_pages() {
        // Arrange
        let root = std::env::temp_dir().join(format!("relay-results-{}", Uuid::new_v4()));
        let sink = sink(&root);

        // Act
        sink.deliver("hall-of-fame", &report()).await.unwrap();

        // Assert
        let dir = root.join("hall-of-fame");
        let text = std::fs::read_to_string(dir.join("relay_results_2026-01-15_10-00-00.txt"))
            .unwrap();
        assert!(text.starts_with("#1: alice"));
        let pages: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.join("relay_results_2026-01-15_10-00-00.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(pages[0]["lines"][0]["artifact_ref"], "https://clips/1");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_deliver_rejects_path_like_destinations() {
        // Arrange
        let root = std::env::temp_dir().join(format!("relay-results-{}", Uuid::new_v4()));
        let sink = sink(&root);

        // Act / Assert
        for destination in ["../escape", "a/b", "", "/abs"] {
            let err = sink.deliver(destination, &report()).await.unwrap_err();
            assert!(matches!(err, DeliveryError::Unreachable(_)), "{destination}");
        }
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let participant = Participant::new(7, "gale");

        LogNotifier
            .notify(&participant, &Notification::FirstInChain)
            .await
            .unwrap();
    }
}
