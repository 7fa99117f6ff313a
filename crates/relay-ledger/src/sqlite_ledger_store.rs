//! SQLite implementation of the `LedgerStore` trait.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::{info, warn};

use relay_core::clock::Clock;
use relay_core::error::StoreError;
use relay_core::hop::{Artifact, CompletedHop};
use relay_core::ledger::{ArchiveId, EntryId, LedgerStore};
use relay_core::participant::{Participant, ParticipantId};

use crate::{audit, schema};

/// Where the ledger keeps its files.
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    /// The live SQLite database.
    pub database: PathBuf,
    /// The live JSON audit mirror.
    pub audit_log: PathBuf,
    /// Directory that receives archived databases and mirrors.
    pub archive_dir: PathBuf,
}

impl LedgerPaths {
    /// Lays out all three paths under `root` with the default file names.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            database: root.join("game_data.db"),
            audit_log: root.join("game_log.json"),
            archive_dir: root.join("archives"),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChainLogRow {
    sender_id: i64,
    sender_label: String,
    receiver_id: i64,
    receiver_label: String,
    artifact_ref: String,
    artist: String,
    title: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<ChainLogRow> for CompletedHop {
    type Error = StoreError;

    fn try_from(row: ChainLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sender: Participant::new(from_column(row.sender_id)?, row.sender_label),
            receiver: Participant::new(from_column(row.receiver_id)?, row.receiver_label),
            artifact: Artifact::new(row.artifact_ref, row.artist, row.title),
            recorded_at: row.recorded_at,
        })
    }
}

fn to_column(id: ParticipantId) -> Result<i64, StoreError> {
    i64::try_from(id.0)
        .map_err(|_| StoreError::Serialization(format!("participant id {id} exceeds i64")))
}

fn from_column(value: i64) -> Result<ParticipantId, StoreError> {
    u64::try_from(value)
        .map(ParticipantId)
        .map_err(|_| StoreError::Serialization(format!("negative participant id {value}")))
}

#[allow(clippy::needless_pass_by_value)]
fn database_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

/// SQLite-backed ledger with a JSON audit mirror.
///
/// All operations go through one async mutex, so appends, loads and
/// archival never interleave.
pub struct SqliteLedgerStore {
    paths: LedgerPaths,
    clock: Arc<dyn Clock>,
    pool: Mutex<SqlitePool>,
}

impl fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteLedgerStore")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl SqliteLedgerStore {
    /// Opens the ledger, creating the database and its table if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the parent directory cannot be created or the
    /// database cannot be opened.
    pub async fn open(paths: LedgerPaths, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let pool = connect(&paths.database).await?;
        info!(database = %paths.database.display(), "opened relay ledger");
        Ok(Self {
            paths,
            clock,
            pool: Mutex::new(pool),
        })
    }

    /// Returns the configured file locations.
    #[must_use]
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Picks `archive_<stamp>` or, if taken, the first free `archive_<stamp>_<n>`.
    async fn unused_archive_name(&self, stamp: &str) -> Result<String, StoreError> {
        let base = format!("archive_{stamp}");
        let mut candidate = base.clone();
        let mut n = 1;
        while self.archive_exists(&candidate).await? {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        Ok(candidate)
    }

    async fn archive_exists(&self, name: &str) -> Result<bool, StoreError> {
        let db = self.paths.archive_dir.join(format!("{name}.db"));
        let json = self.paths.archive_dir.join(format!("{name}.json"));
        Ok(tokio::fs::try_exists(&db).await? || tokio::fs::try_exists(&json).await?)
    }

    /// Moves the live database and mirror into the archive directory. Either
    /// both move or neither does.
    async fn rotate(&self, name: &str) -> Result<(), StoreError> {
        let db_target = self.paths.archive_dir.join(format!("{name}.db"));
        let json_target = self.paths.archive_dir.join(format!("{name}.json"));

        let moved_db = if tokio::fs::try_exists(&self.paths.database).await? {
            tokio::fs::rename(&self.paths.database, &db_target).await?;
            true
        } else {
            false
        };

        if tokio::fs::try_exists(&self.paths.audit_log).await? {
            if let Err(err) = tokio::fs::rename(&self.paths.audit_log, &json_target).await {
                if moved_db {
                    if let Err(undo) = tokio::fs::rename(&db_target, &self.paths.database).await {
                        warn!(error = %undo, "failed to restore database after partial archive");
                    }
                }
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Reopens the pool if an earlier archival left it closed.
    async fn ensure_open(&self, pool: &mut SqlitePool) -> Result<(), StoreError> {
        if pool.is_closed() {
            warn!("ledger connection was closed; reopening");
            *pool = connect(&self.paths.database).await?;
        }
        Ok(())
    }
}

async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(database_error)?;
    sqlx::raw_sql(schema::CREATE_CHAIN_LOG_TABLE)
        .execute(&pool)
        .await
        .map_err(database_error)?;
    Ok(pool)
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn append(&self, hop: &CompletedHop) -> Result<EntryId, StoreError> {
        let mut pool = self.pool.lock().await;
        self.ensure_open(&mut pool).await?;
        let row_id = sqlx::query(schema::INSERT_HOP)
            .bind(to_column(hop.sender.id)?)
            .bind(&hop.sender.display_name)
            .bind(to_column(hop.receiver.id)?)
            .bind(&hop.receiver.display_name)
            .bind(&hop.artifact.reference)
            .bind(&hop.artifact.artist)
            .bind(&hop.artifact.title)
            .bind(hop.recorded_at)
            .execute(&*pool)
            .await
            .map_err(database_error)?
            .last_insert_rowid();

        if let Err(err) = audit::append_record(&self.paths.audit_log, hop).await {
            warn!(
                error = %err,
                audit_log = %self.paths.audit_log.display(),
                "failed to mirror hop to audit log"
            );
        }

        Ok(EntryId(row_id))
    }

    async fn load_all(&self) -> Result<Vec<CompletedHop>, StoreError> {
        let mut pool = self.pool.lock().await;
        self.ensure_open(&mut pool).await?;
        let rows: Vec<ChainLogRow> = sqlx::query_as(schema::SELECT_ALL_HOPS)
            .fetch_all(&*pool)
            .await
            .map_err(database_error)?;
        rows.into_iter().map(CompletedHop::try_from).collect()
    }

    async fn archive(&self) -> Result<ArchiveId, StoreError> {
        let mut pool = self.pool.lock().await;
        self.ensure_open(&mut pool).await?;

        tokio::fs::create_dir_all(&self.paths.archive_dir).await?;
        let stamp = self.clock.now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let name = self.unused_archive_name(&stamp).await?;

        pool.close().await;
        let rotated = self.rotate(&name).await;

        // A failed reconnect leaves the pool closed; the next call retries.
        *pool = connect(&self.paths.database).await?;
        rotated?;

        info!(archive = %name, "archived relay ledger");
        Ok(ArchiveId(name))
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        let mut pool = self.pool.lock().await;
        self.ensure_open(&mut pool).await?;

        sqlx::query(schema::DELETE_ALL_HOPS)
            .execute(&*pool)
            .await
            .map_err(database_error)?;
        if let Err(err) = audit::clear(&self.paths.audit_log).await {
            warn!(
                error = %err,
                audit_log = %self.paths.audit_log.display(),
                "failed to clear audit log"
            );
        }

        warn!("relay ledger truncated in place");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use relay_test_support::FixedClock;

    fn scratch_paths() -> LedgerPaths {
        let root = std::env::temp_dir().join(format!("relay-ledger-unit-{}", uuid::Uuid::new_v4()));
        LedgerPaths::under(&root)
    }

    async fn open_store() -> SqliteLedgerStore {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        SqliteLedgerStore::open(scratch_paths(), Arc::new(FixedClock(now)))
            .await
            .unwrap()
    }

    fn hop(sender: u64, receiver: u64) -> CompletedHop {
        CompletedHop {
            sender: Participant::new(sender, format!("player-{sender}")),
            receiver: Participant::new(receiver, format!("player-{receiver}")),
            artifact: Artifact::new("clip", "Artist X", "Title Y"),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_closed_pool_is_reopened_on_next_call() {
        // Arrange
        let store = open_store().await;
        store.append(&hop(1, 2)).await.unwrap();
        store.pool.lock().await.close().await;

        // Act
        let appended = store.append(&hop(2, 3)).await;

        // Assert
        assert!(appended.is_ok());
        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rotate_restores_database_when_mirror_cannot_move() {
        // Arrange
        let store = open_store().await;
        store.append(&hop(1, 2)).await.unwrap();
        let name = "archive_blocked";
        let blocker = store.paths.archive_dir.join(format!("{name}.json"));
        std::fs::create_dir_all(&blocker).unwrap();
        std::fs::write(blocker.join("occupied"), b"x").unwrap();
        store.pool.lock().await.close().await;

        // Act
        let rotated = store.rotate(name).await;

        // Assert
        assert!(rotated.is_err());
        assert!(store.paths.database.exists());
        assert!(store.paths.audit_log.exists());
        assert!(!store.paths.archive_dir.join(format!("{name}.db")).exists());
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }
}
