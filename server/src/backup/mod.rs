//! Daily snapshots of the production branch and restores from them.

mod scheduler;

pub use scheduler::BackupScheduler;

use std::sync::Arc;

use autobook_engine::{
    backup_keys, BackupPolicy, BackupSnapshot, Booking, Branch, CollectionKind, DueReason,
    Environment, IncomeRecord, PriceEntry, User, LATEST_KEY,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::remote::DocumentStore;
use crate::storage::{Ledger, Stored};

/// Persisted-store key holding the time of the last successful backup.
pub const LAST_BACKUP_KEY: &str = "antigravity_last_backup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Backups are only taken from the production branch.
    NotProduction,
    /// The production branch holds no data.
    Empty,
    NotDue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BackupOutcome {
    Completed { key: String, timestamp: String },
    Skipped { reason: SkipReason },
}

fn valid_key(key: &str) -> bool {
    key == LATEST_KEY || NaiveDate::parse_from_str(key, "%Y-%m-%d").is_ok()
}

pub struct BackupService<S> {
    environment: Environment,
    store: Arc<S>,
    ledger: Arc<Ledger>,
    policy: BackupPolicy,
}

impl<S: DocumentStore> BackupService<S> {
    pub fn new(
        environment: Environment,
        store: Arc<S>,
        ledger: Arc<Ledger>,
        policy: BackupPolicy,
    ) -> Self {
        Self {
            environment,
            store,
            ledger,
            policy,
        }
    }

    /// Time of the last successful backup taken by this installation.
    pub fn last_backup(&self) -> Option<DateTime<Utc>> {
        let raw: Option<String> = self.ledger.store().get(LAST_BACKUP_KEY);
        raw.and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    fn record_backup(&self, now: DateTime<Utc>) {
        let ts = autobook_engine::clock::iso_timestamp(now);
        if let Err(e) = self.ledger.store().set(LAST_BACKUP_KEY, &ts) {
            tracing::warn!(error = %e, "Failed to record backup time");
        }
    }

    /// Snapshot `MASTER` into `BACKUP/{date}` and `BACKUP/latest`.
    pub async fn run_backup(&self, now: DateTime<Utc>) -> Result<BackupOutcome> {
        if self.environment.primary_branch() != Branch::Master {
            tracing::debug!("Not serving production data, skipping backup");
            return Ok(BackupOutcome::Skipped {
                reason: SkipReason::NotProduction,
            });
        }

        let data = self.store.get(Branch::Master.as_str()).await?;
        let Some(snapshot) = data.and_then(|data| BackupSnapshot::capture(data, now)) else {
            tracing::info!("Production branch is empty, nothing to back up");
            return Ok(BackupOutcome::Skipped {
                reason: SkipReason::Empty,
            });
        };

        let key = BackupSnapshot::key_for(now);
        let value = serde_json::to_value(&snapshot)
            .map_err(|e| AppError::Internal(format!("failed to encode snapshot: {e}")))?;

        self.store
            .put(&format!("{}/{}", Branch::Backup, key), &value)
            .await?;
        if let Err(e) = self
            .store
            .put(&format!("{}/{}", Branch::Backup, LATEST_KEY), &value)
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to update latest backup alias");
        }

        self.record_backup(now);
        tracing::info!(key = %key, timestamp = %snapshot.timestamp, "Backup completed");
        Ok(BackupOutcome::Completed {
            key,
            timestamp: snapshot.timestamp,
        })
    }

    /// Run a backup when the policy says one is due.
    pub async fn run_if_due<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<BackupOutcome> {
        let last = self.last_backup();
        match self.policy.due_reason(last, &now) {
            Some(reason) => {
                tracing::info!(?reason, last = ?last, "Backup due");
                self.run_backup(now.with_timezone(&Utc)).await
            }
            None => {
                tracing::debug!(last = ?last, "Backup not due");
                Ok(BackupOutcome::Skipped {
                    reason: SkipReason::NotDue,
                })
            }
        }
    }

    pub fn due_reason<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Option<DueReason> {
        self.policy.due_reason(self.last_backup(), &now)
    }

    /// Restorable snapshot keys, most recent first.
    pub async fn list_backups(&self) -> Result<Vec<String>> {
        let keys = self.store.shallow_keys(Branch::Backup.as_str()).await?;
        Ok(backup_keys(keys))
    }

    /// Fetch and validate one snapshot.
    pub async fn restore(&self, key: &str) -> Result<BackupSnapshot> {
        if !valid_key(key) {
            return Err(AppError::BadRequest(format!(
                "invalid backup key '{key}', expected YYYY-MM-DD or {LATEST_KEY}"
            )));
        }
        tracing::info!(key = %key, "Reading backup");
        let value = self
            .store
            .get(&format!("{}/{}", Branch::Backup, key))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("backup {key}")))?;
        Ok(BackupSnapshot::from_value(value)?)
    }

    async fn restore_typed<T: Stored>(&self, key: &str) -> Result<usize> {
        let snapshot = self.restore(key).await?;
        let records = snapshot
            .collection::<T>(T::KIND)
            .ok_or_else(|| AppError::NotFound(format!("{} in backup {key}", T::KIND)))??;
        let count = self.ledger.restore(records)?;
        tracing::info!(key = %key, collection = %T::KIND, count, "Collection restored from backup");
        Ok(count)
    }

    /// Replace one local collection with its copy from a snapshot.
    pub async fn restore_collection(&self, key: &str, kind: CollectionKind) -> Result<usize> {
        match kind {
            CollectionKind::Income => self.restore_typed::<IncomeRecord>(key).await,
            CollectionKind::Bookings => self.restore_typed::<Booking>(key).await,
            CollectionKind::Prices => self.restore_typed::<PriceEntry>(key).await,
            CollectionKind::Users => self.restore_typed::<User>(key).await,
        }
    }
}
