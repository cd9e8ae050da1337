//! Periodic evaluation of the backup policy.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{BackupOutcome, BackupService};
use crate::remote::DocumentStore;

pub struct BackupScheduler {
    handle: JoinHandle<()>,
}

impl BackupScheduler {
    /// Check once right away, then every `period`, in local time.
    pub fn spawn<S: DocumentStore>(service: Arc<BackupService<S>>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match service.run_if_due(chrono::Local::now()).await {
                    Ok(BackupOutcome::Completed { key, .. }) => {
                        tracing::info!(key = %key, "Scheduled backup written");
                    }
                    Ok(BackupOutcome::Skipped { reason }) => {
                        tracing::debug!(?reason, "Scheduled backup skipped");
                    }
                    Err(e) => tracing::error!(error = %e, "Scheduled backup failed"),
                }
            }
        });
        Self { handle }
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}
