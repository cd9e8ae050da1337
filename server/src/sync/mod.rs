//! Synchronization between the ledger and the remote store.
//!
//! Pulls are merges ([`autobook_engine::merge_by_presence`]) done once per
//! authenticated period, or on request. Pushes replace the remote collection
//! wholesale with the local one.

mod debounce;

pub use debounce::PushScheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use autobook_engine::{
    decode_records, Booking, Branch, CollectionKind, Environment, IncomeRecord, MergeReport,
    PriceEntry, User,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::remote::{DocumentStore, ProbeOutcome};
use crate::storage::{Ledger, Stored};

/// Outcome of loading one collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionLoad {
    pub collection: CollectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MergeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// The load did not run (already loaded, or nobody is signed in).
    pub skipped: bool,
    pub collections: Vec<CollectionLoad>,
}

impl LoadSummary {
    fn skipped() -> Self {
        Self {
            skipped: true,
            collections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub branch: Branch,
    pub loaded: bool,
    pub authenticated: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub auto_push: bool,
}

fn hint_for(error: &AppError) -> Option<String> {
    match error {
        AppError::Remote(e) => Some(e.hint().to_string()),
        _ => None,
    }
}

pub struct SyncEngine<S> {
    environment: Environment,
    store: Arc<S>,
    ledger: Arc<Ledger>,
    loaded: AtomicBool,
    authenticated: AtomicBool,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl<S: DocumentStore> SyncEngine<S> {
    pub fn new(environment: Environment, store: Arc<S>, ledger: Arc<Ledger>) -> Self {
        tracing::info!(
            branch = %environment.primary_branch(),
            hostname = %environment.hostname,
            "Sync engine using remote branch"
        );
        Self {
            environment,
            store,
            ledger,
            loaded: AtomicBool::new(false),
            authenticated: AtomicBool::new(false),
            last_sync: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn branch(&self) -> Branch {
        self.environment.primary_branch()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Record whether any session is signed in. Signing everybody out
    /// re-arms the one-shot load.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
        if !authenticated {
            self.loaded.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn mark_synced(&self) {
        let mut last = self.last_sync.lock().unwrap_or_else(|p| p.into_inner());
        *last = Some(Utc::now());
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            branch: self.branch(),
            loaded: self.is_loaded(),
            authenticated: self.is_authenticated(),
            last_sync: *self.last_sync.lock().unwrap_or_else(|p| p.into_inner()),
            auto_push: self.branch() != Branch::Test,
        }
    }

    /// Fetch and decode one collection from the primary branch.
    pub async fn fetch_collection<T: Stored>(&self) -> Result<Vec<T>> {
        let path = T::KIND.remote_path(self.branch());
        let value = self.store.get(&path).await?;
        match value {
            None => Ok(Vec::new()),
            Some(value) => Ok(decode_records(value)?),
        }
    }

    fn apply_fetched<T: Stored>(&self, fetched: Result<Vec<T>>) -> CollectionLoad {
        let outcome = fetched.and_then(|remote| self.ledger.merge_remote(remote));
        match outcome {
            Ok(report) => {
                tracing::info!(
                    collection = %T::KIND,
                    remote = report.remote,
                    kept_local = report.kept_local,
                    "Merged remote collection"
                );
                if report.overwritten > 0 {
                    tracing::warn!(
                        collection = %T::KIND,
                        overwritten = report.overwritten,
                        "Local edits replaced by remote versions"
                    );
                }
                CollectionLoad {
                    collection: T::KIND,
                    report: Some(report),
                    error: None,
                    hint: None,
                }
            }
            Err(e) => {
                let hint = hint_for(&e);
                tracing::warn!(
                    collection = %T::KIND,
                    error = %e,
                    hint = hint.as_deref().unwrap_or(""),
                    "Failed to load collection, keeping local data"
                );
                CollectionLoad {
                    collection: T::KIND,
                    report: None,
                    error: Some(e.to_string()),
                    hint,
                }
            }
        }
    }

    /// Merge the remote record collections into the ledger.
    ///
    /// Runs once per authenticated period unless `force` is set. The three
    /// collections are fetched concurrently; each merge re-reads the local
    /// collection when it runs, so edits made during the fetch survive.
    pub async fn load_from_cloud(&self, force: bool) -> LoadSummary {
        if !self.is_authenticated() {
            tracing::debug!("Not signed in, skipping cloud load");
            return LoadSummary::skipped();
        }
        if !force && self.is_loaded() {
            tracing::debug!("Cloud data already loaded");
            return LoadSummary::skipped();
        }

        tracing::info!(branch = %self.branch(), "Loading collections from remote store");
        let (income, bookings, prices) = tokio::join!(
            self.fetch_collection::<IncomeRecord>(),
            self.fetch_collection::<Booking>(),
            self.fetch_collection::<PriceEntry>(),
        );

        if !self.is_authenticated() {
            tracing::info!("Signed out while loading, discarding remote data");
            return LoadSummary::skipped();
        }

        let collections = vec![
            self.apply_fetched(income),
            self.apply_fetched(bookings),
            self.apply_fetched(prices),
        ];

        // A partial load stays retryable; merges are idempotent.
        if collections.iter().all(|c| c.error.is_none()) {
            self.loaded.store(true, Ordering::SeqCst);
            self.mark_synced();
        } else {
            tracing::warn!("Cloud load incomplete, will retry on next request");
        }
        LoadSummary {
            skipped: false,
            collections,
        }
    }

    /// Replace the remote collection with the local one.
    pub async fn save_to_cloud(&self, kind: CollectionKind) -> Result<usize> {
        let value = self.ledger.export(kind)?;
        let count = value.as_array().map_or(0, Vec::len);
        let path = kind.remote_path(self.branch());

        self.store.put(&path, &value).await?;
        self.mark_synced();
        tracing::info!(collection = %kind, path = %path, count, "Saved collection to remote store");
        Ok(count)
    }

    /// Push triggered by local changes. Never runs against the test branch or
    /// without a signed-in session; failures are only logged.
    pub async fn auto_push(&self, kind: CollectionKind) {
        if self.branch() == Branch::Test {
            tracing::debug!(collection = %kind, "Test branch, skipping automatic push");
            return;
        }
        if !self.is_authenticated() {
            tracing::debug!(collection = %kind, "Not signed in, skipping automatic push");
            return;
        }
        if let Err(e) = self.save_to_cloud(kind).await {
            tracing::error!(
                collection = %kind,
                error = %e,
                hint = %hint_for(&e).unwrap_or_default(),
                "Automatic push failed"
            );
        }
    }

    async fn replace_typed<T: Stored>(&self) -> Result<usize> {
        let records = self.fetch_collection::<T>().await?;
        if records.is_empty() {
            tracing::info!(collection = %T::KIND, "Remote collection is empty, keeping local data");
            return Ok(0);
        }
        let count = self.ledger.replace(records)?;
        self.mark_synced();
        tracing::info!(collection = %T::KIND, count, "Replaced local collection from remote store");
        Ok(count)
    }

    /// Replace the local collection with the remote one. An empty remote
    /// collection leaves local data alone.
    pub async fn replace_from_cloud(&self, kind: CollectionKind) -> Result<usize> {
        match kind {
            CollectionKind::Income => self.replace_typed::<IncomeRecord>().await,
            CollectionKind::Bookings => self.replace_typed::<Booking>().await,
            CollectionKind::Prices => self.replace_typed::<PriceEntry>().await,
            CollectionKind::Users => self.replace_typed::<User>().await,
        }
    }

    pub async fn probe(&self) -> ProbeOutcome {
        self.store.probe().await
    }
}
