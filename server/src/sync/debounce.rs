//! Debounced automatic pushes.
//!
//! Every collection gets a worker. Changes wake the worker, which waits until
//! the collection has been quiet for the debounce delay and then pushes once.
//! Changes arriving while a push is in flight leave a stored permit behind, so
//! they are followed by exactly one more push.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use autobook_engine::CollectionKind;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::SyncEngine;
use crate::remote::DocumentStore;
use crate::storage::ChangeReceiver;

pub struct PushScheduler {
    router: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl PushScheduler {
    /// Start one worker per collection and route `changes` to them.
    pub fn spawn<S: DocumentStore>(
        engine: Arc<SyncEngine<S>>,
        mut changes: ChangeReceiver,
        delay: Duration,
    ) -> Self {
        let mut signals = BTreeMap::new();
        let mut workers = Vec::with_capacity(CollectionKind::ALL.len());

        for kind in CollectionKind::ALL {
            let signal = Arc::new(Notify::new());
            signals.insert(kind, signal.clone());
            workers.push(tokio::spawn(worker(engine.clone(), kind, signal, delay)));
        }

        let router = tokio::spawn(async move {
            while let Some(kind) = changes.recv().await {
                tracing::trace!(collection = %kind, "Local change");
                if let Some(signal) = signals.get(&kind) {
                    signal.notify_one();
                }
            }
            tracing::debug!("Change channel closed, push router stopping");
        });

        Self { router, workers }
    }

    pub fn shutdown(self) {
        self.router.abort();
        for worker in self.workers {
            worker.abort();
        }
    }
}

async fn worker<S: DocumentStore>(
    engine: Arc<SyncEngine<S>>,
    kind: CollectionKind,
    signal: Arc<Notify>,
    delay: Duration,
) {
    loop {
        signal.notified().await;

        // Trailing edge: restart the timer on every further change.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => break,
                _ = signal.notified() => continue,
            }
        }

        tracing::debug!(collection = %kind, "Pushing after local changes");
        engine.auto_push(kind).await;
    }
}
