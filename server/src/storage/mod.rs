//! Local persistence: the key-value store and the typed ledger over it.

mod kv;
mod ledger;

pub use kv::{PersistedStore, StorageError};
pub use ledger::{ChangeReceiver, Ledger, Stored};
