//! Typed access to the four collections.
//!
//! Every mutation is a read-modify-write under one lock, writes through to
//! the persisted store and announces the collection on the change channel
//! that drives automatic pushes.

use std::sync::{Arc, Mutex, MutexGuard};

use autobook_engine::clock::{new_record_id, new_user_id};
use autobook_engine::user::ensure_unique_username;
use autobook_engine::{
    merge_by_presence, Booking, Collection, CollectionKind, Error as EngineError, IncomeRecord,
    MergeReport, PriceEntry, Record, User, UserDraft,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use super::kv::{PersistedStore, StorageError};
use crate::error::Result;

/// Receiving end of the change channel.
pub type ChangeReceiver = mpsc::UnboundedReceiver<CollectionKind>;

/// A record type kept in the ledger.
pub trait Stored: Record + PartialEq + Send + 'static {
    const KIND: CollectionKind;
}

impl Stored for IncomeRecord {
    const KIND: CollectionKind = CollectionKind::Income;
}

impl Stored for Booking {
    const KIND: CollectionKind = CollectionKind::Bookings;
}

impl Stored for PriceEntry {
    const KIND: CollectionKind = CollectionKind::Prices;
}

impl Stored for User {
    const KIND: CollectionKind = CollectionKind::Users;
}

pub struct Ledger {
    store: Arc<PersistedStore>,
    lock: Mutex<()>,
    changes: mpsc::UnboundedSender<CollectionKind>,
}

impl Ledger {
    /// Open the ledger and seed the default administrator when there are no
    /// users yet.
    pub fn new(store: Arc<PersistedStore>) -> std::result::Result<(Self, ChangeReceiver), StorageError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let ledger = Self {
            store,
            lock: Mutex::new(()),
            changes: tx,
        };

        let stored: Collection<User> = ledger.store.get_or_default(User::KIND.storage_key());
        if stored.is_empty() {
            tracing::info!("No users found, creating default administrator");
            ledger.write(&Collection::from_vec(vec![User::default_admin()]))?;
        }

        Ok((ledger, rx))
    }

    pub fn store(&self) -> &Arc<PersistedStore> {
        &self.store
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T: Stored>(&self) -> Collection<T> {
        let collection: Collection<T> = self.store.get_or_default(T::KIND.storage_key());
        if T::KIND == CollectionKind::Users && collection.is_empty() {
            return self.seeded_users::<T>();
        }
        collection
    }

    // The user list is never observed empty.
    fn seeded_users<T: Stored>(&self) -> Collection<T> {
        serde_json::to_value(vec![User::default_admin()])
            .and_then(serde_json::from_value)
            .unwrap_or_default()
    }

    fn write<T: Stored>(&self, collection: &Collection<T>) -> std::result::Result<(), StorageError> {
        self.store.set(T::KIND.storage_key(), collection)
    }

    fn notify(&self, kind: CollectionKind) {
        if self.changes.send(kind).is_err() {
            tracing::trace!(collection = %kind, "No change listener");
        }
    }

    fn mutate<T: Stored, R>(
        &self,
        f: impl FnOnce(&mut Collection<T>) -> Result<R>,
    ) -> Result<R> {
        let guard = self.guard();
        let mut collection = self.read::<T>();
        let out = f(&mut collection)?;
        self.write(&collection)?;
        drop(guard);

        self.notify(T::KIND);
        Ok(out)
    }

    fn next_id<T: Stored>(collection: &Collection<T>, now: DateTime<Utc>) -> String {
        loop {
            let entropy = rand::random::<u64>();
            let id = match T::KIND {
                CollectionKind::Users => new_user_id(now, entropy),
                _ => new_record_id(now, entropy),
            };
            if !collection.contains(&id) {
                return id;
            }
        }
    }

    pub fn list<T: Stored>(&self) -> Vec<T> {
        self.read::<T>().into_vec()
    }

    pub fn get<T: Stored>(&self, id: &str) -> Option<T> {
        self.read::<T>().get(id).cloned()
    }

    pub fn create<T: Stored>(&self, draft: T::Draft, now: DateTime<Utc>) -> Result<T> {
        self.mutate(|collection: &mut Collection<T>| {
            let id = Self::next_id(collection, now);
            Ok(collection.create(id, draft, now)?.clone())
        })
    }

    pub fn update<T: Stored>(&self, id: &str, draft: T::Draft, now: DateTime<Utc>) -> Result<T> {
        self.mutate(|collection: &mut Collection<T>| Ok(collection.update(id, draft, now)?.clone()))
    }

    pub fn delete<T: Stored>(&self, id: &str) -> Result<T> {
        self.mutate(|collection: &mut Collection<T>| {
            if T::KIND == CollectionKind::Users && collection.len() == 1 && collection.contains(id)
            {
                return Err(EngineError::LastUser.into());
            }
            Ok(collection.delete(id)?)
        })
    }

    pub fn create_user(&self, draft: UserDraft, now: DateTime<Utc>) -> Result<User> {
        self.mutate(|users: &mut Collection<User>| {
            ensure_unique_username(users.iter(), &draft.username, None)?;
            let id = Self::next_id(users, now);
            Ok(users.create(id, draft, now)?.clone())
        })
    }

    pub fn update_user(&self, id: &str, draft: UserDraft, now: DateTime<Utc>) -> Result<User> {
        self.mutate(|users: &mut Collection<User>| {
            ensure_unique_username(users.iter(), &draft.username, Some(id))?;
            Ok(users.update(id, draft, now)?.clone())
        })
    }

    /// Merge a remote snapshot into the collection as it is now.
    ///
    /// When local-only records survive the merge the collection is announced
    /// so the union gets pushed back.
    pub fn merge_remote<T: Stored>(&self, remote: Vec<T>) -> Result<MergeReport> {
        let guard = self.guard();
        let local = self.read::<T>().into_vec();
        let merged = merge_by_presence(local, remote);
        if !merged.report.is_noop() {
            self.write(&Collection::from_vec(merged.records))?;
        }
        drop(guard);

        if !merged.report.is_noop() && merged.report.kept_local > 0 {
            self.notify(T::KIND);
        }
        Ok(merged.report)
    }

    /// Replace the whole collection. Not announced: the data came from the
    /// remote store.
    pub fn replace<T: Stored>(&self, items: Vec<T>) -> Result<usize> {
        let _guard = self.guard();
        let count = items.len();
        self.write(&Collection::from_vec(items))?;
        Ok(count)
    }

    /// Replace the whole collection with records restored from a backup.
    /// Announced like a local edit, so the restored data reaches production.
    pub fn restore<T: Stored>(&self, items: Vec<T>) -> Result<usize> {
        let count = self.replace(items)?;
        self.notify(T::KIND);
        Ok(count)
    }

    /// The collection as the JSON array pushed to the remote store.
    pub fn export(&self, kind: CollectionKind) -> Result<Value> {
        let value = match kind {
            CollectionKind::Income => serde_json::to_value(self.read::<IncomeRecord>()),
            CollectionKind::Bookings => serde_json::to_value(self.read::<Booking>()),
            CollectionKind::Prices => serde_json::to_value(self.read::<PriceEntry>()),
            CollectionKind::Users => serde_json::to_value(self.read::<User>()),
        };
        Ok(value.map_err(StorageError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use autobook_engine::{PriceDraft, Role};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn open(dir: &tempfile::TempDir) -> (Ledger, ChangeReceiver) {
        let store = Arc::new(PersistedStore::open(dir.path()).unwrap());
        Ledger::new(store).unwrap()
    }

    fn price(value: &str) -> PriceDraft {
        PriceDraft {
            work_type: "brakes".into(),
            price: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn seeds_default_admin() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, _rx) = open(&dir);
        let users = ledger.list::<User>();
        assert_eq!(users, vec![User::default_admin()]);
        assert!(dir.path().join("autoservice-users.json").exists());
    }

    #[test]
    fn last_user_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, _rx) = open(&dir);
        let err = ledger.delete::<User>("u1").unwrap_err();
        assert!(matches!(err, AppError::Engine(EngineError::LastUser)));

        let second = ledger
            .create_user(
                UserDraft {
                    username: "oleg".into(),
                    password: "pw".into(),
                    role: Role::Employee,
                    full_name: String::new(),
                },
                now(),
            )
            .unwrap();
        assert!(second.id.starts_with('u'));
        ledger.delete::<User>("u1").unwrap();
        assert!(ledger.delete::<User>(&second.id).is_err());
    }

    #[test]
    fn usernames_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, _rx) = open(&dir);
        let err = ledger
            .create_user(
                UserDraft {
                    username: "ADMIN".into(),
                    password: "x".into(),
                    ..Default::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(EngineError::DuplicateUsername(_))
        ));

        // Renaming a user to its own name is fine.
        ledger
            .update_user(
                "u1",
                UserDraft {
                    username: "admin".into(),
                    password: "new".into(),
                    role: Role::Admin,
                    full_name: "Boss".into(),
                },
                now(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn mutations_write_through_and_notify() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, mut rx) = open(&dir);

        let created = ledger.create::<PriceEntry>(price("100"), now()).unwrap();
        assert_eq!(rx.recv().await, Some(CollectionKind::Prices));

        let (reopened, _rx) = open(&dir);
        assert_eq!(reopened.get::<PriceEntry>(&created.id), Some(created.clone()));

        ledger.update::<PriceEntry>(&created.id, price("120"), now()).unwrap();
        ledger.delete::<PriceEntry>(&created.id).unwrap();
        assert_eq!(rx.recv().await, Some(CollectionKind::Prices));
        assert_eq!(rx.recv().await, Some(CollectionKind::Prices));
        assert!(ledger.list::<PriceEntry>().is_empty());
    }

    #[test]
    fn failed_validation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, mut rx) = open(&dir);
        assert!(ledger.create::<PriceEntry>(PriceDraft::default(), now()).is_err());
        assert!(rx.try_recv().is_err());
        assert!(!dir.path().join("autoservice-prices.json").exists());
    }

    #[test]
    fn malformed_collection_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("autoservice-bookings.json"), b"[{\"id\": 1}").unwrap();
        let (ledger, _rx) = open(&dir);
        assert!(ledger.list::<Booking>().is_empty());
    }

    #[test]
    fn merge_keeps_local_only_and_announces() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, mut rx) = open(&dir);
        let local = ledger.create::<PriceEntry>(price("1"), now()).unwrap();
        rx.try_recv().unwrap();

        let remote = PriceEntry::create("remote".into(), price("2"), now()).unwrap();
        let report = ledger.merge_remote(vec![remote]).unwrap();
        assert_eq!(report.kept_local, 1);
        assert_eq!(rx.try_recv().unwrap(), CollectionKind::Prices);

        let ids: Vec<String> = ledger
            .list::<PriceEntry>()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["remote".to_string(), local.id]);

        let empty = ledger.merge_remote::<PriceEntry>(Vec::new()).unwrap();
        assert!(empty.is_noop());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn export_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, _rx) = open(&dir);
        assert_eq!(ledger.export(CollectionKind::Income).unwrap(), Value::Array(vec![]));
        let users = ledger.export(CollectionKind::Users).unwrap();
        assert_eq!(users[0]["username"], "admin");
    }
}
