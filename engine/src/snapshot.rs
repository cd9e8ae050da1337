//! Backup snapshots of the production branch.
//!
//! A snapshot is a timestamped copy of the whole `MASTER` subtree, stored
//! under the `BACKUP` branch keyed by calendar date, with the most recent one
//! duplicated under `latest`.

use crate::branch::CollectionKind;
use crate::clock::{date_key, iso_timestamp};
use crate::payload::decode_records;
use crate::{error::Result, Error};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alias key that always holds the most recent snapshot.
pub const LATEST_KEY: &str = "latest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    /// ISO-8601 time the snapshot was taken
    pub timestamp: String,
    /// The full production subtree
    pub data: Value,
}

impl BackupSnapshot {
    /// Wrap a production subtree. Returns `None` when there is nothing to
    /// snapshot.
    pub fn capture(data: Value, now: DateTime<Utc>) -> Option<Self> {
        let empty = match &data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            return None;
        }
        Some(Self {
            timestamp: iso_timestamp(now),
            data,
        })
    }

    /// Dated key the snapshot is stored under.
    pub fn key_for(now: DateTime<Utc>) -> String {
        date_key(now)
    }

    /// Validate a snapshot read back from the remote store.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidSnapshot("snapshot is not an object".into()));
        };
        let data = match map.remove("data") {
            Some(Value::Null) | None => {
                return Err(Error::InvalidSnapshot("missing data field".into()))
            }
            Some(data) => data,
        };
        let timestamp = match map.remove("timestamp") {
            Some(Value::String(ts)) => ts,
            _ => String::new(),
        };
        Ok(Self { timestamp, data })
    }

    /// Raw value of one collection inside the snapshot, if present.
    pub fn collection_value(&self, kind: CollectionKind) -> Option<&Value> {
        self.data.get(kind.remote_key()).filter(|v| !v.is_null())
    }

    /// Decode one collection of the snapshot into records.
    pub fn collection<T: DeserializeOwned>(&self, kind: CollectionKind) -> Option<Result<Vec<T>>> {
        self.collection_value(kind)
            .map(|value| decode_records(value.clone()))
    }
}

/// Turn a shallow listing of the backup branch into restorable date keys,
/// most recent first, without the `latest` alias.
pub fn backup_keys(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.into_iter().filter(|k| k != LATEST_KEY).collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));
    keys
}
