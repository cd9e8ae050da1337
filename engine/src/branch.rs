//! Remote addressing: branches, collections and the environment that picks
//! between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An isolated namespace inside the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Branch {
    /// Production data.
    Master,
    /// Data written while developing on a local machine.
    Test,
    /// Daily snapshots of `Master`.
    Backup,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::Master, Branch::Test, Branch::Backup];

    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Master => "MASTER",
            Branch::Test => "TEST",
            Branch::Backup => "BACKUP",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Income,
    Bookings,
    Prices,
    Users,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Income,
        CollectionKind::Bookings,
        CollectionKind::Prices,
        CollectionKind::Users,
    ];

    /// Collections merged from the remote store when a session starts.
    /// Users are only ever loaded explicitly.
    pub const RECORDS: [CollectionKind; 3] = [
        CollectionKind::Income,
        CollectionKind::Bookings,
        CollectionKind::Prices,
    ];

    /// Key of the collection under its branch in the remote store.
    pub fn remote_key(&self) -> &'static str {
        match self {
            CollectionKind::Income => "Income",
            CollectionKind::Bookings => "Bookings",
            CollectionKind::Prices => "Prices",
            CollectionKind::Users => "Users",
        }
    }

    /// Key of the collection in the local persisted store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKind::Income => "autoservice-income-records",
            CollectionKind::Bookings => "autoservice-bookings",
            CollectionKind::Prices => "autoservice-prices",
            CollectionKind::Users => "autoservice-users",
        }
    }

    /// Path of the collection in the remote store, e.g. `MASTER/Income`.
    pub fn remote_path(&self, branch: Branch) -> String {
        format!("{}/{}", branch, self.remote_key())
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_key())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    /// Accepts both the remote key (`Income`) and the lowercase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|k| k.remote_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// Description of where the application is running.
///
/// This is the only environment sensing in the system: serving from a
/// loopback hostname selects the `Test` branch so development never touches
/// production data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub hostname: String,
}

impl Environment {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.hostname.as_str(), "localhost" | "127.0.0.1")
    }

    /// Branch holding the live collections for this environment.
    pub fn primary_branch(&self) -> Branch {
        if self.is_local() {
            Branch::Test
        } else {
            Branch::Master
        }
    }
}
