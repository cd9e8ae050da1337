//! Reconciliation of a local collection with a remote snapshot.
//!
//! Last-writer-wins by presence: the remote snapshot is authoritative for
//! every id it contains, and local records it does not know about are kept.
//!
//! # Algorithm
//!
//! 1. If the remote snapshot is empty, keep the local collection as is
//! 2. Collect the ids present in the remote snapshot
//! 3. Keep local records whose id is absent remotely, in local order
//! 4. Result = remote records (remote order) followed by the kept local ones
//!
//! Field-level conflicts are not detected. When the same id exists on both
//! sides with different content the remote version wins and the local edit
//! is lost. Nothing is ever deleted on either side by a merge.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a merge did, for logging and status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Records taken from the remote snapshot
    pub remote: usize,
    /// Local records kept because the remote snapshot lacked their id
    pub kept_local: usize,
    /// Local records superseded by a remote record with the same id
    pub replaced_local: usize,
    /// Of `replaced_local`, how many differed from their remote version
    pub overwritten: usize,
}

impl MergeReport {
    /// True when the merge left the local collection untouched.
    pub fn is_noop(&self) -> bool {
        self.remote == 0
    }
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    pub records: Vec<T>,
    pub report: MergeReport,
}

/// Merge a remote snapshot into the current local records.
///
/// `local` must be read when the merge runs, not when the remote fetch
/// started, so edits made while the request was in flight survive.
pub fn merge_by_presence<T: Record + PartialEq>(local: Vec<T>, remote: Vec<T>) -> Merged<T> {
    if remote.is_empty() {
        let kept_local = local.len();
        return Merged {
            records: local,
            report: MergeReport {
                kept_local,
                ..MergeReport::default()
            },
        };
    }

    let mut report = MergeReport {
        remote: remote.len(),
        ..MergeReport::default()
    };

    let remote_ids: HashSet<&str> = remote.iter().map(|r| r.id()).collect();
    let mut local_only = Vec::new();
    for record in local {
        if remote_ids.contains(record.id()) {
            report.replaced_local += 1;
            if !remote.iter().any(|r| r == &record) {
                report.overwritten += 1;
            }
        } else {
            local_only.push(record);
        }
    }
    report.kept_local = local_only.len();

    let mut records = remote;
    records.extend(local_only);

    Merged { records, report }
}
