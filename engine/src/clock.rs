//! Time helpers and locally generated identifiers.
//!
//! The engine never reads the system clock. Callers pass `now` in, which keeps
//! every function here deterministic and testable.

use crate::RecordId;
use chrono::{DateTime, SecondsFormat, Utc};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode an integer in lowercase base36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate a record id: base36 epoch millis followed by a base36 random suffix.
///
/// Ids sort roughly by creation time and are unique in practice on a single
/// device as long as `entropy` is random.
pub fn new_record_id(now: DateTime<Utc>, entropy: u64) -> RecordId {
    let millis = now.timestamp_millis().max(0) as u64;
    format!("{}{}", to_base36(millis), to_base36(entropy))
}

/// Generate a user id (`u` + epoch millis + short suffix).
pub fn new_user_id(now: DateTime<Utc>, entropy: u64) -> RecordId {
    format!(
        "u{}{}",
        now.timestamp_millis().max(0),
        to_base36(entropy % 36u64.pow(4))
    )
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar date key (`YYYY-MM-DD`, UTC) used to name daily snapshots.
pub fn date_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}
