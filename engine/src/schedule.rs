//! Daily backup scheduling policy.
//!
//! The scheduler is cooperative: something re-evaluates the policy at start
//! and then periodically. A missed slot (process not running at the target
//! hour) is caught up by the age rule on the next evaluation.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::Serialize;

/// Why a backup is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DueReason {
    /// No backup was ever recorded
    NeverRun,
    /// The last backup is older than the maximum age
    Stale,
    /// It is the target hour and today's slot has not run yet
    ScheduledHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Local hour (0..=23) at which the daily backup should run.
    pub target_hour: u32,
    /// Maximum age of the last backup before one is forced.
    pub max_age: Duration,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            target_hour: 1,
            max_age: Duration::hours(24),
        }
    }
}

impl BackupPolicy {
    pub fn with_target_hour(target_hour: u32) -> Self {
        Self {
            target_hour,
            ..Self::default()
        }
    }

    /// Evaluate the policy. `now` carries the local time zone the target
    /// hour refers to.
    pub fn due_reason<Tz: TimeZone>(
        &self,
        last: Option<DateTime<Utc>>,
        now: &DateTime<Tz>,
    ) -> Option<DueReason> {
        let Some(last) = last else {
            return Some(DueReason::NeverRun);
        };

        if now.with_timezone(&Utc) - last >= self.max_age {
            return Some(DueReason::Stale);
        }

        if now.hour() == self.target_hour {
            let slot = now
                .date_naive()
                .and_hms_opt(self.target_hour, 0, 0)
                .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest());
            if let Some(slot) = slot {
                if last < slot.with_timezone(&Utc) {
                    return Some(DueReason::ScheduledHour);
                }
            }
        }

        None
    }

    pub fn is_due<Tz: TimeZone>(&self, last: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
        self.due_reason(last, now).is_some()
    }
}
