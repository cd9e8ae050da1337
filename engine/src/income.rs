//! Income records: what was earned, for which job, and who did the work.

use crate::record::{lenient_f64, lenient_shares, null_as_empty, Numeric, Record};
use crate::{error::Result, Error, RecordId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Client contact details attached to an income record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
}

/// A single income entry.
///
/// With more than one executor, `shares` holds exactly the executor ids and
/// the shares add up to `amount`. This is enforced when the record is entered
/// and not re-checked for records received from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub work_type: String,
    #[serde(default)]
    pub executors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_shares")]
    pub shares: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub car_brand: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vin: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comment: String,
    #[serde(default)]
    pub client: ClientInfo,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IncomeRecord {
    /// Amount attributed to one executor.
    ///
    /// Uses the recorded share when there is one. Records entered before shares
    /// existed split the amount equally between the listed executors.
    pub fn share_of(&self, executor_id: &str) -> f64 {
        if let Some(share) = self.shares.get(executor_id) {
            return *share;
        }
        if self.executors.iter().any(|e| e == executor_id) {
            return self.amount / self.executors.len() as f64;
        }
        0.0
    }
}

/// User input for creating or updating an income record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeDraft {
    pub amount: Option<Numeric>,
    pub date: Option<NaiveDate>,
    pub work_type: String,
    pub executors: Vec<String>,
    pub shares: BTreeMap<String, Numeric>,
    pub car_brand: String,
    pub vin: String,
    pub comment: String,
    pub client: ClientInfo,
}

/// The normalized money part of a draft.
#[derive(Debug, Clone, PartialEq)]
struct Split {
    amount: f64,
    shares: BTreeMap<String, f64>,
}

impl IncomeDraft {
    fn split(&self) -> Result<Split> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = self.executors.iter().find(|e| !seen.insert(*e)) {
            return Err(Error::DuplicateExecutor(dup.clone()));
        }

        match self.executors.len() {
            0 => Err(Error::MissingRequiredField("executors")),
            1 => {
                let amount = self
                    .amount
                    .as_ref()
                    .ok_or(Error::MissingRequiredField("amount"))?;
                let value = amount
                    .value()
                    .filter(|v| *v > 0.0)
                    .ok_or_else(|| Error::InvalidAmount(amount.raw()))?;
                let shares = BTreeMap::from([(self.executors[0].clone(), value)]);
                Ok(Split {
                    amount: value,
                    shares,
                })
            }
            _ => {
                let expected: BTreeSet<&String> = self.executors.iter().collect();
                let got: BTreeSet<&String> = self.shares.keys().collect();
                if expected != got {
                    return Err(Error::SharesMismatch {
                        expected: expected.into_iter().cloned().collect(),
                        got: got.into_iter().cloned().collect(),
                    });
                }

                let mut shares = BTreeMap::new();
                for (executor, raw) in &self.shares {
                    let value = match raw {
                        Numeric::Text(s) if s.trim().is_empty() => 0.0,
                        other => other.value().filter(|v| *v >= 0.0).ok_or_else(|| {
                            Error::InvalidShare {
                                executor: executor.clone(),
                                value: other.raw(),
                            }
                        })?,
                    };
                    shares.insert(executor.clone(), value);
                }

                let amount: f64 = shares.values().sum();
                if amount <= 0.0 {
                    return Err(Error::InvalidAmount(amount.to_string()));
                }
                Ok(Split { amount, shares })
            }
        }
    }

    fn validated(&self) -> Result<(NaiveDate, Split)> {
        let date = self.date.ok_or(Error::MissingRequiredField("date"))?;
        if self.work_type.trim().is_empty() {
            return Err(Error::MissingRequiredField("workType"));
        }
        Ok((date, self.split()?))
    }
}

impl Record for IncomeRecord {
    type Draft = IncomeDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: RecordId, draft: IncomeDraft, now: DateTime<Utc>) -> Result<Self> {
        let (date, split) = draft.validated()?;
        Ok(Self {
            id,
            amount: split.amount,
            date,
            work_type: draft.work_type,
            executors: draft.executors,
            shares: split.shares,
            car_brand: draft.car_brand,
            vin: draft.vin,
            comment: draft.comment,
            client: draft.client,
            created_at: now,
            updated_at: None,
        })
    }

    fn apply(&mut self, draft: IncomeDraft, now: DateTime<Utc>) -> Result<()> {
        let (date, split) = draft.validated()?;
        self.amount = split.amount;
        self.date = date;
        self.work_type = draft.work_type;
        self.executors = draft.executors;
        self.shares = split.shares;
        self.car_brand = draft.car_brand;
        self.vin = draft.vin;
        self.comment = draft.comment;
        self.client = draft.client;
        self.updated_at = Some(now);
        Ok(())
    }
}
