//! The common shape of every stored record.

use crate::{error::Result, RecordId};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// A record that lives in one of the synchronized collections.
///
/// Records are created from a draft, get their `id` and creation time assigned
/// exactly once, and are later updated in place from a new draft.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Input accepted for create and update.
    type Draft;

    /// Unique identifier within the collection. Immutable once assigned.
    fn id(&self) -> &str;

    /// Build a new record from a validated draft.
    fn create(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self>;

    /// Replace the mutable fields from a draft, keeping id and creation time.
    fn apply(&mut self, draft: Self::Draft, now: DateTime<Utc>) -> Result<()>;
}

/// Accept a number either as a JSON number or as a numeric string.
///
/// Form input produces strings such as `"30"`; older remote data carries
/// plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Parse the value, accepting `,` as the decimal separator.
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => n.is_finite().then_some(*n),
            Numeric::Text(s) => {
                let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                cleaned
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
            }
        }
    }

    pub fn raw(&self) -> String {
        match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Numeric::Number(n)
    }
}

impl From<&str> for Numeric {
    fn from(s: &str) -> Self {
        Numeric::Text(s.to_string())
    }
}

/// Deserialize an `f64` that may have been stored as a numeric string.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Numeric::deserialize(deserializer)?;
    raw.value()
        .ok_or_else(|| serde::de::Error::custom(format!("not a number: {}", raw.raw())))
}

/// Deserialize a map of numbers that may have been stored as strings.
pub(crate) fn lenient_shares<'de, D>(
    deserializer: D,
) -> std::result::Result<std::collections::BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<std::collections::BTreeMap<String, Numeric>> =
        Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let n = v.value().unwrap_or(0.0);
            (k, n)
        })
        .collect())
}

/// Deserialize a string field that may be `null` in stored data.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize text that older data may have stored as a bare number.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Numeric>::deserialize(deserializer)?
        .map(|n| n.raw())
        .unwrap_or_default())
}
