//! Price list entries.

use crate::format::format_currency;
use crate::record::{lenient_text, null_as_empty, Record};
use crate::{error::Result, Error, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the price list. `price` is free text and stored as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub work_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub car_brand: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub price: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceEntry {
    /// Display form: formatted when numeric, raw text otherwise.
    pub fn formatted_price(&self) -> String {
        format_currency(&self.price, true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceDraft {
    pub work_type: String,
    pub car_brand: String,
    #[serde(deserialize_with = "lenient_text")]
    pub price: String,
    pub comment: String,
}

impl PriceDraft {
    fn normalized(self) -> Result<Self> {
        if self.work_type.trim().is_empty() {
            return Err(Error::MissingRequiredField("workType"));
        }
        Ok(Self {
            price: self.price.trim().to_string(),
            comment: self.comment.trim().to_string(),
            ..self
        })
    }
}

impl Record for PriceEntry {
    type Draft = PriceDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: RecordId, draft: PriceDraft, now: DateTime<Utc>) -> Result<Self> {
        let draft = draft.normalized()?;
        Ok(Self {
            id,
            work_type: draft.work_type,
            car_brand: draft.car_brand,
            price: draft.price,
            comment: draft.comment,
            created_at: now,
            updated_at: None,
        })
    }

    fn apply(&mut self, draft: PriceDraft, now: DateTime<Utc>) -> Result<()> {
        let draft = draft.normalized()?;
        self.work_type = draft.work_type;
        self.car_brand = draft.car_brand;
        self.price = draft.price;
        self.comment = draft.comment;
        self.updated_at = Some(now);
        Ok(())
    }
}
