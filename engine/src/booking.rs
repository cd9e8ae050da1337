//! Customer service bookings.

use crate::income::{ClientInfo, IncomeDraft};
use crate::record::{null_as_empty, Record};
use crate::{error::Result, Error, RecordId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    NotDone,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::InProgress,
        BookingStatus::Done,
        BookingStatus::NotDone,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Done => "done",
            BookingStatus::NotDone => "not-done",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub client_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub client_phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub car_brand: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Prefill a new income entry from a finished booking.
    ///
    /// The draft is a copy; the booking keeps no link to the income record
    /// created from it. Returns `None` unless the booking is `done`.
    pub fn income_template(&self) -> Option<IncomeDraft> {
        if self.status != BookingStatus::Done {
            return None;
        }
        Some(IncomeDraft {
            date: Some(self.date),
            car_brand: self.car_brand.clone(),
            comment: self.description.clone(),
            client: ClientInfo {
                name: self.client_name.clone(),
                phone: self.client_phone.clone(),
            },
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingDraft {
    pub client_name: String,
    pub client_phone: String,
    pub car_brand: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub description: String,
    pub status: Option<BookingStatus>,
}

impl BookingDraft {
    fn validated_date(&self) -> Result<NaiveDate> {
        if self.client_name.trim().is_empty() && self.client_phone.trim().is_empty() {
            return Err(Error::MissingRequiredField("clientName"));
        }
        self.date.ok_or(Error::MissingRequiredField("date"))
    }
}

impl Record for Booking {
    type Draft = BookingDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: RecordId, draft: BookingDraft, now: DateTime<Utc>) -> Result<Self> {
        let date = draft.validated_date()?;
        Ok(Self {
            id,
            client_name: draft.client_name,
            client_phone: draft.client_phone,
            car_brand: draft.car_brand,
            date,
            time: draft.time.filter(|t| !t.is_empty()),
            description: draft.description,
            status: draft.status.unwrap_or_default(),
            created_at: now,
            updated_at: None,
        })
    }

    fn apply(&mut self, draft: BookingDraft, now: DateTime<Utc>) -> Result<()> {
        self.date = draft.validated_date()?;
        self.client_name = draft.client_name;
        self.client_phone = draft.client_phone;
        self.car_brand = draft.car_brand;
        self.time = draft.time.filter(|t| !t.is_empty());
        self.description = draft.description;
        if let Some(status) = draft.status {
            self.status = status;
        }
        self.updated_at = Some(now);
        Ok(())
    }
}
