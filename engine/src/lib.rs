//! # Autobook Engine
//!
//! Bookkeeping core for a small automotive repair shop.
//!
//! This crate holds the domain types and the pure logic behind them: income
//! records, bookings, the price list and users, the rules for entering them,
//! and the strategy used to reconcile the local copy with a remote document
//! store. It has no IO: the server crate owns files, network and time.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, network, or platform
//! - **Deterministic**: The current time and any entropy are passed in
//! - **Testable**: Pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! Every collection item implements [`Record`]: it has a string id and is
//! created and updated from a draft type that carries user input. Drafts are
//! validated before anything is written; see [`IncomeDraft`] for the share
//! rules of income records.
//!
//! ### Branches
//!
//! The remote store is split into a production branch, a test branch used by
//! local development, and a backup branch. [`Environment::primary_branch`]
//! picks one from the hostname the app is served under.
//!
//! ### Reconciliation
//!
//! [`merge_by_presence`] merges a remote snapshot into the local collection:
//! remote records win, local records the remote does not know are kept.
//!
//! ### Client matching
//!
//! Income records and bookings are linked by [`is_same_client`], a loose
//! comparison of client name and phone.
//!
//! ## Quick Start
//!
//! ```rust
//! use autobook_engine::{merge_by_presence, Collection, PriceDraft, PriceEntry};
//! use chrono::{TimeZone, Utc};
//!
//! let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
//!
//! let mut local: Collection<PriceEntry> = Collection::new();
//! local
//!     .create(
//!         "local-1".to_string(),
//!         PriceDraft {
//!             work_type: "diagnostics".into(),
//!             price: "40".into(),
//!             ..Default::default()
//!         },
//!         now,
//!     )
//!     .unwrap();
//!
//! let merged = merge_by_presence(local.into_vec(), Vec::new());
//! assert_eq!(merged.records.len(), 1);
//! assert_eq!(merged.records[0].formatted_price(), "40 BYN");
//! ```

pub mod booking;
pub mod branch;
pub mod catalog;
pub mod client;
pub mod clock;
pub mod collection;
pub mod error;
pub mod export;
pub mod format;
pub mod income;
pub mod payload;
pub mod price;
pub mod reconcile;
pub mod record;
pub mod schedule;
pub mod snapshot;
pub mod user;

// Re-export main types at crate root
pub use booking::{Booking, BookingDraft, BookingStatus};
pub use branch::{Branch, CollectionKind, Environment};
pub use client::{
    find_matching_bookings, find_matching_records, is_same_client, ClientDescriptor, Matches,
};
pub use collection::Collection;
pub use error::{Error, Result};
pub use export::{ReportTable, TableOptions};
pub use format::{format_amount, format_currency, parse_currency};
pub use income::{ClientInfo, IncomeDraft, IncomeRecord};
pub use payload::{decode_collection, decode_records};
pub use price::{PriceDraft, PriceEntry};
pub use reconcile::{merge_by_presence, MergeReport, Merged};
pub use record::{Numeric, Record};
pub use schedule::{BackupPolicy, DueReason};
pub use snapshot::{backup_keys, BackupSnapshot, LATEST_KEY};
pub use user::{authenticate, Principal, Role, User, UserDraft};

/// Record identifiers are opaque strings.
pub type RecordId = String;
