//! Artisan Stock Watcher
//!
//! Polls a fixed catalog of mousepad variants on the retailer's endpoint and
//! posts a webhook message whenever a variant is seen for the first time or
//! flips between in stock and sold out.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Watcher Loop                       │
//! │  (load snapshot → catalog pass → save → sleep)       │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//! ┌─────────────────┐ ┌──────────┐ ┌─────────────────┐
//! │  VariantSource  │ │ detect() │ │    Notifier     │
//! │  - fetch()      │ │          │ │  - notify()     │
//! └────────┬────────┘ └────┬─────┘ └─────────────────┘
//!          │               │
//!          ▼               ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │    RateFeed     │ │  SnapshotStore  │
//! │  - convert()    │ │  - load/save    │
//! └─────────────────┘ └─────────────────┘
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod exchange_rate;
pub mod fetcher;
pub mod models;
pub mod snapshot;
pub mod watcher;
pub mod webhook;

// Re-export commonly used types
pub use config::Catalog;
pub use detector::{detect, Change};
pub use error::{Result, WatchError};
pub use exchange_rate::{CurrencyApiFeed, FixedRateFeed, RateFeed};
pub use fetcher::{ArtisanClient, MockVariantSource, VariantSource};
pub use models::{ProductRecord, Variant};
pub use snapshot::{Snapshot, SnapshotStore};
pub use watcher::{CycleReport, Watcher};
pub use webhook::{Notifier, RecordingNotifier, WebhookClient};

/// Version of the watcher
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the package
pub const NAME: &str = env!("CARGO_PKG_NAME");
