//! detector.rs - Decides whether a fresh record is worth a notification
//!
//! Only first sightings and in-stock flips count. Price, name or hardness
//! drift on an otherwise unchanged variant is ignored and the stored record
//! is kept as-is.

use std::fmt;

use crate::models::ProductRecord;
use crate::snapshot::Snapshot;

/// Outcome of comparing a fetched record with the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Variant has no snapshot entry yet
    New,
    /// In-stock flag differs from the stored record
    StockChanged { was_in_stock: bool },
    /// Nothing the watcher reports on
    Unchanged,
}

impl Change {
    /// Whether this change updates the snapshot and triggers a notification
    pub fn is_notable(self) -> bool {
        !matches!(self, Change::Unchanged)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::New => write!(f, "new"),
            Change::StockChanged { was_in_stock: true } => write!(f, "sold out"),
            Change::StockChanged { was_in_stock: false } => write!(f, "restocked"),
            Change::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Compare `record` with the snapshot entry for its variant
pub fn detect(snapshot: &Snapshot, record: &ProductRecord) -> Change {
    match snapshot.get(&record.variant()) {
        None => Change::New,
        Some(stored) if stored.in_stock != record.in_stock => Change::StockChanged {
            was_in_stock: stored.in_stock,
        },
        Some(_) => Change::Unchanged,
    }
}
