//! snapshot.rs - Last known record per variant, persisted as one JSON file
//!
//! The file is a flat object mapping `"<sir>|<size>|<color>"` keys to
//! records. It is read once at the start of a cycle and overwritten once at
//! the end.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{ProductRecord, Variant};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data.json";

/// In-memory snapshot, keyed by serialized variant key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<String, ProductRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variant: &Variant) -> Option<&ProductRecord> {
        self.records.get(&variant.key())
    }

    /// Insert or replace the entry for the record's variant, returning the
    /// previous entry
    pub fn insert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        self.records.insert(record.key(), record)
    }

    /// Put back a previous state for `variant` (`None` removes the entry)
    pub fn restore(&mut self, variant: &Variant, previous: Option<ProductRecord>) {
        match previous {
            Some(record) => {
                self.records.insert(variant.key(), record);
            }
            None => {
                self.records.remove(&variant.key());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProductRecord)> {
        self.records.iter()
    }
}

/// File-backed snapshot storage
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    /// Read the whole snapshot. A missing file yields an empty snapshot; an
    /// unreadable or corrupt file is an error.
    pub fn load(&self) -> Result<Snapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Snapshot file {} not found, starting empty",
                    self.path.display()
                );
                return Ok(Snapshot::new());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} snapshot entries from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    /// Overwrite the file with the full snapshot via a temp file + rename
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(
            "Saved {} snapshot entries to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
