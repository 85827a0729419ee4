//! watcher.rs - Fetch, detect and notify over the whole catalog
//!
//! One cycle loads the snapshot, walks the catalog in order, and saves the
//! snapshot once at the end. Cycles repeat after a fixed pause until the
//! shutdown future resolves.

use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::Catalog;
use crate::detector::{detect, Change};
use crate::error::Result;
use crate::fetcher::VariantSource;
use crate::models::{ProductRecord, Variant};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::webhook::Notifier;

/// Counters for one catalog pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Variants fetched successfully
    pub checked: usize,
    /// Variants whose fetch failed
    pub failed: usize,
    /// Notifications delivered
    pub notified: usize,
}

pub struct Watcher {
    source: Arc<dyn VariantSource>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore,
    catalog: Catalog,
}

impl Watcher {
    pub fn new(
        source: Arc<dyn VariantSource>,
        notifier: Arc<dyn Notifier>,
        store: SnapshotStore,
        catalog: Catalog,
    ) -> Self {
        Watcher {
            source,
            notifier,
            store,
            catalog,
        }
    }

    /// Apply one fetched record to the snapshot, notifying on first sight or
    /// a stock flip. Returns whether a notification went out.
    ///
    /// If delivery fails the snapshot entry is put back, so the change is
    /// reported again next cycle.
    pub async fn process(&self, record: ProductRecord, snapshot: &mut Snapshot) -> Result<bool> {
        let change = detect(snapshot, &record);
        if !change.is_notable() {
            debug!("{} unchanged", record.key());
            return Ok(false);
        }

        let variant = record.variant();
        info!("{} is {}: {}", variant, change, record);

        let previous = snapshot.insert(record.clone());
        if let Err(e) = self.notifier.notify(&record).await {
            snapshot.restore(&variant, previous);
            return Err(e);
        }

        if change == Change::New {
            debug!("Added {} to snapshot", variant);
        }
        Ok(true)
    }

    /// Run a single pass over the catalog
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut snapshot = self.store.load()?;
        self.log_stale_entries(&snapshot);

        let mut report = CycleReport::default();

        for &variant in &self.catalog.variants {
            let record = match self.source.fetch(variant).await {
                Ok(record) => record,
                Err(e) => {
                    error!("{} failed to fetch: {}", variant_tuple(variant), e);
                    report.failed += 1;
                    continue;
                }
            };
            report.checked += 1;

            match self.process(record, &mut snapshot).await {
                Ok(true) => report.notified += 1,
                Ok(false) => {}
                Err(e) => warn!("Notification for {} failed: {}", variant, e),
            }
        }

        self.store.save(&snapshot)?;
        Ok(report)
    }

    /// Run cycles forever, sleeping `pause` between them, until `shutdown`
    /// resolves. A running cycle is finished before shutting down.
    pub async fn run<F>(&self, pause: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycle_count: u64 = 0;

        loop {
            cycle_count += 1;
            info!("Cycle #{}: checking {} variants...", cycle_count, self.catalog.len());

            match self.run_cycle().await {
                Ok(report) => info!(
                    "Cycle #{} complete: {} checked, {} failed, {} notified",
                    cycle_count, report.checked, report.failed, report.notified
                ),
                Err(e) => error!("Cycle #{} aborted: {}", cycle_count, e),
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after {} cycles", cycle_count);
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    fn log_stale_entries(&self, snapshot: &Snapshot) {
        for (key, _) in snapshot.iter() {
            match key.parse::<Variant>() {
                Ok(_) if self.catalog.contains_key(key) => {}
                Ok(variant) => debug!("Snapshot entry {} is not in the catalog", variant),
                Err(e) => warn!("Ignoring snapshot entry: {}", e),
            }
        }
    }
}

/// Install the Ctrl-C handler right away and return a receiver that
/// resolves once the signal arrives. A signal during a cycle therefore only
/// ends the loop after that cycle has saved.
pub async fn ctrl_c_shutdown() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    let (installed_tx, installed_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let signal = tokio::signal::ctrl_c();
        tokio::pin!(signal);

        // the first poll registers the handler
        let early = tokio::select! {
            biased;
            result = &mut signal => Some(result),
            _ = std::future::ready(()) => None,
        };
        let _ = installed_tx.send(());

        let result = match early {
            Some(result) => result,
            None => signal.await,
        };
        match result {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = tx.send(());
            }
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                // holding the sender keeps the loop running
                std::future::pending::<()>().await;
            }
        }
    });

    let _ = installed_rx.await;
    rx
}

/// Log form of a variant, matching catalog order `(sir, size, color)`
fn variant_tuple(variant: Variant) -> String {
    format!("({}, {}, {})", variant.sir, variant.size, variant.color)
}
