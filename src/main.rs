//! main.rs - Entry point for the Artisan stock watcher
//!
//! Loads the catalog, checks every variant once per interval and posts
//! changes to the webhook named by the `WEBHOOK` environment variable.

use anyhow::Context;
use artisan_watch::config::{
    load_env_file, webhook_url_from_env, DEFAULT_CATALOG_PATH, DEFAULT_INTERVAL_SECS, ENV_FILE,
};
use artisan_watch::exchange_rate::DEFAULT_RATE_URL;
use artisan_watch::fetcher::DEFAULT_RETAILER_URL;
use artisan_watch::snapshot::DEFAULT_SNAPSHOT_PATH;
use artisan_watch::watcher::ctrl_c_shutdown;
use artisan_watch::{
    ArtisanClient, Catalog, CurrencyApiFeed, SnapshotStore, Watcher, WebhookClient, NAME, VERSION,
};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// HTTP timeout shared by retailer, rate feed and webhook calls
const HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Artisan stock watcher - posts stock changes to a chat webhook
#[derive(Parser, Debug)]
#[command(name = "artisan-watch")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML file listing the variants to watch
    #[arg(short, long, default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    /// JSON file holding the last seen record per variant
    #[arg(short, long, default_value = DEFAULT_SNAPSHOT_PATH)]
    data: PathBuf,

    /// Seconds to sleep between cycles
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval_secs: u64,

    /// Run a single cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log webhook payloads instead of posting them
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Retailer product endpoint
    #[arg(long, default_value = DEFAULT_RETAILER_URL)]
    retailer_url: String,

    /// Exchange-rate document URL
    #[arg(long, default_value = DEFAULT_RATE_URL)]
    rate_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    info!("Starting {} v{}", NAME, VERSION);

    // Ctrl-C is handled from here on, so it never cuts a cycle short
    let shutdown = ctrl_c_shutdown().await;

    if load_env_file(ENV_FILE)? {
        info!("Loaded environment from {}", ENV_FILE);
    }
    let webhook_url = webhook_url_from_env()?;
    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog: {}", args.catalog.display()))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .context("Failed to create HTTP client")?;

    let rates = Arc::new(CurrencyApiFeed::with_url(client.clone(), args.rate_url));
    let source = Arc::new(ArtisanClient::with_url(client.clone(), args.retailer_url, rates));
    let notifier = Arc::new(WebhookClient::new(client, webhook_url).with_dry_run(args.dry_run));

    info!("✓ Watching {} variants", catalog.len());
    info!("  - Snapshot file: {}", args.data.display());
    if args.dry_run {
        info!("  - Dry run: webhook messages are logged, not sent");
    }

    let watcher = Watcher::new(source, notifier, SnapshotStore::new(&args.data), catalog);

    if args.once {
        let report = watcher.run_cycle().await.context("Cycle failed")?;
        info!(
            "Single cycle complete: {} checked, {} failed, {} notified",
            report.checked, report.failed, report.notified
        );
        return Ok(());
    }

    info!("🔄 Starting watch loop (interval: {}s)...", args.interval_secs);
    watcher
        .run(Duration::from_secs(args.interval_secs), async {
            let _ = shutdown.await;
        })
        .await;

    Ok(())
}
