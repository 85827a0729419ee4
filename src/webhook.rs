//! webhook.rs - Chat webhook payloads and delivery
//!
//! A record is rendered as a single embed: title from the long name, green
//! or red depending on stock, price/size/hardness fields and a Berlin-time
//! timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{Result, WatchError};
use crate::exchange_rate::TARGET_SYMBOL;
use crate::models::ProductRecord;

/// Embed color for orderable variants (0x0FE63A)
pub const IN_STOCK_COLOR: u32 = 1041978;

/// Embed color for sold out variants (0xEE4510)
pub const OUT_OF_STOCK_COLOR: u32 = 15615248;

/// Civil time zone used for embed timestamps
pub const TIMESTAMP_TZ: Tz = chrono_tz::Europe::Berlin;

/// Webhook message body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookMessage {
    /// Always serialized, as `null`
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub attachments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        EmbedField {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Price with currency symbol; whole amounts keep one decimal ("20.0€")
pub fn format_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 {
        format!("{:.1}{}", price, TARGET_SYMBOL)
    } else {
        format!("{}{}", price, TARGET_SYMBOL)
    }
}

/// Render `record` with an explicit timestamp
pub fn format_record_at(record: &ProductRecord, at: DateTime<Tz>) -> WebhookMessage {
    let title = record
        .long_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    let color = if record.in_stock {
        IN_STOCK_COLOR
    } else {
        OUT_OF_STOCK_COLOR
    };

    let size = match record.size_label() {
        Some(label) => label.to_string(),
        None => record.size.to_string(),
    };

    let embed = Embed {
        title,
        color,
        fields: vec![
            EmbedField::inline("Price", format_price(record.price)),
            EmbedField::inline("Size", size),
            EmbedField::inline("Hardness", record.hardness.clone()),
        ],
        timestamp: at.to_rfc3339(),
    };

    WebhookMessage {
        content: None,
        embeds: vec![embed],
        attachments: Vec::new(),
    }
}

/// Render `record` stamped with the current time
pub fn format_record(record: &ProductRecord) -> WebhookMessage {
    format_record_at(record, Utc::now().with_timezone(&TIMESTAMP_TZ))
}

/// Destination for change notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, record: &ProductRecord) -> Result<()>;
}

// ============================================================================
// WebhookClient - Real delivery
// ============================================================================

/// Posts rendered records to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
    dry_run: bool,
}

impl WebhookClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        WebhookClient {
            client,
            url: url.into(),
            dry_run: false,
        }
    }

    /// Log payloads instead of posting them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn send(&self, message: &WebhookMessage) -> Result<()> {
        if self.dry_run {
            info!(
                "[DRY RUN] Would send webhook message:\n{}",
                serde_json::to_string_pretty(message)?
            );
            return Ok(());
        }

        let response = self.client.post(&self.url).json(message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Webhook message delivered ({})", status);
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn notify(&self, record: &ProductRecord) -> Result<()> {
        self.send(&format_record(record)).await
    }
}

// ============================================================================
// RecordingNotifier - For testing purposes
// ============================================================================

/// Keeps every rendered message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<WebhookMessage>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail with HTTP 500
    pub async fn set_failing(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    /// Drain and return everything sent so far
    pub async fn take(&self) -> Vec<WebhookMessage> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, record: &ProductRecord) -> Result<()> {
        if *self.fail.lock().await {
            return Err(WatchError::Webhook {
                status: 500,
                body: "recording notifier set to fail".to_string(),
            });
        }
        self.sent.lock().await.push(format_record(record));
        Ok(())
    }
}
