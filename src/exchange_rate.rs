//! exchange_rate.rs - Currency conversion backed by a public rate feed
//!
//! The live feed is the jsDelivr-hosted currency-api; a fixed-rate feed is
//! provided for tests and offline runs.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{Result, WatchError};

/// Currency the retailer quotes prices in
pub const SOURCE_CURRENCY: &str = "jpy";

/// Currency notifications are reported in
pub const TARGET_CURRENCY: &str = "eur";

/// Symbol appended to converted prices
pub const TARGET_SYMBOL: &str = "€";

pub const DEFAULT_RATE_URL: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/jpy.json";

/// Source of the current source->target conversion rate
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Fetch the current rate
    async fn rate(&self) -> Result<f64>;

    /// Convert a whole amount of source currency, rounded to 2 decimals.
    /// Queries the feed on every call.
    async fn convert(&self, amount: i64) -> Result<f64> {
        let rate = self.rate().await?;
        convert_with_rate(amount, rate)
    }
}

/// Multiply `amount` by `rate` in decimal arithmetic and round to cents
pub fn convert_with_rate(amount: i64, rate: f64) -> Result<f64> {
    let rate = Decimal::from_f64(rate)
        .ok_or_else(|| WatchError::RateUnavailable(format!("rate {} is not finite", rate)))?;

    let converted = Decimal::from(amount)
        .checked_mul(rate)
        .ok_or_else(|| {
            WatchError::RateUnavailable(format!("{} * {} overflows", amount, rate))
        })?
        .round_dp(2);

    converted
        .to_f64()
        .ok_or_else(|| WatchError::RateUnavailable(format!("{} does not fit in f64", converted)))
}

// ============================================================================
// CurrencyApiFeed - Live rates
// ============================================================================

/// Rate feed reading `{ "<source>": { "<target>": rate } }` documents
#[derive(Debug, Clone)]
pub struct CurrencyApiFeed {
    client: Client,
    url: String,
}

impl CurrencyApiFeed {
    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        CurrencyApiFeed {
            client,
            url: url.into(),
        }
    }
}

/// Pull `source.target` out of a rate document
fn extract_rate(document: &Value) -> Result<f64> {
    document
        .get(SOURCE_CURRENCY)
        .and_then(|rates| rates.get(TARGET_CURRENCY))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            WatchError::RateUnavailable(format!(
                "missing {}.{} in rate document",
                SOURCE_CURRENCY, TARGET_CURRENCY
            ))
        })
}

#[async_trait]
impl RateFeed for CurrencyApiFeed {
    async fn rate(&self) -> Result<f64> {
        debug!("Fetching exchange rate from: {}", self.url);

        let document: Value = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rate = extract_rate(&document)?;
        debug!("{}->{} rate: {}", SOURCE_CURRENCY, TARGET_CURRENCY, rate);
        Ok(rate)
    }
}

// ============================================================================
// FixedRateFeed - For testing purposes
// ============================================================================

/// Rate feed that always answers with the same rate
#[derive(Debug, Clone, Copy)]
pub struct FixedRateFeed {
    rate: f64,
}

impl FixedRateFeed {
    pub fn new(rate: f64) -> Self {
        FixedRateFeed { rate }
    }
}

#[async_trait]
impl RateFeed for FixedRateFeed {
    async fn rate(&self) -> Result<f64> {
        Ok(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_convert_rounds_to_cents() {
        assert_close(convert_with_rate(3000, 0.0061).unwrap(), 18.3);
        assert_close(convert_with_rate(4321, 0.00617).unwrap(), 26.66);
        assert_close(convert_with_rate(0, 0.0061).unwrap(), 0.0);
    }

    #[test]
    fn test_convert_matches_decimal_math() {
        // 12800 * 0.006234 = 79.7952
        let expected = (dec!(12800) * dec!(0.006234)).round_dp(2);
        let converted = convert_with_rate(12800, 0.006234).unwrap();

        assert_eq!(expected, dec!(79.80));
        assert_close(converted, expected.to_f64().unwrap());
    }

    #[test]
    fn test_convert_rejects_non_finite_rate() {
        assert!(matches!(
            convert_with_rate(100, f64::NAN),
            Err(WatchError::RateUnavailable(_))
        ));
    }

    #[test]
    fn test_convert_overflow_is_error() {
        assert!(matches!(
            convert_with_rate(1_000_000_000, 1e20),
            Err(WatchError::RateUnavailable(_))
        ));
    }

    #[test]
    fn test_extract_rate() {
        let document = json!({ "date": "2026-10-18", "jpy": { "eur": 0.0061, "usd": 0.0066 } });
        assert_eq!(extract_rate(&document).unwrap(), 0.0061);
    }

    #[test]
    fn test_extract_rate_missing_field() {
        for document in [
            json!({ "date": "2026-10-18" }),
            json!({ "jpy": { "usd": 0.0066 } }),
            json!({ "jpy": { "eur": "0.0061" } }),
        ] {
            assert!(matches!(
                extract_rate(&document),
                Err(WatchError::RateUnavailable(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_fixed_feed_convert() {
        let feed = FixedRateFeed::new(0.0061);
        assert_close(feed.convert(3000).await.unwrap(), 18.3);
    }
}
