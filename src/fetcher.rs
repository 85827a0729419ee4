//! fetcher.rs - Variant lookups against the retailer endpoint
//!
//! The retailer answers a form POST with a plain-text body of six
//! `/`-separated fields: id, short name, long name, price (JPY), size and
//! hardness. The price is converted through a [`RateFeed`].

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Result, WatchError};
use crate::exchange_rate::RateFeed;
use crate::models::{ProductRecord, Variant};

pub const DEFAULT_RETAILER_URL: &str = "https://www.artisan-jp.com/get_syouhin.php";

/// Field delimiter in retailer responses
const FIELD_DELIMITER: char = '/';

/// Number of positional fields a retailer response carries
const FIELD_COUNT: usize = 6;

/// Trait defining the interface for variant lookups
#[async_trait]
pub trait VariantSource: Send + Sync {
    /// Fetch the current record for one catalog variant
    async fn fetch(&self, variant: Variant) -> Result<ProductRecord>;
}

/// Retailer fields before currency conversion
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub price_yen: i64,
    pub size: u8,
    pub hardness: String,
}

/// Split a retailer body into its positional fields.
///
/// Fails when fewer than six fields are present or when price/size are not
/// numeric. Trailing extra fields are ignored.
pub fn parse_listing(body: &str) -> Result<RawListing> {
    let body = body.trim();
    let malformed = |reason: String| WatchError::MalformedResponse {
        body: body.to_string(),
        reason,
    };

    let fields: Vec<&str> = body.split(FIELD_DELIMITER).collect();
    if fields.len() < FIELD_COUNT {
        return Err(malformed(format!(
            "expected {} fields, got {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let price: f64 = fields[3]
        .trim()
        .parse()
        .map_err(|_| malformed(format!("price {:?} is not a number", fields[3])))?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if !price.is_finite() || price < i64::MIN as f64 || price >= i64::MAX as f64 {
        return Err(malformed(format!("price {:?} is out of range", fields[3])));
    }

    let size: u8 = fields[4]
        .trim()
        .parse()
        .map_err(|_| malformed(format!("size {:?} is not an integer", fields[4])))?;

    Ok(RawListing {
        id: fields[0].to_string(),
        short_name: fields[1].to_string(),
        long_name: fields[2].to_string(),
        // Retailer sometimes sends "3000.0"; fractional yen are dropped
        price_yen: price.trunc() as i64,
        size,
        hardness: fields[5].to_string(),
    })
}

/// Turn a parsed listing into a record, converting the price
pub async fn build_record(
    variant: Variant,
    listing: RawListing,
    rates: &dyn RateFeed,
) -> Result<ProductRecord> {
    if listing.size != variant.size {
        return Err(WatchError::MalformedResponse {
            body: format!("{:?}", listing),
            reason: format!(
                "retailer answered size {} for requested size {}",
                listing.size, variant.size
            ),
        });
    }

    let price = rates.convert(listing.price_yen).await?;

    Ok(ProductRecord::new(
        variant,
        &listing.id,
        &listing.short_name,
        &listing.long_name,
        price,
        listing.size,
        &listing.hardness,
    ))
}

// ============================================================================
// ArtisanClient - Real retailer lookups
// ============================================================================

/// Retailer client sharing the process-wide HTTP client
#[derive(Clone)]
pub struct ArtisanClient {
    client: Client,
    url: String,
    rates: Arc<dyn RateFeed>,
}

impl ArtisanClient {
    pub fn with_url(client: Client, url: impl Into<String>, rates: Arc<dyn RateFeed>) -> Self {
        ArtisanClient {
            client,
            url: url.into(),
            rates,
        }
    }
}

#[async_trait]
impl VariantSource for ArtisanClient {
    async fn fetch(&self, variant: Variant) -> Result<ProductRecord> {
        debug!("Fetching variant {} from: {}", variant, self.url);

        let form = [
            ("kuni", "on".to_string()),
            ("sir", variant.sir.to_string()),
            ("size", variant.size.to_string()),
            ("color", variant.color.to_string()),
        ];

        let response = self.client.post(&self.url).form(&form).send().await?;

        // Anything but a plain 200 is a failed lookup
        let status = response.status();
        if status != StatusCode::OK {
            return Err(WatchError::FetchStatus {
                key: variant.key(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let listing = parse_listing(&body)?;
        let record = build_record(variant, listing, self.rates.as_ref()).await?;

        info!("Fetched {}", record.short_name);
        Ok(record)
    }
}

// ============================================================================
// MockVariantSource - For testing purposes
// ============================================================================

/// In-memory retailer keyed by variant; unknown variants answer HTTP 404
pub struct MockVariantSource {
    bodies: RwLock<HashMap<Variant, String>>,
    rates: Arc<dyn RateFeed>,
}

impl MockVariantSource {
    pub fn new(rates: Arc<dyn RateFeed>) -> Self {
        MockVariantSource {
            bodies: RwLock::new(HashMap::new()),
            rates,
        }
    }

    /// Set the raw body returned for `variant`
    pub async fn set_body(&self, variant: Variant, body: impl Into<String>) {
        self.bodies.write().await.insert(variant, body.into());
    }

    /// Make `variant` fail with a non-success status
    pub async fn remove(&self, variant: Variant) {
        self.bodies.write().await.remove(&variant);
    }
}

#[async_trait]
impl VariantSource for MockVariantSource {
    async fn fetch(&self, variant: Variant) -> Result<ProductRecord> {
        let body = self.bodies.read().await.get(&variant).cloned().ok_or_else(|| {
            WatchError::FetchStatus {
                key: variant.key(),
                status: 404,
            }
        })?;

        let listing = parse_listing(&body)?;
        build_record(variant, listing, self.rates.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange_rate::FixedRateFeed;

    #[test]
    fn test_parse_listing() {
        let listing = parse_listing("A1/Pad/Pad Soft S/3000/1/Soft").unwrap();

        assert_eq!(listing.id, "A1");
        assert_eq!(listing.short_name, "Pad");
        assert_eq!(listing.long_name, "Pad Soft S");
        assert_eq!(listing.price_yen, 3000);
        assert_eq!(listing.size, 1);
        assert_eq!(listing.hardness, "Soft");
    }

    #[test]
    fn test_parse_listing_truncates_fractional_price() {
        let listing = parse_listing("A1/Pad/Pad Soft S/3000.9/1/Soft\n").unwrap();
        assert_eq!(listing.price_yen, 3000);
        assert_eq!(listing.hardness, "Soft");
    }

    #[test]
    fn test_parse_listing_too_few_fields() {
        let result = parse_listing("A1/Pad/Pad Soft S/3000/1");
        match result {
            Err(WatchError::MalformedResponse { reason, .. }) => {
                assert!(reason.contains("expected 6 fields, got 5"));
            }
            other => panic!("Expected MalformedResponse, got: {other:?}"),
        }
    }

    #[test]
    fn test_parse_listing_non_numeric_fields() {
        assert!(matches!(
            parse_listing("A1/Pad/Pad Soft S/cheap/1/Soft"),
            Err(WatchError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_listing("A1/Pad/Pad Soft S/3000/S/Soft"),
            Err(WatchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_listing_rejects_out_of_range_price() {
        for price in ["1e30", "-1e30", "inf", "NaN"] {
            let body = format!("A1/Pad/Pad Soft S/{price}/1/Soft");
            assert!(
                matches!(parse_listing(&body), Err(WatchError::MalformedResponse { .. })),
                "{price} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_build_record_converts_price() {
        let variant = Variant::new(10, 1, 5);
        let listing = parse_listing("A1/Pad/Pad Soft S/3000/1/Soft").unwrap();

        let record = build_record(variant, listing, &FixedRateFeed::new(0.0061))
            .await
            .unwrap();

        assert!((record.price - 18.3).abs() < 1e-9);
        assert!(record.in_stock);
        assert_eq!(record.sir, 10);
        assert_eq!(record.color, 5);
        assert_eq!(record.key(), "10|1|5");
    }

    #[tokio::test]
    async fn test_build_record_rejects_size_mismatch() {
        let variant = Variant::new(10, 2, 5);
        let listing = parse_listing("A1/Pad/Pad Soft S/3000/1/Soft").unwrap();

        let result = build_record(variant, listing, &FixedRateFeed::new(0.0061)).await;
        assert!(matches!(result, Err(WatchError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockVariantSource::new(Arc::new(FixedRateFeed::new(0.0061)));
        let variant = Variant::new(10, 1, 5);

        assert!(matches!(
            source.fetch(variant).await,
            Err(WatchError::FetchStatus { status: 404, .. })
        ));

        source.set_body(variant, "NON/Pad/Pad Soft S/3000/1/Soft").await;
        let record = source.fetch(variant).await.unwrap();
        assert!(!record.in_stock);
    }
}
