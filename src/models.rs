//! models.rs - Core data structures for the stock watcher
//!
//! Defines Variant (the catalog entry and snapshot key) and ProductRecord

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WatchError;

/// Opaque product id the retailer returns for unavailable variants
pub const OUT_OF_STOCK_ID: &str = "NON";

/// Separator used in serialized variant keys
pub const KEY_SEPARATOR: char = '|';

/// Human readable names for sizes 1..=5
const SIZE_LABELS: [&str; 5] = ["Small", "Medium", "Large", "XLarge", "XXLarge"];

/// One catalog entry: product family (`sir`), size and color
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variant {
    pub sir: u32,
    pub size: u8,
    pub color: u32,
}

impl Variant {
    pub fn new(sir: u32, size: u8, color: u32) -> Self {
        Variant { sir, size, color }
    }

    /// Returns the snapshot key (e.g., "10|1|5")
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.sir,
            self.size,
            self.color,
            sep = KEY_SEPARATOR
        )
    }
}

impl FromStr for Variant {
    type Err = WatchError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || WatchError::InvalidKey(key.to_string());

        let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        Ok(Variant {
            sir: parts[0].parse().map_err(|_| invalid())?,
            size: parts[1].parse().map_err(|_| invalid())?,
            color: parts[2].parse().map_err(|_| invalid())?,
        })
    }
}

/// Maps a size number to its label, `None` outside 1..=5
pub fn size_label(size: u8) -> Option<&'static str> {
    match size {
        1..=5 => Some(SIZE_LABELS[usize::from(size) - 1]),
        _ => None,
    }
}

/// Whether a retailer product id denotes an orderable variant
pub fn is_available(id: &str) -> bool {
    id != OUT_OF_STOCK_ID
}

/// One retailer observation of a variant
///
/// Field names on disk match the snapshot files written by earlier
/// versions, so existing `data.json` files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    #[serde(rename = "short")]
    pub short_name: String,
    #[serde(rename = "long")]
    pub long_name: String,
    /// Price in the target currency, rounded to 2 decimals
    pub price: f64,
    pub size: u8,
    pub hardness: String,
    #[serde(rename = "inStock")]
    pub in_stock: bool,
    pub sir: u32,
    pub color: u32,
}

impl ProductRecord {
    /// Builds a record for `variant`; availability is derived from `id`
    pub fn new(
        variant: Variant,
        id: &str,
        short_name: &str,
        long_name: &str,
        price: f64,
        size: u8,
        hardness: &str,
    ) -> Self {
        ProductRecord {
            id: id.to_string(),
            short_name: short_name.to_string(),
            long_name: long_name.to_string(),
            price,
            size,
            hardness: hardness.to_string(),
            in_stock: is_available(id),
            sir: variant.sir,
            color: variant.color,
        }
    }

    /// The catalog variant this record belongs to
    pub fn variant(&self) -> Variant {
        Variant::new(self.sir, self.size, self.color)
    }

    pub fn key(&self) -> String {
        self.variant().key()
    }

    pub fn size_label(&self) -> Option<&'static str> {
        size_label(self.size)
    }
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] @ {} ({})",
            self.short_name,
            self.key(),
            self.price,
            if self.in_stock { "in stock" } else { "sold out" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_key_format() {
        assert_eq!(Variant::new(10, 1, 5).key(), "10|1|5");
    }

    #[test]
    fn test_variant_key_round_trip() {
        for variant in [
            Variant::new(10, 1, 5),
            Variant::new(0, 5, 0),
            Variant::new(4294967295, 3, 123456),
        ] {
            let parsed: Variant = variant.key().parse().unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_invalid_keys_rejected() {
        for key in ["", "10|1", "10|1|5|7", "a|1|5", "10||5", "10|300|5"] {
            assert!(
                matches!(key.parse::<Variant>(), Err(WatchError::InvalidKey(_))),
                "{key} should not parse"
            );
        }
    }

    #[test]
    fn test_size_labels() {
        assert_eq!(size_label(1), Some("Small"));
        assert_eq!(size_label(2), Some("Medium"));
        assert_eq!(size_label(3), Some("Large"));
        assert_eq!(size_label(4), Some("XLarge"));
        assert_eq!(size_label(5), Some("XXLarge"));
        assert_eq!(size_label(0), None);
        assert_eq!(size_label(6), None);
    }

    #[test]
    fn test_record_availability() {
        let variant = Variant::new(10, 1, 5);
        let listed = ProductRecord::new(variant, "A1", "Pad", "Pad Soft S", 18.3, 1, "Soft");
        let sold_out = ProductRecord::new(variant, "NON", "Pad", "Pad Soft S", 18.3, 1, "Soft");

        assert!(listed.in_stock);
        assert!(!sold_out.in_stock);
        assert_eq!(listed.key(), "10|1|5");
    }

    #[test]
    fn test_record_serializes_legacy_field_names() {
        let record = ProductRecord::new(Variant::new(10, 1, 5), "A1", "Pad", "Pad Soft S", 18.3, 1, "Soft");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["short"], "Pad");
        assert_eq!(json["long"], "Pad Soft S");
        assert_eq!(json["inStock"], true);
        assert_eq!(json["sir"], 10);
        assert_eq!(json["color"], 5);
    }
}
