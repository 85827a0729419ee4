//! config.rs - Catalog file and environment settings

use log::info;
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, WatchError};
use crate::models::{size_label, Variant};

/// Environment variable holding the notification webhook URL
pub const WEBHOOK_ENV: &str = "WEBHOOK";

/// Optional dotenv file read before the environment is consulted
pub const ENV_FILE: &str = ".env";

pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Seconds between the end of one cycle and the start of the next
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Variants polled every cycle, in file order
///
/// ```toml
/// [[variants]]
/// sir = 10
/// size = 1
/// color = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Catalog {
    pub fn new(variants: Vec<Variant>) -> Self {
        Catalog { variants }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WatchError::Config(format!("cannot read catalog {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_toml(&content)?;
        info!(
            "Loaded {} catalog variants from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Sizes must be 1..=5 and entries unique
    fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(WatchError::Config("catalog has no variants".to_string()));
        }

        for (i, variant) in self.variants.iter().enumerate() {
            if size_label(variant.size).is_none() {
                return Err(WatchError::Config(format!(
                    "variant {} has size {}, expected 1..=5",
                    variant, variant.size
                )));
            }
            if self.variants[..i].contains(variant) {
                return Err(WatchError::Config(format!(
                    "variant {} listed twice",
                    variant
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.variants.iter().any(|v| v.key() == key)
    }
}

/// Load `KEY=value` lines from a dotenv file into the process environment.
/// Variables already set win. Returns `false` when the file does not exist.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(WatchError::Config(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Read the webhook URL from the environment; unset or blank is fatal
pub fn webhook_url_from_env() -> Result<String> {
    webhook_url_from(std::env::var(WEBHOOK_ENV).ok())
}

fn webhook_url_from(value: Option<String>) -> Result<String> {
    match value {
        Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        _ => Err(WatchError::Config(format!(
            "please define {} in the environment",
            WEBHOOK_ENV
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_toml(
            r#"
            [[variants]]
            sir = 10
            size = 1
            color = 5

            [[variants]]
            sir = 10
            size = 3
            color = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            catalog.variants,
            vec![Variant::new(10, 1, 5), Variant::new(10, 3, 5)]
        );
        assert!(catalog.contains_key("10|3|5"));
        assert!(!catalog.contains_key("10|2|5"));
    }

    #[test]
    fn test_catalog_rejects_bad_size() {
        let result = Catalog::from_toml("[[variants]]\nsir = 10\nsize = 6\ncolor = 5\n");
        assert!(matches!(result, Err(WatchError::Config(_))));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let entry = "[[variants]]\nsir = 10\nsize = 1\ncolor = 5\n";
        let result = Catalog::from_toml(&format!("{entry}{entry}"));
        assert!(matches!(result, Err(WatchError::Config(_))));
    }

    #[test]
    fn test_catalog_rejects_empty() {
        assert!(matches!(Catalog::from_toml(""), Err(WatchError::Config(_))));
    }

    #[test]
    fn test_catalog_syntax_error() {
        assert!(matches!(
            Catalog::from_toml("[[variants]\nsir = 10"),
            Err(WatchError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_catalog() {
        assert!(matches!(
            Catalog::load("/nonexistent/catalog.toml"),
            Err(WatchError::Config(_))
        ));
    }

    #[test]
    fn test_load_env_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "ARTISAN_WATCH_ENV_FILE_TEST=https://discord.com/api/webhooks/2/def").unwrap();

        assert!(load_env_file(tmp.path()).unwrap());
        assert_eq!(
            std::env::var("ARTISAN_WATCH_ENV_FILE_TEST").unwrap(),
            "https://discord.com/api/webhooks/2/def"
        );
    }

    #[test]
    fn test_missing_env_file_is_skipped() {
        assert!(!load_env_file("/nonexistent/.env").unwrap());
    }

    #[test]
    fn test_webhook_url_required() {
        assert!(webhook_url_from(None).is_err());
        assert!(webhook_url_from(Some("   ".to_string())).is_err());
        assert_eq!(
            webhook_url_from(Some("https://discord.com/api/webhooks/1/abc\n".to_string())).unwrap(),
            "https://discord.com/api/webhooks/1/abc"
        );
    }
}
