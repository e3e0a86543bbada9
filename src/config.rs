//! # Router Configuration Module
//!
//! Settings that decide how routes are compiled and cached. They can come
//! from environment variables or from a YAML, JSON or TOML file.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `ROUTECRAFT_STRATEGY` | `mark_based` or `trie` | `mark_based` |
//! | `ROUTECRAFT_CHUNK_SIZE` | approximate routes per chunk (chunked strategy) | `30` |
//! | `ROUTECRAFT_CACHE_DISABLED` | `1`/`true`/`yes`/`on` to skip the cache | `false` |
//! | `ROUTECRAFT_CACHE_KEY` | key the route data is stored under | `routecraft.routes` |
//! | `ROUTECRAFT_CACHE_DIR` | directory for the file cache | unset |
//!
//! Unparseable values fall back to the default, the same way an unset
//! variable does.
//!
//! ## File Format
//!
//! ```yaml
//! strategy: trie
//! approx_chunk_size: 20
//! cache_disabled: false
//! cache_key: shop.routes
//! cache_dir: /var/cache/shop
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::generator::Strategy;

/// Default key compiled routes are cached under.
pub const DEFAULT_CACHE_KEY: &str = "routecraft.routes";

/// How routes are compiled and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub strategy: Strategy,
    /// Overrides the chunked strategy's target chunk size.
    pub approx_chunk_size: Option<usize>,
    pub cache_disabled: bool,
    pub cache_key: String,
    /// When set, [`cached_dispatcher`](crate::cached_dispatcher) callers
    /// typically pair this with a [`FileCache`](crate::cache::FileCache).
    pub cache_dir: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            approx_chunk_size: None,
            cache_disabled: false,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_dir: None,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let strategy = lookup("ROUTECRAFT_STRATEGY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.strategy);
        let approx_chunk_size = lookup("ROUTECRAFT_CHUNK_SIZE")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);
        let cache_disabled = lookup("ROUTECRAFT_CACHE_DISABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.cache_disabled);
        let cache_key = lookup("ROUTECRAFT_CACHE_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.cache_key);
        let cache_dir = lookup("ROUTECRAFT_CACHE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        RouterConfig {
            strategy,
            approx_chunk_size,
            cache_disabled,
            cache_key,
            cache_dir,
        }
    }

    /// Load configuration from a file; the format follows the extension
    /// (`.yaml`/`.yml`, `.toml`, anything else is JSON).
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_str_with_format(&content, Format::from_path(path))
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Parse configuration text in the given format.
    pub fn from_str_with_format(content: &str, format: Format) -> anyhow::Result<Self> {
        format.parse(content)
    }
}

/// Serialized file formats accepted for configuration and route files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Picks the format from a file extension, defaulting to JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Format::Yaml,
            Some("toml") => Format::Toml,
            _ => Format::Json,
        }
    }

    /// Deserializes `content` in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(self, content: &str) -> anyhow::Result<T> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => toml::from_str(content)?,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag("nonsense"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a")), Format::Json);
    }
}
