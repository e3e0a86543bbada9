//! # Route Cache Module
//!
//! Compiling a large route set means parsing every pattern and building the
//! combined regexes. A [`Cache`] stores the result, a [`RouteData`], so a
//! process can skip registration entirely on the next start.
//!
//! ## Implementations
//!
//! - [`MemoryCache`]: process-local map of serialized entries
//! - [`FileCache`]: one JSON file per key in a directory, written atomically
//! - [`NullCache`]: never stores anything
//!
//! ## Invalid Entries
//!
//! Entries are stored as JSON. Compiled regexes are stored as their source and
//! recompiled on load. An entry that fails to deserialize or recompile is
//! logged as an [`Error::InvalidCacheEntry`] and treated as a miss: the loader
//! runs and its result replaces the entry.
//!
//! ## Cache Keys
//!
//! Keys are caller-chosen. [`content_key`] derives one from the bytes the
//! routes were defined from, so an edited routes file never hits a stale entry.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::collector::RouteData;
use crate::error::{Error, Result};

/// Stores compiled [`RouteData`] under string keys.
pub trait Cache {
    /// Returns the entry for `key`, or runs `loader`, stores and returns its
    /// result. `loader` runs at most once per call.
    fn get<H, F>(&self, key: &str, loader: F) -> Result<RouteData<H>>
    where
        H: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Result<RouteData<H>>;
}

/// Builds a cache key from `prefix` and the SHA-256 of `content`.
///
/// # Example
///
/// ```rust
/// let key = routecraft::cache::content_key("routes", b"GET /users");
/// assert!(key.starts_with("routes-"));
/// assert_eq!(key.len(), "routes-".len() + 16);
/// ```
#[must_use]
pub fn content_key(prefix: &str, content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let hash: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{hash}")
}

fn decode<H: DeserializeOwned>(key: &str, blob: &str) -> Option<RouteData<H>> {
    let decoded = serde_json::from_str::<RouteData<H>>(blob)
        .map_err(|err| err.to_string())
        .and_then(|data| data.table.variable_routes.validate().map(|()| data));
    match decoded {
        Ok(data) => Some(data),
        Err(reason) => {
            let err = Error::InvalidCacheEntry {
                key: key.to_string(),
                reason,
            };
            warn!(key = %key, error = %err, "Discarding invalid route cache entry");
            None
        }
    }
}

/// Process-local cache.
///
/// Entries are kept decoded, so a hit costs a clone of the [`RouteData`]
/// rather than a parse and a regex compile. Lookups take a read lock. Misses
/// are computed one at a time, so concurrent callers asking for the same
/// missing key run the loader once.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    compute: Mutex<()>,
}

#[derive(Debug)]
enum Entry {
    /// Serialized route data, decoded on first use.
    Raw(String),
    Decoded(Arc<dyn Any + Send + Sync>),
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Stores a serialized blob, as a [`FileCache`] would hold it; mostly
    /// useful for seeding tests.
    pub fn insert_raw(&self, key: &str, blob: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Entry::Raw(blob.into()));
    }

    fn store<H: Clone + Send + Sync + 'static>(&self, key: &str, data: &RouteData<H>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Entry::Decoded(Arc::new(data.clone())));
    }

    fn lookup<H>(&self, key: &str) -> Option<RouteData<H>>
    where
        H: Clone + DeserializeOwned + Send + Sync + 'static,
    {
        let data = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key)? {
                Entry::Decoded(data) => {
                    let typed = data.downcast_ref::<RouteData<H>>().cloned();
                    if typed.is_none() {
                        debug!(key = %key, "Route cache entry holds another handler type");
                    }
                    return typed;
                }
                Entry::Raw(blob) => decode(key, blob)?,
            }
        };
        self.store(key, &data);
        Some(data)
    }
}

impl Cache for MemoryCache {
    fn get<H, F>(&self, key: &str, loader: F) -> Result<RouteData<H>>
    where
        H: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Result<RouteData<H>>,
    {
        if let Some(data) = self.lookup(key) {
            debug!(key = %key, cache = "memory", "Route cache hit");
            return Ok(data);
        }

        let _computing = self.compute.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = self.lookup(key) {
            debug!(key = %key, cache = "memory", "Route cache hit after wait");
            return Ok(data);
        }

        let data = loader()?;
        info!(key = %key, cache = "memory", "Route cache miss, stored");
        self.store(key, &data);
        Ok(data)
    }
}

/// Cache storing one `<key>.json` file per entry in a directory.
///
/// Files are written to a temporary name and renamed into place, so a
/// reader never sees a partial entry.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// A cache in `dir`; the directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, path: &Path, blob: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, blob)?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _removed = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

impl Cache for FileCache {
    fn get<H, F>(&self, key: &str, loader: F) -> Result<RouteData<H>>
    where
        H: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Result<RouteData<H>>,
    {
        let path = self.path_for(key);
        if let Some(blob) = self.read(&path)? {
            if let Some(data) = decode(key, &blob) {
                debug!(key = %key, path = %path.display(), cache = "file", "Route cache hit");
                return Ok(data);
            }
        }

        let data = loader()?;
        let blob = serde_json::to_string(&data)?;
        self.write(&path, &blob)?;
        info!(
            key = %key,
            path = %path.display(),
            cache = "file",
            bytes = blob.len(),
            "Route cache miss, stored"
        );
        Ok(data)
    }
}

/// A cache that always runs the loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl Cache for NullCache {
    fn get<H, F>(&self, _key: &str, loader: F) -> Result<RouteData<H>>
    where
        H: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Result<RouteData<H>>,
    {
        loader()
    }
}
