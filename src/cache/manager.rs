//! Cache manager for persisting restaurants to disk
//!
//! Provides a `CacheManager` that stores restaurant records keyed by id in a
//! single JSON document. Every operation opens the document, applies its change
//! and writes it back, so no file handle outlives a call.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

use crate::data::{Restaurant, RestaurantId};

/// File name of the restaurant document inside the cache directory
pub const CACHE_FILE: &str = "restaurants.json";

/// Current layout version of the cache document
///
/// Documents without a version (written before versioning existed) are read as
/// version 0 and upgraded in place; their rows are kept.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The cache document could not be encoded or decoded
    #[error("Cache document is invalid: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cache cannot be used at all
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// On-disk layout of the restaurant store
#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    /// Layout version the document was written with
    #[serde(default)]
    schema_version: u32,
    /// When the document was last written
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    /// Records keyed by restaurant id
    #[serde(default)]
    records: BTreeMap<RestaurantId, Restaurant>,
}

impl CacheDocument {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            updated_at: None,
            records: BTreeMap::new(),
        }
    }
}

/// Manages reading and writing the restaurant store
///
/// The store lives in an XDG-compliant cache directory (`~/.cache/restoview/`
/// on Linux) unless a directory is given explicitly. Clones share a lock, so
/// read-modify-write cycles from one process never interleave.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where the cache document is stored
    cache_dir: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Arc<Mutex<()>>,
}

impl CacheManager {
    /// Creates a new CacheManager using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "restoview")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Directory holding the cache document
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache document
    fn document_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// Reads every cached restaurant in ascending id order
    ///
    /// A missing document is an empty store.
    pub fn read_all(&self) -> Result<Vec<Restaurant>, CacheError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let document = self.load()?;
        Ok(document.records.into_values().collect())
    }

    /// Inserts or replaces one restaurant by id
    pub fn upsert(&self, restaurant: &Restaurant) -> Result<(), CacheError> {
        self.upsert_many(std::slice::from_ref(restaurant))
    }

    /// Inserts or replaces each restaurant by id, keeping all other rows
    pub fn upsert_many(&self, restaurants: &[Restaurant]) -> Result<(), CacheError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut document = self.load()?;
        for restaurant in restaurants {
            document.records.insert(restaurant.id.clone(), restaurant.clone());
        }
        debug!(count = restaurants.len(), "Upserting cached restaurants");
        self.store(document)
    }

    /// Replaces the whole store with the given restaurants
    ///
    /// Rows whose id is not in `restaurants` are dropped. An unreadable
    /// existing document is overwritten rather than reported.
    pub fn mirror(&self, restaurants: &[Restaurant]) -> Result<(), CacheError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut document = CacheDocument::empty();
        document.records = restaurants
            .iter()
            .map(|restaurant| (restaurant.id.clone(), restaurant.clone()))
            .collect();
        debug!(count = document.records.len(), "Mirroring restaurants into cache");
        self.store(document)
    }

    /// Opens the document, upgrading older layouts
    fn load(&self) -> Result<CacheDocument, CacheError> {
        let content = match fs::read_to_string(self.document_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheDocument::empty()),
            Err(e) => return Err(e.into()),
        };

        let mut document: CacheDocument = serde_json::from_str(&content)?;

        if document.schema_version > SCHEMA_VERSION {
            return Err(CacheError::Unavailable(format!(
                "cache schema v{} is newer than supported v{}",
                document.schema_version, SCHEMA_VERSION
            )));
        }
        if document.schema_version < SCHEMA_VERSION {
            debug!(
                from = document.schema_version,
                to = SCHEMA_VERSION,
                "Upgrading cache document"
            );
            document.schema_version = SCHEMA_VERSION;
        }

        Ok(document)
    }

    /// Writes the document through a temporary file and a rename
    fn store(&self, mut document: CacheDocument) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;

        document.schema_version = SCHEMA_VERSION;
        document.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&document)?;

        let tmp_path = self.cache_dir.join(format!("{}.tmp", CACHE_FILE));
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, self.document_path())?;
        Ok(())
    }
}
