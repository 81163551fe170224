// Cache store for reading and writing persisted entries.
// Handles JSON serialization and atomic filesystem writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Wrapper for a persisted cache entry with metadata.
///
/// Entries never expire; they live until the storage directory is cleared
/// externally. `cached_at` is recorded for inspection only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// Read a persisted entry from a file. Returns `None` if the file does not exist.
pub fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let cached: CachedData<T> = serde_json::from_str(&contents)?;
    Ok(Some(cached))
}

/// Write an entry to disk as JSON.
pub fn write_entry<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let cached = CachedData::new(data);
    let json = serde_json::to_string_pretty(&cached)?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
