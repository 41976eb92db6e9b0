//! Snapshot Persistence
//!
//! The whole map is serialized to a single JSON file after every
//! acknowledged `put` and `delete`, and read back once at startup.
//!
//! ## File Format
//!
//! ```text
//! {
//!   "session": { "Value": "abc123", "ExpiresAt": "2024-01-31T00:00:00Z" },
//!   "user:1":  { "Value": "Ariz",   "ExpiresAt": "2024-02-14T09:30:00.250Z" }
//! }
//! ```
//!
//! `ExpiresAt` is an RFC 3339 timestamp. Timestamps with a non-UTC offset
//! are accepted on load and normalized to UTC.
//!
//! ## Write Protocol
//!
//! 1. Serialize the map (keys in sorted order)
//! 2. Write it to `<path>.tmp` and fsync
//! 3. Rename the temp file over `<path>`
//!
//! A reader of `<path>` therefore sees either the previous snapshot or the
//! new one, never a torn write.

use crate::storage::engine::Entry;
use crate::storage::error::SnapshotError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Where the store keeps its durable copy.
///
/// [`JsonFileSnapshot`] is the production implementation; tests plug in
/// their own to slow down or fail writes.
pub trait SnapshotStore: fmt::Debug + Send + Sync {
    /// Reads the complete persisted map.
    fn load(&self) -> Result<HashMap<String, Entry>, SnapshotError>;

    /// Replaces the persisted map with `entries`.
    fn save(&self, entries: &HashMap<String, Entry>) -> Result<(), SnapshotError>;
}

/// A snapshot stored as one JSON document on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn io_error(&self, path: &Path, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileSnapshot {
    fn load(&self) -> Result<HashMap<String, Entry>, SnapshotError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SnapshotError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let entries: HashMap<String, Entry> =
            serde_json::from_slice(&data).map_err(|source| SnapshotError::Decode {
                path: self.path.clone(),
                source,
            })?;

        trace!(path = %self.path.display(), entries = entries.len(), "Snapshot read");
        Ok(entries)
    }

    fn save(&self, entries: &HashMap<String, Entry>) -> Result<(), SnapshotError> {
        let ordered: BTreeMap<&String, &Entry> = entries.iter().collect();
        let data = serde_json::to_vec(&ordered).map_err(SnapshotError::Encode)?;

        let tmp = self.temp_path();
        let mut file = File::create(&tmp).map_err(|e| self.io_error(&tmp, e))?;
        if let Err(e) = file.write_all(&data).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(&tmp, e));
        }
        drop(file);

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(&self.path, e));
        }

        trace!(
            path = %self.path.display(),
            entries = entries.len(),
            bytes = data.len(),
            "Snapshot written"
        );
        Ok(())
    }
}
