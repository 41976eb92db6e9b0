//! Thread-Safe TTL Store Engine
//!
//! This module implements the core storage engine. It holds a map from key
//! to [`Entry`] (value plus absolute expiry timestamp) and mirrors the whole
//! map to a snapshot after every mutation.
//!
//! ## Design Decisions
//!
//! 1. **One lock**: a single `Mutex` guards the map. Gets, puts, deletes and
//!    the startup sweep each hold it for their full duration, including the
//!    snapshot write inside `put` and `delete`. No two mutations interleave
//!    and a reader never sees a half-applied write.
//! 2. **Synchronous persistence**: `put` and `delete` rewrite the complete
//!    snapshot before returning. Success means the file reflects the map as
//!    of that operation.
//! 3. **No rollback**: if the snapshot write fails the in-memory change is
//!    kept and the caller gets [`StoreError::Storage`]. Such a mutation may or
//!    may not be durable.
//! 4. **Lazy expiry**: expired entries are removed when a `get` touches them
//!    and by one sweep at startup. Those removals are not persisted by
//!    themselves.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        TtlStore                          │
//! │                                                          │
//! │   get ──┐                                                │
//! │   put ──┼──> Mutex<HashMap<String, Entry>> ──> snapshot  │
//! │   del ──┤         (held across the write)       (file)   │
//! │ sweep ──┘                                                │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::storage::error::{SnapshotError, StoreError};
use crate::storage::expiry::{self, DEFAULT_TTL_SECS};
use crate::storage::snapshot::{JsonFileSnapshot, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A stored value with its expiry time.
///
/// Field names on disk match the snapshot format (`Value`, `ExpiresAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The stored value, replaced wholesale on overwrite
    #[serde(rename = "Value")]
    pub value: String,
    /// After this instant the entry is logically absent
    #[serde(rename = "ExpiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Checks if this entry has expired as of `now`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired(self.expires_at, now)
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// What happened during [`TtlStore::bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    /// Entries read from the snapshot
    pub loaded: usize,
    /// Entries removed by the startup sweep
    pub expired: usize,
}

/// The TTL store engine.
///
/// Wrap it in an `Arc` to share it between request handlers. All methods
/// take `&self`.
///
/// # Example
///
/// ```no_run
/// use ttlkv::storage::TtlStore;
///
/// let store = TtlStore::with_file("store.json");
/// store.bootstrap();
///
/// store.put("name", "Ariz", Some(60)).unwrap();
/// assert_eq!(store.get(&["name"]).unwrap(), vec!["name: Ariz".to_string()]);
///
/// store.delete("name").unwrap();
/// assert!(store.delete("name").unwrap_err().is_not_found());
/// ```
pub struct TtlStore {
    /// The key space
    entries: Mutex<HashMap<String, Entry>>,

    /// Durable copy of `entries`, owned exclusively by this store
    snapshot: Box<dyn SnapshotStore>,

    /// TTL applied when `put` is given none
    default_ttl_secs: u64,

    /// Statistics: total get calls
    get_count: AtomicU64,

    /// Statistics: total successful puts
    put_count: AtomicU64,

    /// Statistics: total successful deletes
    del_count: AtomicU64,

    /// Statistics: entries removed because they expired
    expired_count: AtomicU64,

    /// Statistics: snapshot writes that failed
    storage_failures: AtomicU64,
}

impl std::fmt::Debug for TtlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlStore")
            .field("snapshot", &self.snapshot)
            .field("default_ttl_secs", &self.default_ttl_secs)
            .field("keys", &self.entries.try_lock().map(|e| e.len()).ok())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("put_count", &self.put_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl TtlStore {
    /// Creates an empty store persisting to `snapshot`.
    pub fn new(snapshot: impl SnapshotStore + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            snapshot: Box::new(snapshot),
            default_ttl_secs: DEFAULT_TTL_SECS,
            get_count: AtomicU64::new(0),
            put_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            storage_failures: AtomicU64::new(0),
        }
    }

    /// Creates an empty store persisting to a JSON file at `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileSnapshot::new(path))
    }

    /// Overrides the TTL used when `put` is called without one.
    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Acquires the map lock.
    ///
    /// Every mutation is a single insert or remove, so a map left behind by
    /// a panicking holder is still consistent and the poison is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the map while the caller still holds the lock.
    fn persist(&self, entries: &HashMap<String, Entry>) -> Result<(), StoreError> {
        self.snapshot.save(entries).map_err(|e| {
            self.storage_failures.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "Snapshot write failed, in-memory change kept");
            StoreError::Storage(e)
        })
    }

    /// Looks up one or more keys.
    ///
    /// Returns `"key: value"` for every requested key that is present and
    /// unexpired, in request order (duplicates repeat). Missing keys are
    /// skipped silently. Expired keys are removed from the map and skipped;
    /// that removal is not written to the snapshot.
    ///
    /// Fails with `BadRequest` only if `keys` is empty.
    pub fn get<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<String>, StoreError> {
        self.get_with(keys, Utc::now)
    }

    /// [`get`](Self::get) evaluated at the instant `now`.
    pub fn get_at<S: AsRef<str>>(
        &self,
        keys: &[S],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        self.get_with(keys, || now)
    }

    /// The clock is read only once the lock is held, so time spent waiting
    /// behind another operation does not count against any entry.
    fn get_with<S, C>(&self, keys: &[S], clock: C) -> Result<Vec<String>, StoreError>
    where
        S: AsRef<str>,
        C: FnOnce() -> DateTime<Utc>,
    {
        if keys.is_empty() {
            return Err(StoreError::bad_request("missing key parameter"));
        }

        self.get_count.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.lock();
        let now = clock();
        let mut values = Vec::with_capacity(keys.len());

        for key in keys {
            let key = key.as_ref();
            let expired = match entries.get(key) {
                Some(entry) if entry.is_expired_at(now) => true,
                Some(entry) => {
                    values.push(format!("{}: {}", key, entry.value));
                    false
                }
                None => false,
            };

            if expired {
                entries.remove(key);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Expired key removed on read");
            }
        }

        Ok(values)
    }

    /// Inserts or overwrites `key`.
    ///
    /// The entry expires `ttl_secs` seconds from now, or after the store's
    /// default TTL when `None`. The full snapshot is rewritten before this
    /// returns.
    ///
    /// # Errors
    ///
    /// - `BadRequest` if `key` or `value` is empty or the TTL is out of range;
    ///   nothing is changed.
    /// - `Storage` if the snapshot write failed; the new entry is still
    ///   visible in memory.
    pub fn put(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), StoreError> {
        self.put_with(key, value, ttl_secs, Utc::now)
    }

    /// [`put`](Self::put) with the expiry computed from `now`.
    pub fn put_at(
        &self,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.put_with(key, value, ttl_secs, || now)
    }

    /// Computes the expiry from `clock()` under the lock, so the TTL starts
    /// when the write is applied rather than when the caller arrived.
    fn put_with<C>(
        &self,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
        clock: C,
    ) -> Result<(), StoreError>
    where
        C: FnOnce() -> DateTime<Utc>,
    {
        if key.is_empty() || value.is_empty() {
            return Err(StoreError::bad_request("missing key or value"));
        }

        let ttl_secs = ttl_secs.unwrap_or(self.default_ttl_secs);

        let mut entries = self.lock();
        let expires_at = expiry::expires_at(clock(), ttl_secs)?;
        entries.insert(key.to_string(), Entry::new(value, expires_at));
        debug!(key = %key, ttl_secs = ttl_secs, "Key stored");

        self.persist(&entries)?;
        self.put_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Removes `key` and rewrites the snapshot.
    ///
    /// An expired entry that has not been swept yet still counts as present
    /// here, so deleting it succeeds.
    ///
    /// # Errors
    ///
    /// - `BadRequest` if `key` is empty
    /// - `NotFound` if the key is not stored; no snapshot write happens
    /// - `Storage` if the snapshot write failed; the key stays removed
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::bad_request("missing key"));
        }

        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Err(StoreError::NotFound);
        }
        debug!(key = %key, "Key deleted");

        self.persist(&entries)?;
        self.del_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Removes every expired entry. The removals are not persisted.
    ///
    /// # Returns
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_with(Utc::now)
    }

    /// [`sweep_expired`](Self::sweep_expired) evaluated at the instant `now`.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        self.sweep_with(|| now)
    }

    fn sweep_with<C: FnOnce() -> DateTime<Utc>>(&self, clock: C) -> usize {
        let mut entries = self.lock();
        let now = clock();
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - entries.len();
        if removed > 0 {
            self.expired_count.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(expired = removed, remaining = entries.len(), "Expired keys swept");
        }
        removed
    }

    /// Replaces the in-memory map with the persisted snapshot.
    ///
    /// On any error (including a missing file) the store is left empty and
    /// the error is returned so the caller can decide how to report it.
    ///
    /// # Returns
    ///
    /// Returns the number of entries loaded.
    pub fn load_snapshot(&self) -> Result<usize, SnapshotError> {
        let mut entries = self.lock();
        match self.snapshot.load() {
            Ok(loaded) => {
                *entries = loaded;
                Ok(entries.len())
            }
            Err(e) => {
                entries.clear();
                Err(e)
            }
        }
    }

    /// Writes the current map to the snapshot.
    pub fn save_snapshot(&self) -> Result<(), SnapshotError> {
        let entries = self.lock();
        self.snapshot.save(&entries)
    }

    /// Runs the startup sequence: load the snapshot, then sweep.
    ///
    /// Sweeping after the load removes entries that expired while the
    /// process was down. A missing or unreadable snapshot is logged and the
    /// store starts empty.
    pub fn bootstrap(&self) -> StartupReport {
        let loaded = match self.load_snapshot() {
            Ok(n) => {
                info!(entries = n, "Snapshot loaded");
                n
            }
            Err(e) if e.is_missing() => {
                info!("No existing data found, starting empty");
                0
            }
            Err(e) => {
                warn!(error = %e, "Snapshot could not be loaded, starting empty");
                0
            }
        };

        let expired = self.sweep_expired();
        if expired > 0 {
            info!(expired = expired, "Expired entries removed at startup");
        }

        StartupReport { loaded, expired }
    }

    /// Returns the number of entries held in memory, including expired
    /// entries that have not been removed yet.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            put_ops: self.put_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of entries currently held
    pub keys: u64,
    /// Total get calls
    pub get_ops: u64,
    /// Total successful puts
    pub put_ops: u64,
    /// Total successful deletes
    pub del_ops: u64,
    /// Total expired entries removed
    pub expired: u64,
    /// Total failed snapshot writes
    pub storage_failures: u64,
}
