//! Storage Engine Module
//!
//! This module provides the core storage functionality for ttlkv: a
//! thread-safe key-value map with per-entry TTL whose full contents are
//! mirrored to a JSON snapshot on every mutation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TtlStore                             │
//! │        Mutex<HashMap<String, Entry { value, expires_at }>>  │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ put / delete (lock held)
//!                            ▼
//!              ┌───────────────────────────┐
//!              │      SnapshotStore        │
//!              │  (JsonFileSnapshot: file) │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single Lock**: reads and writes are fully serialized
//! - **Synchronous Snapshots**: an acknowledged write is on disk
//! - **Lazy Expiry**: expired keys are removed when read
//! - **Startup Sweep**: expired keys in the loaded snapshot are removed once
//!
//! ## Example
//!
//! ```no_run
//! use ttlkv::storage::TtlStore;
//!
//! let store = TtlStore::with_file("store.json");
//! store.bootstrap();
//!
//! store.put("session", "token123", Some(3600)).unwrap();
//! let values = store.get(&["session", "missing"]).unwrap();
//! assert_eq!(values, vec!["session: token123".to_string()]);
//! ```

pub mod engine;
pub mod error;
pub mod expiry;
pub mod snapshot;

// Re-export commonly used types
pub use engine::{Entry, StartupReport, StoreStats, TtlStore};
pub use error::{SnapshotError, StoreError};
pub use expiry::{parse_ttl, DEFAULT_TTL_SECS};
pub use snapshot::{JsonFileSnapshot, SnapshotStore};
