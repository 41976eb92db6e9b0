//! # ttlkv - An In-Memory Key-Value Store with Per-Key TTL
//!
//! ttlkv keeps string keys and values in memory, expires each entry after
//! its own time-to-live, and mirrors the whole key space to a single JSON
//! file on every write. It is served over plain HTTP with query-string
//! parameters.
//!
//! ## Features
//!
//! - **Per-Key TTL**: every entry carries an absolute expiry timestamp
//!   (30 days unless the writer says otherwise)
//! - **Durable Writes**: a successful `put` or `delete` has already been
//!   written to the snapshot file
//! - **Strict Consistency**: a single lock serializes every read and write
//! - **Async I/O**: served by axum on Tokio; store calls run on the blocking
//!   pool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                               ttlkv                                 │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────────────┐ │
//! │  │ HTTP Server │───>│  Handlers   │───>│        TtlStore          │ │
//! │  │   (axum)    │    │ /GET /PUT   │    │  Mutex<HashMap<..>>      │ │
//! │  └─────────────┘    │ /DELETE     │    └────────────┬─────────────┘ │
//! │                     └─────────────┘                 │ every write   │
//! │                                                     ▼               │
//! │                                          ┌──────────────────────┐   │
//! │                                          │  store.json snapshot │   │
//! │                                          └──────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use ttlkv::storage::TtlStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(TtlStore::with_file("store.json"));
//!     store.bootstrap();
//!
//!     let listener = TcpListener::bind("0.0.0.0:8080").await?;
//!     ttlkv::http::serve(listener, store, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Startup
//!
//! The snapshot is loaded first and then swept, so entries that expired
//! while the server was down are dropped before the first request.
//!
//! ## Module Overview
//!
//! - [`storage`]: the TTL store engine, expiry rules and snapshot persistence
//! - [`http`]: HTTP routes and server
//! - [`config`]: command-line configuration

pub mod config;
pub mod http;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::Config;
pub use storage::{StoreError, TtlStore};

/// The default port ttlkv listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host ttlkv binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// The default snapshot file
pub const DEFAULT_SNAPSHOT_PATH: &str = "store.json";

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
