//! HTTP Transport Module
//!
//! Thin adapter between HTTP requests and the [`TtlStore`](crate::storage::TtlStore).
//! All parameters travel in the query string; the store does the real work.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  axum Router    │  (TraceLayer)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   handlers      │  extract params, map errors to status codes
//! └────────┬────────┘
//!          │ spawn_blocking
//!          ▼
//! ┌─────────────────┐
//! │    TtlStore     │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;
pub mod server;

pub use handler::{router, ApiError};
pub use server::serve;
