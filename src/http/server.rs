//! HTTP Server
//!
//! Serves the store router on an already-bound listener until the shutdown
//! future resolves.

use crate::http::handler::router;
use crate::storage::TtlStore;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Runs the HTTP server.
///
/// In-flight requests are allowed to finish once `shutdown` resolves. No
/// snapshot is written at shutdown: every acknowledged mutation is already
/// on disk.
pub async fn serve<F>(listener: TcpListener, store: Arc<TtlStore>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}
