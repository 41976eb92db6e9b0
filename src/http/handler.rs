//! Request Handlers
//!
//! Translates query-string requests into [`TtlStore`] calls and store
//! results into HTTP responses.
//!
//! ## Routes
//!
//! | Path      | Parameters                  | Success                      |
//! |-----------|-----------------------------|------------------------------|
//! | `/`       |                             | 200, usage text              |
//! | `/GET`    | `key` (repeatable)          | 200, JSON array of `k: v`    |
//! | `/PUT`    | `key`, `value`, `ttl` (opt) | 201, `key k added ...`       |
//! | `/DELETE` | `key`                       | 200, `key k deleted ...`     |
//!
//! Any HTTP method is accepted on every path. Unknown paths get the usage
//! text, the same as `/`.
//!
//! ## Error Mapping
//!
//! ```text
//! StoreError::BadRequest  ──> 400  <message>
//! StoreError::NotFound    ──> 404  key not found
//! StoreError::Storage     ──> 500  error saving data
//! ```

use crate::storage::{parse_ttl, StoreError, TtlStore};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Raw query pairs, in order. Keeps repeated parameters such as `key=a&key=b`.
type Params = Vec<(String, String)>;

const USAGE: &str = "\
ttlkv - key-value store with per-key TTL

  GET    /GET?key=<k>[&key=<k>...]          look up one or more keys
  PUT    /PUT?key=<k>&value=<v>[&ttl=<s>]   store a value (default ttl: 30 days)
  DELETE /DELETE?key=<k>                    remove a key
";

/// Builds the router for all store endpoints.
pub fn router(store: Arc<TtlStore>) -> Router {
    Router::new()
        .route("/", any(usage_handler))
        .route("/GET", any(get_handler))
        .route("/PUT", any(put_handler))
        .route("/DELETE", any(delete_handler))
        .fallback(usage_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// An error response: status plus plain-text body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadRequest(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),
            StoreError::NotFound => ApiError::new(StatusCode::NOT_FOUND, "key not found"),
            StoreError::Storage(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "error saving data")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Returns the first value of `name`, if present.
fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Returns every value of `name`, in order.
fn params_all(params: &Params, name: &str) -> Vec<String> {
    params
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Runs a store call on the blocking pool.
///
/// Store calls hold a std mutex across synchronous file I/O, so they must
/// not run on the async worker threads.
async fn run_blocking<T, F>(store: &Arc<TtlStore>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&TtlStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            error!(error = %e, "Store task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })?;

    Ok(result?)
}

async fn usage_handler() -> &'static str {
    USAGE
}

/// GET ?key=...&key=...
async fn get_handler(
    State(store): State<Arc<TtlStore>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<String>>, ApiError> {
    let keys = params_all(&params, "key");
    let values = run_blocking(&store, move |store| store.get(&keys)).await?;
    Ok(Json(values))
}

/// PUT ?key=&value=[&ttl=]
async fn put_handler(
    State(store): State<Arc<TtlStore>>,
    Query(params): Query<Params>,
) -> Result<(StatusCode, String), ApiError> {
    let key = param(&params, "key").unwrap_or_default().to_string();
    let value = param(&params, "value").unwrap_or_default().to_string();

    if key.is_empty() || value.is_empty() {
        return Err(StoreError::bad_request("missing key or value").into());
    }

    let ttl = parse_ttl(param(&params, "ttl"))?;
    if ttl.is_none() {
        info!(
            key = %key,
            default_ttl_secs = store.default_ttl_secs(),
            "missing ttl, using default"
        );
    }

    let stored = key.clone();
    run_blocking(&store, move |store| store.put(&stored, &value, ttl)).await?;

    Ok((
        StatusCode::CREATED,
        format!("key {} added successfully", key),
    ))
}

/// DELETE ?key=
async fn delete_handler(
    State(store): State<Arc<TtlStore>>,
    Query(params): Query<Params>,
) -> Result<(StatusCode, String), ApiError> {
    let key = param(&params, "key").unwrap_or_default().to_string();

    let deleted = key.clone();
    run_blocking(&store, move |store| store.delete(&deleted)).await?;

    Ok((StatusCode::OK, format!("key {} deleted successfully", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Entry, SnapshotError, SnapshotStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn create_router() -> (TempDir, Arc<TtlStore>, Router) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TtlStore::with_file(dir.path().join("store.json")));
        let app = router(Arc::clone(&store));
        (dir, store, app)
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[derive(Debug)]
    struct ReadOnlySnapshot;

    impl SnapshotStore for ReadOnlySnapshot {
        fn load(&self) -> Result<HashMap<String, Entry>, SnapshotError> {
            Ok(HashMap::new())
        }

        fn save(&self, _entries: &HashMap<String, Entry>) -> Result<(), SnapshotError> {
            Err(SnapshotError::Io {
                path: PathBuf::from("store.json"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[tokio::test]
    async fn test_usage() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/PUT?key="));
    }

    #[tokio::test]
    async fn test_put_get() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::PUT, "/PUT?key=name&value=Ariz&ttl=60").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, "key name added successfully");

        let (status, body) = send(&app, Method::GET, "/GET?key=name").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"["name: Ariz"]"#);
    }

    #[tokio::test]
    async fn test_get_multiple_keys() {
        let (_dir, _, app) = create_router();

        send(&app, Method::GET, "/PUT?key=a&value=1").await;
        send(&app, Method::GET, "/PUT?key=b&value=two%20words").await;

        let (status, body) = send(&app, Method::GET, "/GET?key=b&key=missing&key=a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"["b: two words","a: 1"]"#);
    }

    #[tokio::test]
    async fn test_get_nothing_found() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::GET, "/GET?key=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_get_without_key() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::GET, "/GET").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing key parameter");
    }

    #[tokio::test]
    async fn test_put_missing_arguments() {
        let (_dir, store, app) = create_router();

        for uri in ["/PUT", "/PUT?key=a", "/PUT?value=1", "/PUT?key=&value=1"] {
            let (status, body) = send(&app, Method::PUT, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, "missing key or value");
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_invalid_ttl() {
        let (_dir, store, app) = create_router();

        for uri in ["/PUT?key=a&value=1&ttl=abc", "/PUT?key=a&value=1&ttl=-3"] {
            let (status, body) = send(&app, Method::PUT, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body.starts_with("invalid ttl"));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_without_ttl_uses_default() {
        let (_dir, store, app) = create_router();

        let (status, _) = send(&app, Method::PUT, "/PUT?key=x&value=y").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.get(&["x"]).unwrap(), vec!["x: y"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, _, app) = create_router();

        send(&app, Method::PUT, "/PUT?key=k&value=v").await;

        let (status, body) = send(&app, Method::DELETE, "/DELETE?key=k").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "key k deleted successfully");

        let (_, body) = send(&app, Method::GET, "/GET?key=k").await;
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::DELETE, "/DELETE?key=ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "key not found");
    }

    #[tokio::test]
    async fn test_delete_without_key() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::DELETE, "/DELETE").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing key");
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let store = Arc::new(TtlStore::new(ReadOnlySnapshot));
        let app = router(Arc::clone(&store));

        let (status, body) = send(&app, Method::PUT, "/PUT?key=k&value=v").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "error saving data");

        // Not rolled back
        let (_, body) = send(&app, Method::GET, "/GET?key=k").await;
        assert_eq!(body, r#"["k: v"]"#);

        let (status, _) = send(&app, Method::DELETE, "/DELETE?key=k").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_gets_usage() {
        let (_dir, _, app) = create_router();

        let (status, body) = send(&app, Method::GET, "/UNKNOWN").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/PUT?key="));
    }
}
