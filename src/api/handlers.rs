//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.
//!
//! Store calls block on the filesystem, so every handler runs them on the
//! blocking thread pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GcResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// `CacheStore` synchronizes through file locks, so it is shared as a plain
/// `Arc` with no async lock around it.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub cache: Arc<CacheStore>,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the cache store over the configured root.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheStore::open(config)?))
    }
}

/// Runs a store operation on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&CacheStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let cache = Arc::clone(&state.cache);
    tokio::task::spawn_blocking(move || op(&cache))
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetRequest { key, value, ttl } = req;
    let response_key = key.clone();
    blocking(&state, move |cache| {
        let ttl = ttl.unwrap_or_else(|| cache.default_ttl());
        cache.set(&key, &value, ttl)
    })
    .await??;

    Ok(Json(SetResponse::new(response_key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value = blocking(&state, move |cache| cache.get::<Value>(&lookup)).await?;

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache. Absent keys are not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    blocking(&state, move |cache| cache.delete(&target)).await??;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /gc
///
/// Runs a full sweep right away.
pub async fn gc_handler(State(state): State<AppState>) -> Result<Json<GcResponse>> {
    let removed = blocking(&state, |cache| cache.gc()).await?;
    Ok(Json(GcResponse { removed }))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Never;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> AppState {
        let store = CacheStore::open(&Config::with_root(dir.path()))
            .unwrap()
            .with_trigger(Never);
        AppState::new(store)
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        // Set a value
        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"answer": 42}),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        // Get the value
        let result = get_handler(State(state.clone()), Path("test_key".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, json!({"answer": 42}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        // Set a value first
        let req = SetRequest {
            key: "to_delete".to_string(),
            value: json!("value"),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        // Delete it
        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        // Verify it's gone
        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        // Deleting again still succeeds
        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_gc_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = gc_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.removed, 0);

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.gc_runs, 1);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let req = SetRequest {
            key: "".to_string(), // Empty key is invalid
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
