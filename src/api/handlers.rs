//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{Cache, CacheStats, MemoryInfo, PerformanceMetrics, ShardStats};
use crate::models::{
    DeleteResponse, ErrorResponse, GetResponse, HealthResponse, MessageResponse, SetRequest,
    SetResponse,
};

/// Application state shared across all handlers.
///
/// The cache is internally synchronized and cheap to clone, so no additional
/// locking is needed here.
#[derive(Clone)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    /// Creates a new AppState wrapping the given cache.
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

fn not_found(key: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Key not found: {}", key))),
    )
        .into_response()
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with an optional TTL in seconds.
pub async fn set_handler(State(state): State<AppState>, Json(req): Json<SetRequest>) -> Response {
    if let Some(message) = req.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response();
    }

    let SetRequest { key, value, ttl } = req;
    match state.cache.set(&key, value, ttl.map(Duration::from_secs)) {
        Ok(()) => Json(SetResponse::new(key)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache; missing and expired keys yield 404.
pub async fn get_handler(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.cache.get(&key) {
        Some(value) => Json(GetResponse::new(key, value)).into_response(),
        None => not_found(&key),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if state.cache.delete(&key) {
        Json(DeleteResponse::new(key)).into_response()
    } else {
        not_found(&key)
    }
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear();
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for GET /stats/shards
pub async fn shard_stats_handler(State(state): State<AppState>) -> Json<Vec<ShardStats>> {
    Json(state.cache.shard_stats())
}

/// Handler for POST /stats/reset
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.reset_stats();
    Json(MessageResponse::new("Statistics reset"))
}

/// Handler for GET /memory
pub async fn memory_handler(State(state): State<AppState>) -> Json<MemoryInfo> {
    Json(state.cache.memory_info())
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<PerformanceMetrics> {
    Json(state.cache.performance_metrics())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Value;
    use crate::config::Config;

    fn test_state() -> AppState {
        let config = Config {
            max_memory_bytes: 1024 * 1024,
            shard_count: 16,
            default_ttl: Duration::ZERO,
            cleanup_interval: Duration::from_secs(60),
        };
        AppState::new(Cache::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: Value::from("test_value"),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_handler(State(state.clone()), Path("test_key".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        state.cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let response = get_handler(State(state.clone()), Path("nonexistent".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        state.cache.set("to_delete", "value", None).unwrap();

        let response = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let req = SetRequest {
            key: "".to_string(),
            value: Value::from("value"),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        state.cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_on_closed_cache() {
        let state = test_state();
        state.cache.close().await.unwrap();

        let req = SetRequest {
            key: "key".to_string(),
            value: Value::from("value"),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
