//! API Module
//!
//! HTTP handlers and routing for the demonstration cache server. The server
//! is an illustrative user of the cache core; it adds key validation and
//! JSON framing but no caching semantics of its own.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /clear` - Remove all entries
//! - `GET /stats` - Aggregate cache statistics
//! - `GET /stats/shards` - Per-shard statistics
//! - `POST /stats/reset` - Zero the hit/miss counters
//! - `GET /memory` - Memory usage breakdown
//! - `GET /metrics` - Derived performance metrics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
