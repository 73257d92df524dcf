//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer-token authentication middleware and extractors
//! - `ApiError`, the mapping from domain errors to HTTP responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::iter::once;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, http::header::AUTHORIZATION};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use armas_core::storage::StorageService;
use armas_db::WorkflowRepository;
use armas_shared::{FeatureFlags, JwtService};

pub use error::{ApiError, ApiResult};

/// Multipart framing on top of the largest accepted report file.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Report file archive.
    pub storage: Arc<StorageService>,
    /// Optional authorization features.
    pub features: FeatureFlags,
    /// Re-resolve authorities from the database on every request instead of
    /// trusting the token snapshot.
    pub refresh_authorities: bool,
}

impl AppState {
    /// Workflow repository bound to this state's database and archive.
    #[must_use]
    pub fn workflow(&self) -> WorkflowRepository {
        WorkflowRepository::new((*self.db).clone(), (*self.storage).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let body_limit = state
        .storage
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
