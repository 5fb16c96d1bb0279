//! revu-bd library - Business Directory scoring and entitlement service
//!
//! Wraps revu-common with the batch rating recompute driver and a small REST
//! API used by feature gates and administrators.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod recompute;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Businesses recomputed concurrently by `POST /api/recompute`
    pub concurrency: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, concurrency: usize) -> Self {
        Self { db, concurrency }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        .route("/api/businesses/:guid/features", get(api::get_features))
        .route("/api/businesses/:guid/quota/email", get(api::get_email_quota))
        .route("/api/businesses/:guid/quota/update", get(api::get_update_quota))
        .route("/api/businesses/:guid/overrides", put(api::put_overrides))
        .route("/api/businesses/:guid/plan", put(api::put_plan))
        .route("/api/recompute", post(api::post_recompute));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
