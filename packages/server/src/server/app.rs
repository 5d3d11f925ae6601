//! Application setup and server configuration.
//!
//! The HTTP surface here is operational only: a health probe and manual
//! triggers for the background sweeps. Entity CRUD is served by the separate
//! admin API, which consumes this crate as a library.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::domains::locations::AddressSyncCoordinator;
use crate::domains::verification::VerificationScanner;
use crate::server::routes::{health_handler, resync_locations_handler, run_scan_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub scanner: Arc<VerificationScanner>,
    pub coordinator: Arc<AddressSyncCoordinator>,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/admin/verification/scan", post(run_scan_handler))
        .route("/admin/locations/resync", post(resync_locations_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state)),
        )
}
