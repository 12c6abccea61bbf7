//! CloseGuard Report Service
//!
//! HTTP service that runs the disclosure engine over submitted document text
//! and keeps the resulting reports in memory.
//! Binds to 127.0.0.1 by default (internal only).

pub mod config;
mod error;
mod handlers;
mod state;
mod types;
mod validate;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use state::{AppState, ReportStore};
pub use types::{AnalyzeRequest, Report, ReportList, ReportMetadata, ReportStatus, ReportSummary};

pub fn router(state: Arc<AppState>) -> Router {
  let body_limit = state.config.body_limit();
  Router::new()
    .route("/", get(handlers::root))
    .route("/health", get(handlers::health))
    .route("/analyze", post(handlers::analyze))
    .route("/reports", get(handlers::list_reports))
    .route(
      "/report/:id",
      get(handlers::get_report).delete(handlers::delete_report),
    )
    .route("/debug/rules", get(handlers::debug_rules))
    .route("/rules/reload", post(handlers::reload_rules))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(CorsLayer::permissive())
    .with_state(state)
}
