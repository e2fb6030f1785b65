use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::services::api::ApiError;
use crate::services::dashboard::DashboardError;

pub mod dashboard;
pub mod health;
pub mod metrics;

/// Build the local HTTP surface the browser UI binds to.
pub fn router(state: AppState, prometheus: Option<Arc<PrometheusHandle>>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/state", get(dashboard::get_state))
        .route("/api/v1/notifications", get(dashboard::take_notifications))
        .route("/api/v1/searches", post(dashboard::submit_search))
        .route("/api/v1/jobs/{job_id}", delete(dashboard::delete_job))
        .route("/api/v1/jobs/{job_id}/select", post(dashboard::select_job))
        .route("/api/v1/jobs/{job_id}/pause", post(dashboard::pause_job))
        .route("/api/v1/jobs/{job_id}/resume", post(dashboard::resume_job))
        .route("/api/v1/filter/reapply", post(dashboard::reapply_filter))
        .route(
            "/api/v1/candidates/{candidate_id}/pass",
            post(dashboard::pass_candidate),
        )
        .route(
            "/api/v1/candidates/{candidate_id}/reach-out",
            post(dashboard::reach_out),
        )
        .with_state(state);

    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(handle),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::InvalidQuery | DashboardError::NoSelection => StatusCode::BAD_REQUEST,
            DashboardError::Busy => StatusCode::CONFLICT,
            DashboardError::Remote(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
            DashboardError::Remote(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
