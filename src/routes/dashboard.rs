use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garde::Validate;
use serde_json::json;

use crate::app_state::AppState;
use crate::models::surface::{
    ActionResponse, DashboardSnapshot, FilterStartedResponse, ReachOutResponse,
    SubmitSearchRequest, SubmitSearchResponse,
};
use crate::services::dashboard::CandidateRefresh;
use crate::services::lifecycle::DeleteOutcome;
use crate::services::notify::Notification;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// GET /api/v1/state: everything the UI renders.
pub async fn get_state(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}

/// GET /api/v1/notifications: drain pending user notifications.
pub async fn take_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.dashboard.take_notifications())
}

/// POST /api/v1/searches: start a new candidate search.
pub async fn submit_search(
    State(state): State<AppState>,
    Json(request): Json<SubmitSearchRequest>,
) -> Result<Json<SubmitSearchResponse>, Response> {
    request
        .validate()
        .map_err(|report| error_response(StatusCode::BAD_REQUEST, report.to_string()))?;

    let job_id = state
        .dashboard
        .submit_search(&request.query)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(SubmitSearchResponse {
        job_id,
        message: "search started".to_string(),
    }))
}

/// POST /api/v1/jobs/{job_id}/select
pub async fn select_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ActionResponse>, Response> {
    match state.dashboard.select_job(&job_id).await {
        CandidateRefresh::JobGone => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("search job {job_id} no longer exists"),
        )),
        _ => Ok(Json(ActionResponse {
            job_id,
            message: "selected".to_string(),
        })),
    }
}

/// POST /api/v1/jobs/{job_id}/pause
pub async fn pause_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ActionResponse>, Response> {
    state
        .dashboard
        .pause_job(&job_id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(ActionResponse {
        job_id,
        message: "paused".to_string(),
    }))
}

/// POST /api/v1/jobs/{job_id}/resume
pub async fn resume_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ActionResponse>, Response> {
    state
        .dashboard
        .resume_job(&job_id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(ActionResponse {
        job_id,
        message: "resumed".to_string(),
    }))
}

/// DELETE /api/v1/jobs/{job_id}
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ActionResponse>, Response> {
    match state
        .dashboard
        .delete_job(&job_id)
        .await
        .map_err(IntoResponse::into_response)?
    {
        DeleteOutcome::Deleted => Ok(Json(ActionResponse {
            job_id,
            message: "deleted".to_string(),
        })),
        DeleteOutcome::Rejected(reason) => {
            Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, reason))
        }
    }
}

/// POST /api/v1/filter/reapply: start a memory filter run in the background.
///
/// Progress is visible through `/api/v1/state` while the run drains.
pub async fn reapply_filter(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FilterStartedResponse>), Response> {
    let run = state
        .dashboard
        .begin_filter_run()
        .map_err(IntoResponse::into_response)?;
    let job_id = run.job_id().to_string();

    let dashboard = state.dashboard.clone();
    tokio::spawn(async move {
        // Failures are already logged and surfaced as notifications.
        let _ = dashboard.run_filter(run).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(FilterStartedResponse {
            job_id,
            message: "memory filter started".to_string(),
        }),
    ))
}

/// POST /api/v1/candidates/{candidate_id}/pass
pub async fn pass_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<i64>,
) -> Result<StatusCode, Response> {
    if state.dashboard.pass_candidate(candidate_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(StatusCode::NOT_FOUND, "candidate not found"))
    }
}

/// POST /api/v1/candidates/{candidate_id}/reach-out
pub async fn reach_out(
    State(state): State<AppState>,
    Path(candidate_id): Path<i64>,
) -> Result<Json<ReachOutResponse>, Response> {
    state
        .dashboard
        .reach_out(candidate_id)
        .map(|candidate| Json(ReachOutResponse { candidate }))
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "candidate not found"))
}
