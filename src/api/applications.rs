//! Job application endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::approval::Decision;
use crate::models::{ApprovalDetails, JobApplication, NewApplication};
use crate::AppState;

/// POST /api/applications - Submit a job application.
///
/// Succeeds once the local copy is saved, whether or not the remote store kept up.
pub async fn submit_application(
    State(state): State<AppState>,
    Json(request): Json<NewApplication>,
) -> ApiResult<JobApplication> {
    let application = state.gateway.submit_application(request).await?;
    success(application)
}

/// GET /api/admin/applications - Remote and local applications, newest first.
pub async fn list_applications(State(state): State<AppState>) -> ApiResult<Vec<JobApplication>> {
    success(state.gateway.fetch_applications().await)
}

/// POST /api/admin/applications/{id}/approve - Approve and notify the applicant.
pub async fn approve_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<ApprovalDetails>,
) -> ApiResult<Decision> {
    let decision = state.approvals.approve(&id, form).await?;
    success(decision)
}

/// POST /api/admin/applications/{id}/reject
pub async fn reject_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Decision> {
    let decision = state.approvals.reject(&id).await?;
    success(decision)
}
