//! Admin session endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::notify::NotifierStatus;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub email: String,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    match state.session.login(&request.email, &request.password) {
        Some(token) => success(LoginResponse { token }),
        None => Err(AppError::Unauthorized("Invalid email or password".to_string())),
    }
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AppState>) -> ApiResult<()> {
    state.session.logout();
    success(())
}

/// GET /api/admin/session - Only reachable with a valid token.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionInfo> {
    success(SessionInfo {
        authenticated: state.session.is_authenticated(),
        email: state.config.admin.email.clone(),
    })
}

/// GET /api/admin/notifier - Whether approval emails can be sent.
pub async fn notifier_status(State(state): State<AppState>) -> ApiResult<NotifierStatus> {
    success(state.approvals.notifier().status())
}
