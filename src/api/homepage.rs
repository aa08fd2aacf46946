//! Homepage CMS endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::HomepageContent;
use crate::AppState;

/// GET /api/homepage - Current homepage content, or `null` before the first edit.
pub async fn get_homepage(State(state): State<AppState>) -> ApiResult<Option<HomepageContent>> {
    success(state.gateway.get_homepage_content().await?)
}

/// PUT /api/admin/homepage - Replace the homepage content.
pub async fn update_homepage(
    State(state): State<AppState>,
    Json(content): Json<HomepageContent>,
) -> ApiResult<HomepageContent> {
    let saved = state.gateway.update_homepage_content(content).await?;
    success(saved)
}
