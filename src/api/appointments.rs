//! Appointment and contact endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::{Appointment, NewAppointment, NewContactMessage};
use crate::AppState;

/// POST /api/appointments - Book an appointment.
pub async fn submit_appointment(
    State(state): State<AppState>,
    Json(request): Json<NewAppointment>,
) -> ApiResult<Appointment> {
    let appointment = state.gateway.submit_appointment(request).await?;
    success(appointment)
}

/// GET /api/admin/appointments - Newest first; empty when the remote store is down.
pub async fn list_appointments(State(state): State<AppState>) -> ApiResult<Vec<Appointment>> {
    success(state.gateway.fetch_appointments().await)
}

/// POST /api/contacts - Store a contact form message.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<NewContactMessage>,
) -> ApiResult<()> {
    state.gateway.submit_contact(request).await?;
    success(())
}
