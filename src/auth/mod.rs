//! Admin session and the dashboard auth middleware.
//!
//! There is a single admin credential pair. A successful login issues a bearer
//! token that stays valid until logout. Credential checks use constant-time comparison.

use std::sync::{Arc, RwLock};

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::config::AdminCredentials;
use crate::errors::AppError;

/// Header name for the session token.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication state for the admin dashboard.
pub struct AdminSession {
    credentials: AdminCredentials,
    token: RwLock<Option<String>>,
}

impl AdminSession {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials,
            token: RwLock::new(None),
        }
    }

    /// Check the pair and start a session. A mismatch leaves the current state alone.
    pub fn login(&self, identifier: &str, secret: &str) -> Option<String> {
        let email_ok = constant_time_compare(identifier, &self.credentials.email);
        let password_ok = constant_time_compare(secret, &self.credentials.password);
        if !(email_ok & password_ok) {
            tracing::warn!("Rejected admin login attempt");
            return None;
        }

        let token = uuid::Uuid::new_v4().simple().to_string();
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        tracing::info!("Admin logged in");
        Some(token)
    }

    pub fn logout(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        tracing::info!("Admin logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// True when `provided` is the token of the active session.
    pub fn authorize(&self, provided: &str) -> bool {
        match self.token.read().unwrap_or_else(|e| e.into_inner()).as_deref() {
            Some(active) => constant_time_compare(provided, active),
            None => false,
        }
    }
}

/// Middleware guarding the dashboard routes.
pub async fn require_admin(session: Arc<AdminSession>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .or_else(|| request.headers().get(header::AUTHORIZATION))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s).to_string());

    match provided {
        Some(token) if session.authorize(&token) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Invalid or expired session".to_string()).into_response(),
        None => AppError::Unauthorized("Admin login required".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
