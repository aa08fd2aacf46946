//! EmailJS REST notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Notifier, NotifierStatus, NotifyOutcome};
use crate::config::EmailConfig;
use crate::models::{ApprovalDetails, JobApplication};

const SEND_PATH: &str = "api/v1.0/email/send";

/// Sends approval emails through the EmailJS `email/send` endpoint.
pub struct EmailJsNotifier {
    http: Client,
    config: EmailConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    to_name: &'a str,
    to_email: &'a str,
    approved_position: &'a str,
    amount: &'a str,
    start_date: &'a str,
    department: &'a str,
    notes: &'a str,
    applicant_photo: &'a str,
}

impl EmailJsNotifier {
    pub fn new(config: EmailConfig, http: Client) -> Self {
        Self { http, config }
    }

    /// The three ids, or the name of the first missing one.
    fn credentials(&self) -> Result<(&str, &str, &str), &'static str> {
        let service = self
            .config
            .service_id
            .as_deref()
            .ok_or("EMAILJS_SERVICE_ID")?;
        let template = self
            .config
            .template_id
            .as_deref()
            .ok_or("EMAILJS_TEMPLATE_ID")?;
        let key = self
            .config
            .public_key
            .as_deref()
            .ok_or("EMAILJS_PUBLIC_KEY")?;
        Ok((service, template, key))
    }

    async fn send(&self, request: &SendRequest<'_>) -> Result<(), String> {
        let url = self
            .config
            .base_url
            .join(SEND_PATH)
            .map_err(|e| e.to_string())?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            Err(format!("status {}", status.as_u16()))
        } else {
            Err(body)
        }
    }
}

#[async_trait]
impl Notifier for EmailJsNotifier {
    async fn notify(&self, applicant: &JobApplication, approval: &ApprovalDetails) -> NotifyOutcome {
        let (service_id, template_id, user_id) = match self.credentials() {
            Ok(ids) => ids,
            Err(missing) => {
                let message = format!(
                    "Email service not configured: {} is not configured. Email will not be sent.",
                    missing
                );
                tracing::warn!("{}", message);
                return NotifyOutcome::failed(message);
            }
        };

        if applicant.email.trim().is_empty() {
            tracing::error!(id = %applicant.id, "Recipient email is missing");
            return NotifyOutcome::failed("Recipient email address is missing");
        }

        let notes = if approval.notes.trim().is_empty() {
            "No additional notes provided"
        } else {
            approval.notes.as_str()
        };

        let request = SendRequest {
            service_id,
            template_id,
            user_id,
            template_params: TemplateParams {
                to_name: &applicant.full_name,
                to_email: &applicant.email,
                approved_position: &approval.approved_position,
                amount: &approval.amount,
                start_date: &approval.start_date,
                department: &approval.department,
                notes,
                applicant_photo: applicant.passport_photo.resolved_url().unwrap_or(""),
            },
        };

        match self.send(&request).await {
            Ok(()) => {
                tracing::info!(id = %applicant.id, "Approval email sent");
                NotifyOutcome::sent(format!("Approval email sent to {}", applicant.email))
            }
            Err(reason) => {
                tracing::error!(id = %applicant.id, "EmailJS error: {}", reason);
                NotifyOutcome::failed(format!("Failed to send email: {}", reason))
            }
        }
    }

    fn status(&self) -> NotifierStatus {
        match self.credentials() {
            Ok(_) => NotifierStatus {
                configured: true,
                message: "Email service is ready".to_string(),
            },
            Err(missing) => NotifierStatus {
                configured: false,
                message: format!("{} is not configured", missing),
            },
        }
    }
}
