//! Admin decisions on job applications.
//!
//! `Pending` is the only state a decision can leave. Approval persists the new status
//! first and only then notifies the applicant; a notification failure is reported but
//! never rolls the approval back.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::deadline::{run_with_deadline, Settled};
use crate::errors::AppError;
use crate::models::{ApplicationStatus, ApprovalDetails, JobApplication};
use crate::notify::{Notifier, NotifyOutcome};
use crate::sync::SyncGateway;

/// Outcome of an admin decision, ready to show on the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub application: JobApplication,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotifyOutcome>,
    /// How long the client keeps the result visible before closing the approval form
    /// and refreshing its lists.
    pub dismiss_after_ms: u64,
}

impl Decision {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }

    /// Resolves once the display delay has passed.
    pub async fn done(&self) {
        tokio::time::sleep(self.dismiss_after()).await;
    }
}

/// Runs approve/reject against the sync gateway and the notifier.
pub struct ApprovalFlow {
    gateway: Arc<SyncGateway>,
    notifier: Arc<dyn Notifier>,
}

impl ApprovalFlow {
    pub fn new(gateway: Arc<SyncGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Approve a pending application and notify the applicant.
    pub async fn approve(&self, id: &str, form: ApprovalDetails) -> Result<Decision, AppError> {
        form.validate().map_err(AppError::Validation)?;
        let mut application = self.load_pending(id, ApplicationStatus::Approved).await?;

        self.gateway
            .update_application_status(id, ApplicationStatus::Approved, Some(&form))
            .await?;
        application.status = ApplicationStatus::Approved;
        application.approval_details = Some(form.clone());

        let outcome = self.notify(&application, &form).await;
        let message = if outcome.success {
            format!("Application approved. {}", outcome.message)
        } else {
            format!(
                "Application approved, but the applicant was not notified: {}",
                outcome.message
            )
        };

        Ok(Decision {
            application,
            message,
            notification: Some(outcome),
            dismiss_after_ms: millis(self.gateway.config().approval_dismiss),
        })
    }

    /// Reject a pending application. No notification is sent.
    pub async fn reject(&self, id: &str) -> Result<Decision, AppError> {
        let mut application = self.load_pending(id, ApplicationStatus::Rejected).await?;

        self.gateway
            .update_application_status(id, ApplicationStatus::Rejected, None)
            .await?;
        application.status = ApplicationStatus::Rejected;
        application.approval_details = None;

        Ok(Decision {
            application,
            message: "Application rejected".to_string(),
            notification: None,
            dismiss_after_ms: 0,
        })
    }

    async fn load_pending(
        &self,
        id: &str,
        next: ApplicationStatus,
    ) -> Result<JobApplication, AppError> {
        let application = self.gateway.get_application(id).await?;
        if !application.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Application {} is already {}",
                id,
                application.status.as_str()
            )));
        }
        Ok(application)
    }

    async fn notify(&self, application: &JobApplication, form: &ApprovalDetails) -> NotifyOutcome {
        let budget = self.gateway.config().notify_timeout;
        let notifier = self.notifier.clone();
        let applicant = application.clone();
        let approval = form.clone();

        match run_with_deadline(budget, async move {
            notifier.notify(&applicant, &approval).await
        })
        .await
        {
            Settled::Completed(outcome) => outcome,
            Settled::TimedOut => {
                tracing::warn!(id = %application.id, "Notifier did not answer within {:?}", budget);
                NotifyOutcome::failed(format!(
                    "Notification timed out after {} ms",
                    budget.as_millis()
                ))
            }
            Settled::Panicked => NotifyOutcome::failed("Notification failed unexpectedly"),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
