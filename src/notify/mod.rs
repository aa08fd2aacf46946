//! Applicant notifications.
//!
//! A notifier never fails: every path ends in a [`NotifyOutcome`] whose message is
//! shown to the admin next to the approval result.

mod emailjs;

pub use emailjs::EmailJsNotifier;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{ApprovalDetails, JobApplication};

/// Result of a notification attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub success: bool,
    pub message: String,
}

impl NotifyOutcome {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Configuration state reported on the admin surface.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotifierStatus {
    pub configured: bool,
    pub message: String,
}

/// Sends the approval notice to an applicant.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, applicant: &JobApplication, approval: &ApprovalDetails) -> NotifyOutcome;

    fn status(&self) -> NotifierStatus;
}
