//! Job application model matching the frontend JobApplication interface.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Prefix that marks identities generated by this service rather than the remote store.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Scheme used for attachments that could not be uploaded.
pub const PLACEHOLDER_SCHEME: &str = "pending-upload://";

/// Lifecycle of a job application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// A decision moves Pending to a terminal state, exactly once.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

/// A file that has not been uploaded yet. `data` is base64.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub data: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

/// A binary attachment: either a resolved URL or a pending upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Attachment {
    Url(String),
    Upload(FileUpload),
}

impl Attachment {
    pub fn file_name(&self) -> &str {
        match self {
            Attachment::Url(url) => url.rsplit('/').next().unwrap_or(url.as_str()),
            Attachment::Upload(upload) => &upload.file_name,
        }
    }

    /// Marker stored in place of an upload that did not resolve.
    pub fn placeholder(&self) -> Attachment {
        match self {
            Attachment::Url(_) => self.clone(),
            Attachment::Upload(upload) => {
                Attachment::Url(format!("{}{}", PLACEHOLDER_SCHEME, upload.file_name))
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Attachment::Url(url) if url.starts_with(PLACEHOLDER_SCHEME))
    }

    /// The URL, if this attachment resolved to a retrievable one.
    pub fn resolved_url(&self) -> Option<&str> {
        match self {
            Attachment::Url(url) if !self.is_placeholder() => Some(url.as_str()),
            _ => None,
        }
    }
}

/// Terms attached to an approved application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDetails {
    pub approved_position: String,
    pub amount: String,
    pub start_date: String,
    pub department: String,
    #[serde(default)]
    pub notes: String,
}

impl ApprovalDetails {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("approvedPosition", &self.approved_position),
            ("amount", &self.amount),
            ("startDate", &self.start_date),
            ("department", &self.department),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", name));
            }
        }
        Ok(())
    }
}

/// A job application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub years_of_experience: u32,
    pub passport_photo: Attachment,
    pub cv: Attachment,
    pub status: ApplicationStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_details: Option<ApprovalDetails>,
}

impl JobApplication {
    /// Details are present exactly when the application is approved.
    pub fn is_consistent(&self) -> bool {
        self.approval_details.is_some() == (self.status == ApplicationStatus::Approved)
    }

    /// Identity minted by this service rather than by the remote store.
    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Request body for submitting a job application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub years_of_experience: u32,
    #[serde(default)]
    pub passport_photo: Option<Attachment>,
    #[serde(default)]
    pub cv: Option<Attachment>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl NewApplication {
    /// Reject structurally incomplete submissions before anything is written.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("position", &self.position),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", name));
            }
        }
        if self.passport_photo.is_none() || self.cv.is_none() {
            return Err("Both passport photo and CV are required".to_string());
        }
        if let Some(created_at) = self.created_at.as_deref().filter(|c| !c.trim().is_empty()) {
            if DateTime::parse_from_rfc3339(created_at).is_err() {
                return Err("createdAt must be an RFC 3339 timestamp".to_string());
            }
        }
        Ok(())
    }
}
