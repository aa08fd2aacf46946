//! Sync gateway between the local cache and the remote store.
//!
//! Application submissions land in the local cache first and are then pushed to the
//! remote store under a deadline. Reads merge both sources. A slow or unreachable
//! remote store degrades the result; it never fails a read. Whenever the remote store
//! answers, applications it has never seen are pushed again from the local buffer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::SyncConfig;
use crate::db::LocalCache;
use crate::deadline::{run_with_deadline, Settled};
use crate::errors::AppError;
use crate::models::{
    ApplicationStatus, Appointment, ApprovalDetails, Attachment, HomepageContent, JobApplication,
    NewApplication, NewAppointment, NewContactMessage, LOCAL_ID_PREFIX,
};
use crate::remote::{to_fields, Collection, Document, RemoteError, RemoteStore};

/// Reconciles the local cache and the remote store.
pub struct SyncGateway {
    cache: Arc<LocalCache>,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
}

impl SyncGateway {
    pub fn new(cache: Arc<LocalCache>, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        Self {
            cache,
            remote,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // ==================== APPLICATIONS ====================

    /// Save a new application locally, then push it to the remote store best-effort.
    ///
    /// Returns the remote copy when the push finished in time, otherwise the local copy.
    /// Fails only on invalid input, or when neither the local cache nor the remote store
    /// took the record.
    pub async fn submit_application(
        &self,
        request: NewApplication,
    ) -> Result<JobApplication, AppError> {
        request.validate().map_err(AppError::Validation)?;
        let (Some(passport_photo), Some(cv)) = (request.passport_photo, request.cv) else {
            return Err(AppError::Validation(
                "Both passport photo and CV are required".to_string(),
            ));
        };

        let created_at = request
            .created_at
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let application = JobApplication {
            id: next_local_id(),
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            position: request.position,
            years_of_experience: request.years_of_experience,
            passport_photo,
            cv,
            status: ApplicationStatus::Pending,
            created_at,
            approval_details: None,
        };

        // The local buffer keeps file names only, never the upload payloads.
        let local_copy = JobApplication {
            passport_photo: application.passport_photo.placeholder(),
            cv: application.cv.placeholder(),
            ..application.clone()
        };
        let saved_locally = self.cache.append_application(&local_copy).await;
        match &saved_locally {
            Ok(()) => tracing::info!(id = %local_copy.id, "Application saved locally"),
            Err(e) => tracing::error!(id = %local_copy.id, "Local save failed, trying remote store: {}", e),
        }

        let remote = self.remote.clone();
        let id = application.id.clone();
        match run_with_deadline(
            self.config.submit_timeout,
            push_application(remote, application),
        )
        .await
        {
            Settled::Completed(Ok(synced)) => {
                tracing::info!(id = %synced.id, "Application synced to remote store");
                return Ok(synced);
            }
            Settled::Completed(Err(e)) => {
                tracing::warn!(id = %id, "Remote sync skipped (saved locally): {}", e);
            }
            Settled::TimedOut => {
                tracing::warn!(
                    id = %id,
                    "Remote sync timed out after {:?} (saved locally)",
                    self.config.submit_timeout
                );
            }
            Settled::Panicked => {
                tracing::warn!(id = %id, "Remote sync aborted (saved locally)");
            }
        }

        saved_locally.map(|()| local_copy)
    }

    /// Remote and local applications, newest first. Falls back to local data only.
    pub async fn fetch_applications(&self) -> Vec<JobApplication> {
        let remote = self.remote.clone();
        let settled = run_with_deadline(self.config.fetch_timeout, async move {
            remote.list(Collection::Applications).await
        })
        .await;

        let mut local = self.local_applications().await;

        let mut remote_apps = match settled {
            Settled::Completed(Ok(docs)) => decode_all::<JobApplication>(docs),
            Settled::Completed(Err(e)) => {
                tracing::warn!("Application fetch failed, using local data only: {}", e);
                sort_newest_first(&mut local);
                return local;
            }
            Settled::TimedOut | Settled::Panicked => {
                tracing::warn!("Application fetch timed out, using local data only");
                sort_newest_first(&mut local);
                return local;
            }
        };

        let unsynced: Vec<JobApplication> = local
            .iter()
            .filter(|l| l.is_local() && !remote_apps.iter().any(|r| r.id == l.id))
            .cloned()
            .collect();
        if !unsynced.is_empty() {
            remote_apps.extend(self.resync(unsynced).await);
        }

        if self.config.dedupe_applications {
            local.retain(|l| !remote_apps.iter().any(|r| r.id == l.id));
        }

        let mut merged = remote_apps;
        merged.extend(local);
        sort_newest_first(&mut merged);
        merged
    }

    /// Look up one application in the remote store.
    ///
    /// An application the remote store has never seen but the local buffer holds is
    /// pushed first, so a submission made while offline can still be decided.
    pub async fn get_application(&self, id: &str) -> Result<JobApplication, AppError> {
        let remote = self.remote.clone();
        let owned_id = id.to_string();
        let found = bounded(self.config.fetch_timeout, async move {
            remote.get(Collection::Applications, &owned_id).await
        })
        .await;

        match found {
            Ok(doc) => Ok(doc.into_record()?),
            Err(AppError::NotFound(message)) => {
                let Some(local) = self
                    .local_applications()
                    .await
                    .into_iter()
                    .find(|a| a.is_local() && a.id == id)
                else {
                    return Err(AppError::NotFound(message));
                };
                tracing::info!(id = %id, "Application only known locally, pushing it to the remote store");
                let remote = self.remote.clone();
                bounded(self.config.submit_timeout, insert_application(remote, local)).await
            }
            Err(e) => Err(e),
        }
    }

    /// Partial update of an application's status in the remote store.
    ///
    /// `approval_details` is written only when given. There is no local fallback.
    pub async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        approval_details: Option<&ApprovalDetails>,
    ) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert(
            "status".to_string(),
            Value::String(status.as_str().to_string()),
        );
        if let Some(details) = approval_details {
            fields.insert("approvalDetails".to_string(), serde_json::to_value(details)?);
        }

        let remote = self.remote.clone();
        let owned_id = id.to_string();
        bounded(self.config.submit_timeout, async move {
            remote
                .update(Collection::Applications, &owned_id, fields)
                .await
        })
        .await?;

        tracing::info!(id = %id, status = status.as_str(), "Application status updated");
        Ok(())
    }

    // ==================== APPOINTMENTS & CONTACTS ====================

    /// Remote appointments, newest first; empty when the remote store is unavailable.
    pub async fn fetch_appointments(&self) -> Vec<Appointment> {
        let remote = self.remote.clone();
        match run_with_deadline(self.config.fetch_timeout, async move {
            remote.list(Collection::Appointments).await
        })
        .await
        {
            Settled::Completed(Ok(docs)) => decode_all(docs),
            Settled::Completed(Err(e)) => {
                tracing::warn!("Appointment fetch failed, using empty list: {}", e);
                Vec::new()
            }
            Settled::TimedOut | Settled::Panicked => {
                tracing::warn!("Appointment fetch timed out, using empty list");
                Vec::new()
            }
        }
    }

    pub async fn submit_appointment(&self, request: NewAppointment) -> Result<Appointment, AppError> {
        request.validate().map_err(AppError::Validation)?;
        let fields = to_fields(&request)?;

        let remote = self.remote.clone();
        let doc = bounded(self.config.submit_timeout, async move {
            remote.insert(Collection::Appointments, None, fields).await
        })
        .await?;
        tracing::info!(id = %doc.id, "Appointment booked");
        Ok(doc.into_record()?)
    }

    pub async fn submit_contact(&self, request: NewContactMessage) -> Result<(), AppError> {
        request.validate().map_err(AppError::Validation)?;
        let fields = to_fields(&request)?;

        let remote = self.remote.clone();
        let doc = bounded(self.config.submit_timeout, async move {
            remote.insert(Collection::Contacts, None, fields).await
        })
        .await?;
        tracing::info!(id = %doc.id, "Contact message stored");
        Ok(())
    }

    // ==================== HOMEPAGE ====================

    /// Replace the homepage document. Last write wins.
    pub async fn update_homepage_content(
        &self,
        mut content: HomepageContent,
    ) -> Result<HomepageContent, AppError> {
        content.validate().map_err(AppError::Validation)?;
        content.assign_missing_ids();
        content.updated_at = Some(Utc::now().to_rfc3339());
        self.cache.put_homepage(&content).await?;
        tracing::info!("Homepage content updated");
        Ok(content)
    }

    pub async fn get_homepage_content(&self) -> Result<Option<HomepageContent>, AppError> {
        self.cache.get_homepage().await
    }

    /// Push local-only applications to the remote store; returns the copies it accepted.
    async fn resync(&self, unsynced: Vec<JobApplication>) -> Vec<JobApplication> {
        let count = unsynced.len();
        let remote = self.remote.clone();
        let settled = run_with_deadline(self.config.submit_timeout, async move {
            let mut pushed = Vec::with_capacity(unsynced.len());
            for application in unsynced {
                let id = application.id.clone();
                match insert_application(remote.clone(), application).await {
                    Ok(synced) => pushed.push(synced),
                    Err(e) => tracing::warn!(id = %id, "Resync failed: {}", e),
                }
            }
            pushed
        })
        .await;

        match settled {
            Settled::Completed(pushed) => {
                tracing::info!("Resynced {} of {} local-only applications", pushed.len(), count);
                pushed
            }
            Settled::TimedOut | Settled::Panicked => {
                tracing::warn!("Resync of {} local-only applications did not finish in time", count);
                Vec::new()
            }
        }
    }

    async fn local_applications(&self) -> Vec<JobApplication> {
        match self.cache.list_applications().await {
            Ok(apps) => apps,
            Err(e) => {
                tracing::error!("Local application cache unreadable: {}", e);
                Vec::new()
            }
        }
    }
}

/// Resolve uploads, then insert the application under its own id.
async fn push_application(
    remote: Arc<dyn RemoteStore>,
    mut application: JobApplication,
) -> Result<JobApplication, RemoteError> {
    application.passport_photo = resolve_attachment(remote.as_ref(), &application.passport_photo).await;
    application.cv = resolve_attachment(remote.as_ref(), &application.cv).await;
    insert_application(remote, application).await
}

/// Write the application under its own id.
async fn insert_application(
    remote: Arc<dyn RemoteStore>,
    application: JobApplication,
) -> Result<JobApplication, RemoteError> {
    let fields = to_fields(&application)?;
    let doc = remote
        .insert(Collection::Applications, Some(&application.id), fields)
        .await?;
    doc.into_record()
}

async fn resolve_attachment(remote: &dyn RemoteStore, attachment: &Attachment) -> Attachment {
    match attachment {
        Attachment::Url(_) => attachment.clone(),
        Attachment::Upload(upload) => match remote.upload_attachment(upload).await {
            Ok(url) => Attachment::Url(url),
            Err(e) => {
                tracing::warn!(
                    "Upload of {} failed, keeping placeholder: {}",
                    attachment.file_name(),
                    e
                );
                attachment.placeholder()
            }
        },
    }
}

/// Remote call that must settle within `budget`; a timeout is a persistence failure.
async fn bounded<F, T>(budget: Duration, io: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, RemoteError>> + Send + 'static,
    T: Send + 'static,
{
    match run_with_deadline(budget, io).await {
        Settled::Completed(result) => result.map_err(AppError::from),
        Settled::TimedOut => Err(AppError::Remote(format!(
            "Remote store did not respond within {} ms. Please try again.",
            budget.as_millis()
        ))),
        Settled::Panicked => Err(AppError::Internal("Remote call aborted".to_string())),
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match doc.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(id = %id, "Skipping malformed remote document: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn created_at_key(application: &JobApplication) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&application.created_at)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Newest first; unparseable timestamps sink to the end.
fn sort_newest_first(applications: &mut [JobApplication]) {
    applications.sort_by(|a, b| created_at_key(b).cmp(&created_at_key(a)));
}

fn next_local_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}",
        LOCAL_ID_PREFIX,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

#[cfg(test)]
mod tests;
