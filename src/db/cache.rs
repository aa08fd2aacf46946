//! Local cache: serialized JSON values under fixed keys.
//!
//! `jobApplications` holds the ordered list of submitted applications and
//! `homepageContent` the singleton CMS document.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::{HomepageContent, JobApplication};

pub const APPLICATIONS_KEY: &str = "jobApplications";
pub const HOMEPAGE_KEY: &str = "homepageContent";

/// Key/value store backed by SQLite.
pub struct LocalCache {
    pool: SqlitePool,
    // Serializes read-modify-write of the application list.
    applications_lock: Mutex<()>,
}

impl LocalCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            applications_lock: Mutex::new(()),
        }
    }

    /// Read the raw text stored under `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub async fn put_raw(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== APPLICATIONS ====================

    /// All locally buffered applications, in insertion order.
    pub async fn list_applications(&self) -> Result<Vec<JobApplication>, AppError> {
        match self.get_raw(APPLICATIONS_KEY).await? {
            Some(raw) => decode(APPLICATIONS_KEY, &raw),
            None => Ok(Vec::new()),
        }
    }

    /// Append one application to the buffer.
    ///
    /// An undecodable buffer is moved aside under a `.corrupt.<millis>` key and a fresh
    /// one is started.
    pub async fn append_application(&self, application: &JobApplication) -> Result<(), AppError> {
        let _guard = self.applications_lock.lock().await;
        let mut applications = match self.get_raw(APPLICATIONS_KEY).await? {
            Some(raw) => match decode::<Vec<JobApplication>>(APPLICATIONS_KEY, &raw) {
                Ok(applications) => applications,
                Err(e) => {
                    let moved_to = self.quarantine(APPLICATIONS_KEY, &raw).await?;
                    tracing::warn!("{}; moved to {} and starting a new buffer", e, moved_to);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        applications.push(application.clone());
        let raw = encode(APPLICATIONS_KEY, &applications)?;
        self.put_raw(APPLICATIONS_KEY, &raw).await
    }

    async fn quarantine(&self, key: &str, raw: &str) -> Result<String, AppError> {
        let moved_to = format!("{}.corrupt.{}", key, Utc::now().timestamp_millis());
        self.put_raw(&moved_to, raw).await?;
        Ok(moved_to)
    }

    // ==================== HOMEPAGE ====================

    pub async fn get_homepage(&self) -> Result<Option<HomepageContent>, AppError> {
        match self.get_raw(HOMEPAGE_KEY).await? {
            Some(raw) => decode(HOMEPAGE_KEY, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn put_homepage(&self, content: &HomepageContent) -> Result<(), AppError> {
        let raw = encode(HOMEPAGE_KEY, content)?;
        self.put_raw(HOMEPAGE_KEY, &raw).await
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Database(format!("Corrupt cache entry {}: {}", key, e)))
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", key, e)))
}
