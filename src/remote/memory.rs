//! In-process remote store.
//!
//! Used when no remote URL is configured and as a test double: reachability and
//! latency can be changed at runtime to simulate a flaky network.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use super::{decode_upload, Collection, Document, RemoteError, RemoteStore};
use crate::models::FileUpload;

/// In-memory document store. Data is not persisted across restarts.
pub struct MemoryRemoteStore {
    documents: RwLock<HashMap<Collection, Vec<Document>>>,
    files: RwLock<HashMap<String, Vec<u8>>>,
    reachable: AtomicBool,
    uploads_enabled: AtomicBool,
    latency: RwLock<Duration>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            uploads_enabled: AtomicBool::new(true),
            latency: RwLock::new(Duration::ZERO),
        }
    }

    async fn round_trip(&self) -> Result<(), RemoteError> {
        let latency = self.latency.read().map(|l| *l).unwrap_or(Duration::ZERO);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("network unreachable".to_string()))
        }
    }
}

/// Runtime controls for simulating a flaky network.
#[allow(dead_code)]
impl MemoryRemoteStore {
    /// Make every call fail with `Unavailable` (after the configured latency).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_uploads_enabled(&self, enabled: bool) {
        self.uploads_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Delay applied to every call before it takes effect.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut guard) = self.latency.write() {
            *guard = latency;
        }
    }

    /// Number of documents currently in `collection`.
    pub fn document_count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .map(|docs| docs.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn file(&self, url: &str) -> Option<Vec<u8>> {
        self.files.read().ok()?.get(url).cloned()
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> RemoteError {
    RemoteError::Unavailable("store lock poisoned".to_string())
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn insert(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document, RemoteError> {
        self.round_trip().await?;

        let doc = Document {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created_at: Utc::now(),
            fields,
        };

        let mut documents = self.documents.write().map_err(|_| poisoned())?;
        let entries = documents.entry(collection).or_default();
        // Same id twice: last write wins.
        entries.retain(|d| d.id != doc.id);
        entries.push(doc.clone());
        Ok(doc)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, RemoteError> {
        self.round_trip().await?;

        let documents = self.documents.read().map_err(|_| poisoned())?;
        let mut result = documents.get(&collection).cloned().unwrap_or_default();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Document, RemoteError> {
        self.round_trip().await?;

        let documents = self.documents.read().map_err(|_| poisoned())?;
        documents
            .get(&collection)
            .and_then(|entries| entries.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.round_trip().await?;

        let mut documents = self.documents.write().map_err(|_| poisoned())?;
        let doc = documents
            .get_mut(&collection)
            .and_then(|entries| entries.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        Ok(())
    }

    async fn upload_attachment(&self, upload: &FileUpload) -> Result<String, RemoteError> {
        self.round_trip().await?;
        if !self.uploads_enabled.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("uploads disabled".to_string()));
        }

        let bytes = decode_upload(upload)?;
        let url = format!(
            "memory://files/{}/{}",
            uuid::Uuid::new_v4(),
            upload.file_name
        );
        self.files
            .write()
            .map_err(|_| poisoned())?
            .insert(url.clone(), bytes);
        Ok(url)
    }
}
