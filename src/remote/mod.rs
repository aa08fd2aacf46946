//! Remote document store abstraction.
//!
//! The remote store holds the authoritative `appointments`, `applications` and
//! `contacts` collections. Every document is stamped with a store-assigned creation
//! time and listed newest first.

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::FileUpload;

/// Logical collections in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Appointments,
    Applications,
    Contacts,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Appointments => "appointments",
            Collection::Applications => "applications",
            Collection::Contacts => "contacts",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by remote store backends.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{collection}/{id} does not exist")]
    NotFound { collection: String, id: String },
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
}

/// A stored document: identity, server timestamp and the remaining fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decode into a record. `id` and `createdAt` come from the document envelope and
    /// override any copies inside `fields`.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, RemoteError> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        fields.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        serde_json::from_value(Value::Object(fields)).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Turn a serializable record into document fields, dropping envelope keys.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, RemoteError> {
    match serde_json::to_value(record).map_err(|e| RemoteError::Decode(e.to_string()))? {
        Value::Object(mut map) => {
            map.remove("id");
            map.remove("createdAt");
            Ok(map)
        }
        other => Err(RemoteError::Decode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Document database holding the authoritative collections.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert a document. `id` is honored when given, otherwise the store assigns one.
    async fn insert(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document, RemoteError>;

    /// All documents in a collection, newest first.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, RemoteError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Document, RemoteError>;

    /// Merge `fields` into an existing document. Unknown ids are `NotFound`.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError>;

    /// Store an attachment and return a retrievable URL.
    async fn upload_attachment(&self, upload: &FileUpload) -> Result<String, RemoteError>;
}

/// Decode the base64 payload of an upload.
pub(crate) fn decode_upload(upload: &FileUpload) -> Result<Vec<u8>, RemoteError> {
    use base64::Engine;

    // Browsers hand over data URLs ("data:image/jpeg;base64,....").
    let payload = match upload.data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => upload.data.as_str(),
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RemoteError::InvalidAttachment(format!("{}: {}", upload.file_name, e)))
}
