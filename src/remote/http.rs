//! JSON-over-HTTP document store client.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::{decode_upload, Collection, Document, RemoteError, RemoteStore};
use crate::models::FileUpload;

const API_KEY_HEADER: &str = "x-api-key";

/// Client for a document API laid out as `collections/{name}/documents[/{id}]` plus `files/`.
#[derive(Clone)]
pub struct HttpRemoteStore {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpRemoteStore {
    /// Creates a new client. `base_url` should end with a slash.
    pub fn new(base_url: Url, api_key: Option<String>, http: Client) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn documents_url(&self, collection: Collection) -> Result<Url, RemoteError> {
        Ok(self
            .base_url
            .join(&format!("collections/{}/documents", collection.as_str()))?)
    }

    fn document_url(&self, collection: Collection, id: &str) -> Result<Url, RemoteError> {
        let mut url = self.documents_url(collection)?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Unavailable("base url cannot be a base".to_string()))?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn insert(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document, RemoteError> {
        let url = self.documents_url(collection)?;
        let mut body = serde_json::json!({ "fields": fields });
        if let Some(id) = id {
            body["id"] = Value::String(id.to_string());
        }
        let response = self.request(Method::POST, url).json(&body).send().await?;
        parse_json(response).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, RemoteError> {
        let mut url = self.documents_url(collection)?;
        url.query_pairs_mut()
            .append_pair("orderBy", "createdAt")
            .append_pair("direction", "desc");
        let response = self.request(Method::GET, url).send().await?;
        let list: DocumentList = parse_json(response).await?;
        Ok(list.documents)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Document, RemoteError> {
        let url = self.document_url(collection, id)?;
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found(collection, id));
        }
        parse_json(response).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .request(Method::PATCH, url)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found(collection, id));
        }
        ensure_success(response).await
    }

    async fn upload_attachment(&self, upload: &FileUpload) -> Result<String, RemoteError> {
        let bytes = decode_upload(upload)?;
        let mut url = self.base_url.join("files")?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Unavailable("base url cannot be a base".to_string()))?
            .push(&upload.file_name);
        let response = self
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, &upload.content_type)
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadResponse = parse_json(response).await?;
        Ok(uploaded.url)
    }
}

fn not_found(collection: Collection, id: &str) -> RemoteError {
    RemoteError::NotFound {
        collection: collection.as_str().to_string(),
        id: id.to_string(),
    }
}

async fn ensure_success(response: Response) -> Result<(), RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}

async fn parse_json<T>(response: Response) -> Result<T, RemoteError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
