//! Backend API client.
//!
//! Every call is a single request with its own timeout. Non-2xx responses
//! become [`BackendError::Status`] carrying the backend's `detail` message.

use std::time::Duration;

use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::models::{
    ApiStatus, DocumentList, ExtractionResponse, HealthResponse, ModelLogList, ModelLogRecord,
    SaveRequest, SaveResponse,
};

const USER_AGENT: &str = concat!("logidoc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not reach backend: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A file received from the browser, ready to forward.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Client for the extraction backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    health_timeout: Duration,
    extract_timeout: Duration,
    save_timeout: Duration,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(settings: &Settings) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            health_timeout: settings.health_timeout(),
            extract_timeout: settings.extract_timeout(),
            save_timeout: settings.save_timeout(),
            request_timeout: settings.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe `GET /health`. Never fails; problems map to a status value.
    pub async fn health(&self) -> ApiStatus {
        let request = self
            .client
            .get(self.url("/health"))
            .timeout(self.health_timeout);

        match request.send().await {
            Ok(resp) if resp.status().is_success() => {
                let health: HealthResponse = resp.json().await.unwrap_or_default();
                ApiStatus::Connected {
                    database: health.database.unwrap_or_else(|| "unknown".to_string()),
                }
            }
            Ok(resp) => {
                debug!("Health check returned HTTP {}", resp.status());
                ApiStatus::Error
            }
            Err(e) => {
                debug!("Health check failed: {}", e);
                ApiStatus::Disconnected
            }
        }
    }

    /// Upload a document for extraction.
    pub async fn extract(&self, file: UploadedFile) -> Result<ExtractionResponse, BackendError> {
        info!(filename = %file.filename, bytes = file.bytes.len(), "extracting document");

        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let request = self
            .client
            .post(self.url("/extract"))
            .multipart(form)
            .timeout(self.extract_timeout);
        self.send_json(request).await
    }

    /// Save a reviewed document.
    pub async fn save(&self, request: &SaveRequest) -> Result<SaveResponse, BackendError> {
        info!(
            document_hash = request.document_hash.as_deref().unwrap_or("-"),
            success = request.success,
            "saving reviewed document"
        );
        let request = self
            .client
            .post(self.url("/save"))
            .json(request)
            .timeout(self.save_timeout);
        self.send_json(request).await
    }

    /// Record extraction quality for a document.
    pub async fn log_model(&self, record: &ModelLogRecord) -> Result<Value, BackendError> {
        debug!(success = record.success, "posting model log");
        let request = self
            .client
            .post(self.url("/model-log"))
            .json(record)
            .timeout(self.request_timeout);
        self.send_json(request).await
    }

    pub async fn list_documents(&self) -> Result<DocumentList, BackendError> {
        let request = self
            .client
            .get(self.url("/documents"))
            .timeout(self.request_timeout);
        let list: DocumentList = self.send_json(request).await?;
        info!(count = list.documents.len(), "fetched documents");
        Ok(list)
    }

    /// Full record for one document.
    pub async fn get_document(&self, id: &str) -> Result<Value, BackendError> {
        let path = format!("/documents/{}", urlencoding::encode(id));
        let request = self.client.get(self.url(&path)).timeout(self.request_timeout);
        self.send_json(request).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), BackendError> {
        info!(id, "deleting document");
        let path = format!("/documents/{}", urlencoding::encode(id));
        let request = self
            .client
            .delete(self.url(&path))
            .timeout(self.request_timeout);
        self.send(request).await?;
        Ok(())
    }

    pub async fn list_model_logs(&self, limit: u32) -> Result<ModelLogList, BackendError> {
        let request = self
            .client
            .get(self.url("/model-logs"))
            .query(&[("limit", limit)])
            .timeout(self.request_timeout);
        let list: ModelLogList = self.send_json(request).await?;
        info!(count = list.logs.len(), "fetched model logs");
        Ok(list)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!("Backend returned HTTP {}: {}", status, detail);
        Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let resp = self.send(request).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pull a readable message out of an error body.
///
/// Prefers the JSON `detail` key, then `message`, then the raw text.
pub fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message"] {
            match json.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
                Some(Value::String(_)) | Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    let text = body.trim();
    if text.is_empty() {
        "Unknown error".to_string()
    } else {
        text.to_string()
    }
}
