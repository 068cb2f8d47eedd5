//! Wire types exchanged with the extraction backend.
//!
//! The backend owns every record shape, so field maps stay as
//! `serde_json::Map` and unknown keys are tolerated everywhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dynamic field name -> value mapping.
pub type FieldMap = Map<String, Value>;

/// Result of `GET /health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

/// Connectivity as shown in the page header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Connected { database: String },
    Error,
    Disconnected,
}

impl ApiStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ApiStatus::Connected { .. })
    }

    pub fn database_connected(&self) -> bool {
        matches!(self, ApiStatus::Connected { database } if database == "connected")
    }
}

/// Result of `POST /extract`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub structured_fields: FieldMap,
    #[serde(default)]
    pub document_hash: Option<String>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub validation_message: Option<String>,
    #[serde(default)]
    pub already_exists: bool,
    #[serde(default)]
    pub storage_url: Option<String>,
    /// Anything else the backend returned; echoed back in the model log.
    #[serde(flatten)]
    pub extra: FieldMap,
}

/// Body of `POST /save`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest {
    pub document_hash: Option<String>,
    pub filename: String,
    pub structured_fields: FieldMap,
    pub success: bool,
}

/// Result of `POST /save`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub document_id: Option<Value>,
    #[serde(default)]
    pub storage_url: Option<String>,
}

/// Fields changed during review, keyed by field name.
pub type Corrections = BTreeMap<String, Correction>;

/// A single field that differs between extraction and review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: Value,
    pub corrected: Value,
}

/// Body of `POST /model-log`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelLogRecord {
    pub success: bool,
    pub document_id: Option<Value>,
    pub document_hash: Option<String>,
    pub document_link: Option<String>,
    pub extraction_result: Value,
    pub original_values: FieldMap,
    pub corrected_values: FieldMap,
    pub corrections_made: Corrections,
    pub failure_reason: Option<String>,
}

/// One row of `GET /model-logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelLogEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub document_id: Option<Value>,
    #[serde(default)]
    pub document_hash: Option<String>,
    #[serde(default)]
    pub document_link: Option<String>,
    #[serde(default)]
    pub original_values: Option<Value>,
    #[serde(default)]
    pub corrected_values: Option<Value>,
    #[serde(default)]
    pub corrections_made: Option<Value>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of `GET /model-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelLogList {
    #[serde(default)]
    pub logs: Vec<ModelLogEntry>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// A stored document as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredDocument(pub FieldMap);

impl StoredDocument {
    /// Identifier rendered as a string, or empty if missing.
    pub fn id(&self) -> String {
        self.0.get("id").map(display_value).unwrap_or_default()
    }

    /// Display text for a field, `None` when missing, null or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(display_value)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Result of `GET /documents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub documents: Vec<StoredDocument>,
}

/// Render a JSON value the way a user expects to read it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
