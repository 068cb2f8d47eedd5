//! Review of extracted fields: change detection and save payloads.
//!
//! The review form is stateless on the server. The original extraction
//! travels with the form as hidden JSON inputs, and every submission is
//! parsed back into a [`ReviewState`].

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    display_value, Correction, Corrections, ExtractionResponse, FieldMap, ModelLogRecord,
    SaveRequest, SaveResponse,
};

/// Form input prefix for editable fields.
pub const FIELD_PREFIX: &str = "field.";

/// Filename sent to the backend when the upload had none.
pub const FALLBACK_FILENAME: &str = "unknown.pdf";

/// A logistics field the review form always shows.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub multiline: bool,
}

const fn field(name: &'static str, label: &'static str, multiline: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        multiline,
    }
}

/// Known fields in display order.
pub const KNOWN_FIELDS: &[FieldSpec] = &[
    field("shipper_name", "Shipper Name", false),
    field("shipper_address", "Shipper Address", true),
    field("receiver_name", "Receiver Name", false),
    field("receiver_address", "Receiver Address", true),
    field("tracking_number", "Tracking Number", false),
    field("carrier", "Carrier", false),
    field("weight", "Weight", false),
    field("dimensions", "Dimensions", false),
    field("status", "Status", false),
    field("shipment_date", "Shipment Date", false),
    field("delivery_date", "Delivery Date", false),
    field("special_instructions", "Special Instructions", true),
];

/// Label for a field name, falling back to a title-cased version.
pub fn field_label(name: &str) -> String {
    if let Some(known) = KNOWN_FIELDS.iter().find(|f| f.name == name) {
        return known.label.to_string();
    }
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_multiline(name: &str) -> bool {
    KNOWN_FIELDS
        .iter()
        .any(|f| f.name == name && f.multiline)
}

/// Normalize a value for comparison.
///
/// Null, blank strings, `false`, zero and empty containers all collapse to
/// `None`. Strings are trimmed with CRLF line breaks folded to LF. Everything
/// else compares by its JSON text.
pub fn normalize_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.replace("\r\n", "\n"))
        }
        Value::Bool(b) => b.then(|| "true".to_string()),
        Value::Number(n) => {
            let zero = n.as_f64().map(|f| f == 0.0).unwrap_or(false);
            (!zero).then(|| n.to_string())
        }
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Text used to pre-fill an input; values that normalize away start empty.
pub fn prefill_text(value: &Value) -> String {
    match normalize_value(Some(value)) {
        Some(_) => display_value(value),
        None => String::new(),
    }
}

pub fn values_differ(original: Option<&Value>, current: Option<&Value>) -> bool {
    normalize_value(original) != normalize_value(current)
}

/// Compare original and reviewed fields.
///
/// Every original field is checked against its reviewed value; fields that
/// only exist in the reviewed set count when they carry a value.
pub fn corrections_made(original: &FieldMap, reviewed: &FieldMap) -> Corrections {
    let mut corrections = Corrections::new();

    for (name, original_value) in original {
        let current = reviewed.get(name);
        if values_differ(Some(original_value), current) {
            corrections.insert(
                name.clone(),
                Correction {
                    original: original_value.clone(),
                    corrected: current.cloned().unwrap_or(Value::Null),
                },
            );
        }
    }

    for (name, current) in reviewed {
        if !original.contains_key(name) && normalize_value(Some(current)).is_some() {
            corrections.insert(
                name.clone(),
                Correction {
                    original: Value::Null,
                    corrected: current.clone(),
                },
            );
        }
    }

    corrections
}

/// Replace blank strings with null.
pub fn clean_fields(reviewed: &FieldMap) -> FieldMap {
    reviewed
        .iter()
        .map(|(name, value)| {
            let cleaned = match value {
                Value::String(s) if s.trim().is_empty() => Value::Null,
                other => other.clone(),
            };
            (name.clone(), cleaned)
        })
        .collect()
}

/// An extraction counts as a success when nobody had to correct it.
pub fn is_success(corrections: &Corrections) -> bool {
    corrections.is_empty()
}

pub fn failure_reason(corrections: &Corrections) -> Option<String> {
    if corrections.is_empty() {
        return None;
    }
    let names: Vec<&str> = corrections.keys().map(String::as_str).collect();
    Some(format!(
        "Manual corrections made to {} field(s): {}",
        names.len(),
        names.join(", ")
    ))
}

/// Invalid or missing form input.
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// What the user asked the review form to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Re-render with modification markers.
    Check,
    Save,
    Cancel,
}

impl ReviewAction {
    pub fn parse(raw: &str) -> Result<Self, FormError> {
        match raw {
            "check" => Ok(ReviewAction::Check),
            "save" => Ok(ReviewAction::Save),
            "cancel" => Ok(ReviewAction::Cancel),
            other => Err(FormError::Invalid {
                field: "action",
                reason: format!("unknown action '{}'", other),
            }),
        }
    }
}

/// Everything needed to render, re-render and save a review.
#[derive(Debug, Clone)]
pub struct ReviewState {
    pub document_hash: Option<String>,
    pub filename: Option<String>,
    pub already_exists: bool,
    pub storage_url: Option<String>,
    /// Field values as extracted.
    pub original_fields: FieldMap,
    /// Full extraction response, echoed into the model log.
    pub extraction: Value,
    /// Current values as typed by the user.
    pub edited: FieldMap,
}

impl ReviewState {
    /// Start a review from a fresh extraction; nothing is edited yet.
    pub fn from_extraction(response: &ExtractionResponse, filename: Option<String>) -> Self {
        let original_fields = response.structured_fields.clone();
        let mut edited = FieldMap::new();
        for known in KNOWN_FIELDS {
            let value = original_fields
                .get(known.name)
                .map(prefill_text)
                .unwrap_or_default();
            edited.insert(known.name.to_string(), Value::String(value));
        }
        for (name, value) in &original_fields {
            edited
                .entry(name.clone())
                .or_insert_with(|| Value::String(prefill_text(value)));
        }

        Self {
            document_hash: response.document_hash.clone(),
            filename,
            already_exists: response.already_exists,
            storage_url: response.storage_url.clone(),
            original_fields,
            extraction: serde_json::to_value(response).unwrap_or(Value::Null),
            edited,
        }
    }

    /// Rebuild the review from submitted form pairs.
    pub fn from_form(pairs: &[(String, String)]) -> Result<(ReviewAction, Self), FormError> {
        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        let optional = |key: &str| lookup(key).map(str::trim).filter(|v| !v.is_empty());

        let action = ReviewAction::parse(lookup("action").ok_or(FormError::Missing("action"))?)?;

        let original_fields = match lookup("original_fields") {
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(FormError::Invalid {
                        field: "original_fields",
                        reason: "expected a JSON object".to_string(),
                    })
                }
                Err(e) => {
                    return Err(FormError::Invalid {
                        field: "original_fields",
                        reason: e.to_string(),
                    })
                }
            },
            None => return Err(FormError::Missing("original_fields")),
        };

        let extraction = match optional("extraction") {
            Some(raw) => serde_json::from_str(raw).map_err(|e| FormError::Invalid {
                field: "extraction",
                reason: e.to_string(),
            })?,
            None => Value::Null,
        };

        let mut edited = FieldMap::new();
        for (key, value) in pairs {
            if let Some(name) = key.strip_prefix(FIELD_PREFIX) {
                if !name.is_empty() {
                    edited.insert(name.to_string(), Value::String(value.replace("\r\n", "\n")));
                }
            }
        }

        let state = Self {
            document_hash: optional("document_hash").map(str::to_string),
            filename: optional("filename").map(str::to_string),
            already_exists: lookup("already_exists") == Some("true"),
            storage_url: optional("storage_url").map(str::to_string),
            original_fields,
            extraction,
            edited,
        };
        Ok((action, state))
    }

    /// Field names in display order: known fields, then the rest by name.
    pub fn field_order(&self) -> Vec<String> {
        let mut order: Vec<String> = KNOWN_FIELDS.iter().map(|f| f.name.to_string()).collect();
        let mut extra: Vec<String> = self
            .original_fields
            .keys()
            .chain(self.edited.keys())
            .filter(|name| !order.contains(*name))
            .cloned()
            .collect();
        extra.sort();
        extra.dedup();
        order.extend(extra);
        order
    }

    /// Current value of a field as shown in its input.
    pub fn edited_text(&self, name: &str) -> String {
        self.edited.get(name).map(display_value).unwrap_or_default()
    }

    pub fn corrections(&self) -> Corrections {
        corrections_made(&self.original_fields, &clean_fields(&self.edited))
    }

    pub fn is_modified(&self, name: &str) -> bool {
        let cleaned = clean_fields(&self.edited);
        let current = cleaned.get(name);
        match self.original_fields.get(name) {
            Some(original) => values_differ(Some(original), current),
            None => normalize_value(current).is_some(),
        }
    }

    pub fn save_request(&self) -> SaveRequest {
        SaveRequest {
            document_hash: self.document_hash.clone(),
            filename: self
                .filename
                .clone()
                .unwrap_or_else(|| FALLBACK_FILENAME.to_string()),
            structured_fields: clean_fields(&self.edited),
            success: is_success(&self.corrections()),
        }
    }

    /// Quality record posted after the backend accepted a save.
    pub fn model_log_record(&self, saved: &SaveResponse) -> ModelLogRecord {
        let corrections = self.corrections();
        ModelLogRecord {
            success: is_success(&corrections),
            document_id: saved.document_id.clone(),
            document_hash: self.document_hash.clone(),
            document_link: saved
                .storage_url
                .clone()
                .or_else(|| self.storage_url.clone()),
            extraction_result: self.extraction.clone(),
            original_values: self.original_fields.clone(),
            corrected_values: clean_fields(&self.edited),
            failure_reason: failure_reason(&corrections),
            corrections_made: corrections,
        }
    }
}
