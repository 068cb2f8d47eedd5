//! HTTP request handlers for the web interface.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::templates::{self, Notice, TestLogDefaults};
use super::AppState;
use crate::analytics::{bucket_by_minute, LogSummary};
use crate::backend::{BackendError, UploadedFile};
use crate::documents::DocumentTable;
use crate::models::{Correction, Corrections, FieldMap, ModelLogEntry, ModelLogRecord};
use crate::review::{FormError, ReviewAction, ReviewState};

/// Number of entries shown under the test form.
const RECENT_LOG_LIMIT: u32 = 10;

/// Upper bound for the analytics `limit` parameter.
const MAX_MODEL_LOG_LIMIT: u32 = 1000;

fn page(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}

fn backend_failure(title: &str, err: &BackendError) -> Response {
    page(
        StatusCode::BAD_GATEWAY,
        templates::error_page(title, &format!("Error: {}", err)),
    )
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], templates::CSS)
}

// ============================================================================
// Upload / review
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    saved: Option<String>,
}

pub async fn upload_page(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
) -> Response {
    let status = state.backend.health().await;
    let messages: Vec<(Notice, &str)> = if query.saved.is_some() {
        vec![(Notice::Success, "Document saved")]
    } else {
        Vec::new()
    };
    page(StatusCode::OK, templates::upload_page(&status, &messages))
}

/// Read the `file` part of an upload form.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, FormError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| FormError::Invalid {
        field: "file",
        reason: e.to_string(),
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or(FormError::Missing("file"))?;
        let bytes = field.bytes().await.map_err(|e| FormError::Invalid {
            field: "file",
            reason: e.to_string(),
        })?;
        validate_pdf(&filename, &bytes)?;

        return Ok(UploadedFile {
            filename,
            content_type: "application/pdf".to_string(),
            bytes: bytes.to_vec(),
        });
    }
    Err(FormError::Missing("file"))
}

/// Accept only non-empty PDFs, judged by both name and content.
pub fn validate_pdf(filename: &str, bytes: &[u8]) -> Result<(), FormError> {
    if bytes.is_empty() {
        return Err(FormError::Invalid {
            field: "file",
            reason: "the uploaded file is empty".to_string(),
        });
    }

    let by_name = mime_guess::from_path(filename).first();
    if by_name.as_ref().map(|m| m.essence_str()) != Some("application/pdf") {
        return Err(FormError::Invalid {
            field: "file",
            reason: format!("{} is not a PDF file", filename),
        });
    }

    match infer::get(bytes) {
        Some(kind) if kind.mime_type() == "application/pdf" => Ok(()),
        Some(kind) => Err(FormError::Invalid {
            field: "file",
            reason: format!("{} contains {}, not a PDF", filename, kind.mime_type()),
        }),
        None => Err(FormError::Invalid {
            field: "file",
            reason: format!("{} does not look like a PDF", filename),
        }),
    }
}

pub async fn extract(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            let status = state.backend.health().await;
            let message = format!("Error: {}", e);
            return page(
                StatusCode::BAD_REQUEST,
                templates::upload_page(&status, &[(Notice::Error, message.as_str())]),
            );
        }
    };

    let filename = upload.filename.clone();
    match state.backend.extract(upload).await {
        Ok(response) if !response.is_valid => {
            let message = response
                .validation_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("Not a valid logistics document");
            page(StatusCode::OK, templates::invalid_document(message))
        }
        Ok(response) => {
            info!(%filename, fields = response.structured_fields.len(), "extraction ready for review");
            let review = ReviewState::from_extraction(&response, Some(filename));
            page(StatusCode::OK, templates::review_form(&review, &[], false))
        }
        Err(e) => {
            warn!(%filename, "extraction failed: {}", e);
            let status = state.backend.health().await;
            let message = format!("Error: {}", e);
            page(
                StatusCode::BAD_GATEWAY,
                templates::upload_page(&status, &[(Notice::Error, message.as_str())]),
            )
        }
    }
}

pub async fn review(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let (action, review) = match ReviewState::from_form(&pairs) {
        Ok(parsed) => parsed,
        Err(e) => {
            return page(
                StatusCode::BAD_REQUEST,
                templates::error_page("Review", &format!("Error: {}", e)),
            )
        }
    };

    match action {
        ReviewAction::Cancel => Redirect::to("/").into_response(),
        ReviewAction::Check => page(StatusCode::OK, templates::review_form(&review, &[], true)),
        ReviewAction::Save => save_review(&state, review).await,
    }
}

async fn save_review(state: &AppState, review: ReviewState) -> Response {
    if review.already_exists {
        return page(
            StatusCode::CONFLICT,
            templates::review_form(
                &review,
                &[(Notice::Error, "Error: document already in db")],
                true,
            ),
        );
    }

    let request = review.save_request();
    let saved = match state.backend.save(&request).await {
        Ok(saved) => saved,
        Err(e) => {
            warn!("save failed: {}", e);
            let message = format!("Error: {}", e);
            return page(
                StatusCode::BAD_GATEWAY,
                templates::review_form(&review, &[(Notice::Error, message.as_str())], true),
            );
        }
    };

    info!(
        document_id = ?saved.document_id,
        success = request.success,
        "document saved"
    );

    if state.settings.log_corrections {
        let record = review.model_log_record(&saved);
        if let Err(e) = state.backend.log_model(&record).await {
            warn!("Failed to log model quality: {}", e);
        }
    }

    Redirect::to("/?saved=1").into_response()
}

// ============================================================================
// Document browser
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    #[serde(default)]
    q: String,
}

pub async fn documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentsQuery>,
) -> Response {
    match state.backend.list_documents().await {
        Ok(list) => {
            let table = DocumentTable::new(list.documents).filter(&query.q);
            page(
                StatusCode::OK,
                templates::documents_page(&table, list.total, &query.q, &[]),
            )
        }
        Err(e) => backend_failure("Database Content", &e),
    }
}

pub async fn document_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.backend.get_document(&id).await {
        Ok(detail) => page(StatusCode::OK, templates::document_detail(&id, &detail)),
        Err(e) if e.status() == Some(404) => page(
            StatusCode::NOT_FOUND,
            templates::error_page("Document", &format!("Document {} not found", id)),
        ),
        Err(e) => backend_failure("Document", &e),
    }
}

pub async fn delete_confirm(Path(id): Path<String>) -> Html<String> {
    Html(templates::delete_confirm(&id))
}

pub async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let outcome = state.backend.delete_document(&id).await;

    let mut status = StatusCode::OK;
    let mut messages: Vec<(Notice, String)> = Vec::new();
    match &outcome {
        Ok(()) => {
            info!(id = %id, "document deleted");
            messages.push((Notice::Success, format!("Document {} deleted successfully", id)));
        }
        Err(e) => {
            warn!(id = %id, error = %e, "delete failed");
            status = StatusCode::BAD_GATEWAY;
            messages.push((Notice::Error, format!("Error: {}", e)));
        }
    }

    // The delete result stands even when the list cannot be reloaded.
    let (mut table, total) = match state.backend.list_documents().await {
        Ok(list) => (DocumentTable::new(list.documents), list.total),
        Err(e) => {
            warn!(error = %e, "could not refresh document list");
            messages.push((
                Notice::Error,
                format!("Could not refresh the document list: {}", e),
            ));
            (DocumentTable::default(), None)
        }
    };
    if outcome.is_ok() {
        table.remove(&id);
    }

    let notices: Vec<(Notice, &str)> = messages
        .iter()
        .map(|(kind, text)| (*kind, text.as_str()))
        .collect();
    page(status, templates::documents_page(&table, total, "", &notices))
}

// ============================================================================
// Model log
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ModelLogsQuery {
    #[serde(default)]
    limit: Option<String>,
}

impl ModelLogsQuery {
    /// Requested limit, or `default` when absent or unparseable.
    fn limit_or(&self, default: u32) -> u32 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(default)
            .clamp(1, MAX_MODEL_LOG_LIMIT)
    }
}

pub async fn model_logs(
    State(state): State<AppState>,
    Query(query): Query<ModelLogsQuery>,
) -> Response {
    let limit = query.limit_or(state.settings.model_log_limit);

    match state.backend.list_model_logs(limit).await {
        Ok(list) => {
            let summary = LogSummary::from_entries(&list.logs);
            let buckets = bucket_by_minute(&list.logs);
            page(
                StatusCode::OK,
                templates::model_logs_page(&list.logs, &summary, &buckets, list.total, limit),
            )
        }
        Err(e) => backend_failure("Model Log", &e),
    }
}

/// Raw test log form as submitted; parsed by [`TestLogInput::parse`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestLogInput {
    pub success: String,
    pub document_id: String,
    pub document_hash: String,
    pub document_link: String,
    pub failure_reason: String,
    pub corrections_count: String,
}

impl TestLogInput {
    pub fn parse(&self) -> Result<TestLogForm, FormError> {
        let success = match self.success.trim() {
            "true" => true,
            "false" => false,
            "" => return Err(FormError::Missing("success")),
            other => {
                return Err(FormError::Invalid {
                    field: "success",
                    reason: format!("expected true or false, got '{}'", other),
                })
            }
        };

        let document_id = match self.document_id.trim() {
            "" => return Err(FormError::Missing("document_id")),
            raw => raw.parse::<u64>().map_err(|e| FormError::Invalid {
                field: "document_id",
                reason: e.to_string(),
            })?,
        };

        let corrections_count = match self.corrections_count.trim() {
            "" => 0,
            raw => raw.parse::<u32>().map_err(|e| FormError::Invalid {
                field: "corrections_count",
                reason: e.to_string(),
            })?,
        };

        Ok(TestLogForm {
            success,
            document_id,
            document_hash: self.document_hash.clone(),
            document_link: self.document_link.clone(),
            failure_reason: self.failure_reason.clone(),
            corrections_count,
        })
    }

    /// Echo the submitted values back into the form.
    fn defaults(&self) -> TestLogDefaults<'_> {
        TestLogDefaults {
            success: self.success.trim() != "false",
            document_id: &self.document_id,
            document_hash: &self.document_hash,
            document_link: &self.document_link,
            failure_reason: &self.failure_reason,
            corrections_count: &self.corrections_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestLogForm {
    pub success: bool,
    pub document_id: u64,
    pub document_hash: String,
    pub document_link: String,
    pub failure_reason: String,
    pub corrections_count: u32,
}

/// Build a model log record with sample values for testing the backend.
pub fn synthetic_log_record(form: &TestLogForm) -> ModelLogRecord {
    let sample = |shipper: &str| -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("tracking_number".into(), json!("TRACK123"));
        map.insert("shipper_name".into(), json!(shipper));
        map.insert("receiver_name".into(), json!("Original Receiver"));
        map
    };

    let original_values = sample("Original Shipper");
    let corrected_values = if form.success {
        sample("Original Shipper")
    } else {
        sample("Corrected Shipper")
    };

    let mut corrections_made = Corrections::new();
    if !form.success && form.corrections_count > 0 {
        corrections_made.insert(
            "shipper_name".to_string(),
            Correction {
                original: json!("Original Shipper"),
                corrected: json!("Corrected Shipper"),
            },
        );
    }

    let optional = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    ModelLogRecord {
        success: form.success,
        document_id: Some(json!(form.document_id)),
        document_hash: optional(&form.document_hash),
        document_link: optional(&form.document_link),
        extraction_result: json!({
            "model": "gpt-4o-mini",
            "timestamp": Utc::now().to_rfc3339(),
            "raw_response": "Test extraction result"
        }),
        original_values,
        corrected_values,
        corrections_made,
        failure_reason: if form.success {
            None
        } else {
            optional(&form.failure_reason)
        },
    }
}

pub async fn model_log_test_page(State(state): State<AppState>) -> Response {
    let (recent, error) = recent_logs(&state).await;
    page(
        StatusCode::OK,
        templates::model_log_test_page(
            &TestLogDefaults::default(),
            &[],
            None,
            &recent,
            error.as_deref(),
        ),
    )
}

async fn recent_logs(state: &AppState) -> (Vec<ModelLogEntry>, Option<String>) {
    match state.backend.list_model_logs(RECENT_LOG_LIMIT).await {
        Ok(list) => (list.logs, None),
        Err(e) => (Vec::new(), Some(format!("Error: {}", e))),
    }
}

pub async fn create_test_log(
    State(state): State<AppState>,
    Form(input): Form<TestLogInput>,
) -> Response {
    let defaults = input.defaults();

    let form = match input.parse() {
        Ok(form) => form,
        Err(e) => {
            let (recent, recent_error) = recent_logs(&state).await;
            let message = format!("Error: {}", e);
            return page(
                StatusCode::BAD_REQUEST,
                templates::model_log_test_page(
                    &defaults,
                    &[(Notice::Error, message.as_str())],
                    None,
                    &recent,
                    recent_error.as_deref(),
                ),
            );
        }
    };

    let record = synthetic_log_record(&form);
    let created = state.backend.log_model(&record).await;
    let (recent, recent_error) = recent_logs(&state).await;

    match created {
        Ok(result) => page(
            StatusCode::OK,
            templates::model_log_test_page(
                &defaults,
                &[(Notice::Success, "Model log created successfully!")],
                Some(&result),
                &recent,
                recent_error.as_deref(),
            ),
        ),
        Err(e) => {
            let message = format!("Error: {}", e);
            page(
                StatusCode::BAD_GATEWAY,
                templates::model_log_test_page(
                    &defaults,
                    &[(Notice::Error, message.as_str())],
                    None,
                    &recent,
                    recent_error.as_deref(),
                ),
            )
        }
    }
}
