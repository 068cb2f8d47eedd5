//! End-to-end tests for the web routes.
//!
//! Each test starts a mock extraction backend on a random local port and
//! drives the real router with `oneshot` requests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use logidoc::config::Settings;
use logidoc::server::{create_router, AppState};

const BOUNDARY: &str = "logidoc-test-boundary";

#[derive(Default)]
struct MockBackend {
    fail_extract: bool,
    fail_save: bool,
    fail_delete: bool,
    fail_list_after_delete: bool,
    deleted: AtomicBool,
    extract_calls: AtomicUsize,
    saves: Mutex<Vec<Value>>,
    model_logs: Mutex<Vec<Value>>,
    documents: Mutex<Vec<Value>>,
}

type Mock = Arc<MockBackend>;

async fn mock_health() -> Json<Value> {
    Json(json!({"status": "ok", "database": "connected"}))
}

async fn mock_extract(State(mock): State<Mock>, _body: Bytes) -> impl IntoResponse {
    mock.extract_calls.fetch_add(1, Ordering::SeqCst);
    if mock.fail_extract {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "Could not read PDF"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "structured_fields": {
                "carrier": "DHL",
                "tracking_number": "TRK-100",
                "weight": "12 kg"
            },
            "document_hash": "hash-1",
            "is_valid": true,
            "already_exists": false,
            "storage_url": "gs://bucket/bol.pdf"
        })),
    )
}

async fn mock_save(State(mock): State<Mock>, Json(body): Json<Value>) -> impl IntoResponse {
    mock.saves.lock().unwrap().push(body);
    if mock.fail_save {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database unavailable"})),
        );
    }
    (StatusCode::OK, Json(json!({"document_id": 17})))
}

async fn mock_model_log(State(mock): State<Mock>, Json(body): Json<Value>) -> Json<Value> {
    mock.model_logs.lock().unwrap().push(body);
    Json(json!({"id": 1, "status": "created"}))
}

async fn mock_documents(State(mock): State<Mock>) -> impl IntoResponse {
    if mock.fail_list_after_delete && mock.deleted.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"detail": "database unavailable"})),
        );
    }
    let docs = mock.documents.lock().unwrap().clone();
    (
        StatusCode::OK,
        Json(json!({"total": docs.len(), "documents": docs})),
    )
}

async fn mock_document(State(mock): State<Mock>, Path(id): Path<String>) -> impl IntoResponse {
    let docs = mock.documents.lock().unwrap();
    match docs.iter().find(|d| d["id"].to_string() == id) {
        Some(doc) => (StatusCode::OK, Json(doc.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Document not found"}))),
    }
}

async fn mock_delete(State(mock): State<Mock>, Path(id): Path<String>) -> impl IntoResponse {
    if mock.fail_delete {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "locked"})));
    }
    mock.documents
        .lock()
        .unwrap()
        .retain(|d| d["id"].to_string() != id);
    mock.deleted.store(true, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({"deleted": id})))
}

async fn mock_model_logs() -> Json<Value> {
    Json(json!({
        "total": 4,
        "logs": [
            {"id": 1, "success": true, "document_id": 1, "created_at": "2024-05-01T10:14:10"},
            {"id": 2, "success": false, "document_id": 2, "created_at": "2024-05-01T10:15:20",
             "corrections_made": {"carrier": {"original": "DHL", "corrected": "UPS"}},
             "failure_reason": "Manual corrections made to 1 field(s): carrier"},
            {"id": 3, "success": true, "document_id": 3, "created_at": "2024-05-01T10:15:40"},
            {"id": 4, "success": true, "document_id": 4, "created_at": null}
        ]
    }))
}

async fn start_backend(mock: MockBackend) -> (Router, Mock) {
    let mock = Arc::new(mock);
    let backend = Router::new()
        .route("/health", get(mock_health))
        .route("/extract", post(mock_extract))
        .route("/save", post(mock_save))
        .route("/model-log", post(mock_model_log))
        .route("/documents", get(mock_documents))
        .route("/documents/:id", get(mock_document).delete(mock_delete))
        .route("/model-logs", get(mock_model_logs))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });

    let settings = Settings::with_api_base_url(&format!("http://{}", addr)).unwrap();
    let app = create_router(AppState::new(&settings).unwrap());
    (app, mock)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn upload_request(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: application/pdf\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn review_request(action: &str, carrier: &str) -> Request<Body> {
    let original = json!({"carrier": "DHL", "tracking_number": "TRK-100", "weight": "12 kg"});
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("action", action)
        .append_pair("document_hash", "hash-1")
        .append_pair("filename", "bol.pdf")
        .append_pair("storage_url", "gs://bucket/bol.pdf")
        .append_pair("already_exists", "false")
        .append_pair("original_fields", &original.to_string())
        .append_pair("extraction", r#"{"is_valid":true}"#)
        .append_pair("field.carrier", carrier)
        .append_pair("field.tracking_number", "TRK-100")
        .append_pair("field.weight", "12 kg")
        .append_pair("field.shipper_name", "")
        .finish();
    Request::builder()
        .method("POST")
        .uri("/review")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn seeded_documents() -> MockBackend {
    let mock = MockBackend::default();
    *mock.documents.lock().unwrap() = vec![
        json!({"id": 1, "filename": "bol-1.pdf", "carrier": "DHL"}),
        json!({"id": 2, "filename": "bol-2.pdf", "carrier": "UPS"}),
        json!({"id": 3, "filename": "bol-3.pdf", "carrier": "FedEx"}),
    ];
    mock
}

// ============================================================================
// Upload / review
// ============================================================================

#[tokio::test]
async fn upload_page_shows_backend_status() {
    let (app, _mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(get_request("/?saved=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("API Connected"));
    assert!(html.contains("Database Connected"));
    assert!(html.contains("Document saved"));
}

#[tokio::test]
async fn extraction_renders_prefilled_form() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app
        .oneshot(upload_request("bol.pdf", "%PDF-1.4 test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Review Extracted Fields"));
    assert!(html.contains(r#"name="field.carrier" value="DHL""#));
    assert!(html.contains(r#"name="document_hash" value="hash-1""#));
    assert_eq!(mock.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extraction_failure_renders_no_form() {
    let (app, mock) = start_backend(MockBackend {
        fail_extract: true,
        ..Default::default()
    })
    .await;
    let response = app
        .oneshot(upload_request("bol.pdf", "%PDF-1.4 test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let html = body_text(response).await;
    assert!(html.contains("Could not read PDF"));
    assert!(!html.contains("Review Extracted Fields"));
    assert!(mock.saves.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_pdf_upload_never_reaches_backend() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app
        .oneshot(upload_request("notes.txt", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("not a PDF"));
    assert_eq!(mock.extract_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn save_with_edit_reports_failure_flag() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(review_request("save", "UPS")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/?saved=1");

    let saves = mock.saves.lock().unwrap();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0]["success"], false);
    assert_eq!(saves[0]["structured_fields"]["carrier"], "UPS");
    assert_eq!(saves[0]["structured_fields"]["shipper_name"], Value::Null);

    let logs = mock.model_logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["success"], false);
    assert_eq!(logs[0]["document_id"], 17);
    assert_eq!(logs[0]["document_link"], "gs://bucket/bol.pdf");
    assert_eq!(logs[0]["corrections_made"]["carrier"]["corrected"], "UPS");
}

#[tokio::test]
async fn save_without_edit_reports_success() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(review_request("save", " DHL ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(mock.saves.lock().unwrap()[0]["success"], true);
    let logs = mock.model_logs.lock().unwrap();
    assert_eq!(logs[0]["success"], true);
    assert_eq!(logs[0]["failure_reason"], Value::Null);
}

#[tokio::test]
async fn save_failure_keeps_edits() {
    let (app, mock) = start_backend(MockBackend {
        fail_save: true,
        ..Default::default()
    })
    .await;
    let response = app.oneshot(review_request("save", "UPS")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let html = body_text(response).await;
    assert!(html.contains("database unavailable"));
    assert!(html.contains(r#"name="field.carrier" value="UPS""#));
    assert!(html.contains(r#"name="original_fields""#));
    assert!(mock.model_logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn check_marks_modified_fields_without_saving() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(review_request("check", "UPS")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("1 field(s) modified: carrier"));
    assert!(mock.saves.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_redirects_home() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(review_request("cancel", "UPS")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(mock.saves.lock().unwrap().is_empty());
}

// ============================================================================
// Document browser
// ============================================================================

#[tokio::test]
async fn documents_are_filtered() {
    let (app, _mock) = start_backend(seeded_documents()).await;
    let response = app.oneshot(get_request("/documents?q=ups")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"data-id="2""#));
    assert!(!html.contains(r#"data-id="1""#));
    assert!(!html.contains(r#"data-id="3""#));
    assert!(html.contains("Total documents: 3 (showing 1)"));
}

#[tokio::test]
async fn delete_removes_exactly_one_row() {
    let (app, _mock) = start_backend(seeded_documents()).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/documents/2/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Document 2 deleted successfully"));
    assert!(html.contains(r#"data-id="1""#));
    assert!(!html.contains(r#"data-id="2""#));
    assert!(html.contains(r#"data-id="3""#));
}

#[tokio::test]
async fn failed_delete_keeps_all_rows() {
    let mut mock = seeded_documents();
    mock.fail_delete = true;
    let (app, _mock) = start_backend(mock).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/documents/2/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let html = body_text(response).await;
    assert!(html.contains("Error: locked"));
    assert_eq!(html.matches("<tr data-id=").count(), 3);
}

#[tokio::test]
async fn delete_reported_when_list_refresh_fails() {
    let mut mock = seeded_documents();
    mock.fail_list_after_delete = true;
    let (app, mock) = start_backend(mock).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/documents/2/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Document 2 deleted successfully"));
    assert!(html.contains("Could not refresh the document list: database unavailable"));
    assert_eq!(html.matches("<tr data-id=").count(), 0);
    assert_eq!(mock.documents.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let (app, _mock) = start_backend(seeded_documents()).await;
    let response = app.oneshot(get_request("/documents/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Model log
// ============================================================================

#[tokio::test]
async fn model_log_page_aggregates_entries() {
    let (app, _mock) = start_backend(MockBackend::default()).await;
    let response = app.oneshot(get_request("/model-logs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"<span class="metric-value">4</span>"#));
    assert!(html.contains(r#"<span class="metric-value">3</span><span class="metric-delta">75.0%</span>"#));
    assert!(html.contains(r#"<span class="metric-value">1</span><span class="metric-delta">25.0%</span>"#));
    assert_eq!(html.matches("series-dot").count(), 2);
    assert!(html.contains("Manual corrections made to 1 field(s): carrier"));
}

#[tokio::test]
async fn test_log_form_posts_synthetic_entry() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let body = "success=false&document_id=3&document_hash=abc&document_link=&failure_reason=bad+carrier&corrections_count=1";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/model-logs/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Model log created successfully!"));

    let logs = mock.model_logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["success"], false);
    assert_eq!(logs[0]["document_id"], 3);
    assert_eq!(logs[0]["failure_reason"], "bad carrier");
}

#[tokio::test]
async fn test_log_form_rejects_blank_document_id() {
    let (app, mock) = start_backend(MockBackend::default()).await;
    let body = "success=true&document_id=&document_hash=abc&document_link=&failure_reason=&corrections_count=0";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/model-logs/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("Error: missing required field 'document_id'"));
    assert!(html.contains("Create Test Model Log Entry"));
    assert!(mock.model_logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn model_log_page_ignores_bad_limit() {
    let (app, _mock) = start_backend(MockBackend::default()).await;
    let response = app
        .oneshot(get_request("/model-logs?limit=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("series-dot"));
}
