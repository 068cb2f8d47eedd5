//! Route table for the web interface.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Largest accepted upload, multipart overhead included.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::upload_page))
        .route("/extract", axum::routing::post(handlers::extract))
        .route("/review", axum::routing::post(handlers::review))
        .route("/documents", get(handlers::documents))
        .route("/documents/:id", get(handlers::document_detail))
        .route(
            "/documents/:id/delete",
            get(handlers::delete_confirm).post(handlers::delete_document),
        )
        .route("/model-logs", get(handlers::model_logs))
        .route(
            "/model-logs/test",
            get(handlers::model_log_test_page).post(handlers::create_test_log),
        )
        .route("/static/style.css", get(handlers::stylesheet))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
