//! Web server for reviewing extracted logistics documents.
//!
//! Provides three page groups backed by the extraction API:
//! - Upload and field review with change detection
//! - Document browser with filtering and deletion
//! - Model log analytics with charts

mod charts;
mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::Settings;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let backend = BackendClient::new(settings)?;

        Ok(Self {
            backend: Arc::new(backend),
            settings: Arc::new(settings.clone()),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!("Starting server at http://{}", addr);
    tracing::info!("Using backend at {}", settings.api_base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
