//! HTTP client for the extraction backend.

mod client;

pub use client::{BackendClient, BackendError, UploadedFile};
