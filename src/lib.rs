//! logidoc - review frontend for logistics document extraction.
//!
//! Uploads documents to an extraction backend, lets a person correct the
//! extracted fields, and reports how often the extraction was right.

pub mod analytics;
pub mod backend;
pub mod config;
pub mod documents;
pub mod models;
pub mod review;
pub mod server;

pub use config::Settings;
