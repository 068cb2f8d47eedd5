//! The document browser's in-page view of stored records.

use serde_json::Value;

use crate::models::{display_value, StoredDocument};

/// Documents as displayed in the browser table.
#[derive(Debug, Clone, Default)]
pub struct DocumentTable {
    pub documents: Vec<StoredDocument>,
}

impl DocumentTable {
    pub fn new(documents: Vec<StoredDocument>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Keep only documents where some scalar value contains `query`,
    /// case-insensitively. A blank query keeps everything.
    pub fn filter(self, query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        let documents = self
            .documents
            .into_iter()
            .filter(|doc| matches_query(doc, &needle))
            .collect();
        Self { documents }
    }

    /// Drop the document with `id`. Returns whether a row was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id() != id);
        self.documents.len() != before
    }
}

fn matches_query(doc: &StoredDocument, needle: &str) -> bool {
    doc.0.values().any(|value| match value {
        Value::Array(_) | Value::Object(_) | Value::Null => false,
        scalar => display_value(scalar).to_lowercase().contains(needle),
    })
}
