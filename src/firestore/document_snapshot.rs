//! Document snapshot type

use super::field_value::{record_to_data, DocumentData, FieldValue};
use crate::error::FirebaseError;
use crate::pocketbase::Record;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// One document of a [`QuerySnapshot`](super::QuerySnapshot)
///
/// Document data is computed from the record on first access and cached.
#[derive(Debug, Clone)]
pub struct QueryDocumentSnapshot {
    id: String,
    record: Arc<Record>,
    data: OnceCell<DocumentData>,
}

impl QueryDocumentSnapshot {
    pub(crate) fn new(record: Record) -> Self {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            record: Arc::new(record),
            data: OnceCell::new(),
        }
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Documents in a query snapshot always exist
    pub fn exists(&self) -> bool {
        true
    }

    /// Document data
    ///
    /// A copy of the record's fields, plus `createdAt` / `updatedAt`.
    pub fn data(&self) -> &DocumentData {
        self.data.get_or_init(|| record_to_data(&self.record))
    }

    /// Get a field value by name
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.data().get(field)
    }

    /// Deserialize the document data into `T`
    ///
    /// Timestamps appear as `{"seconds", "nanoseconds"}` objects.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, FirebaseError> {
        let value = serde_json::to_value(self.data())?;
        Ok(serde_json::from_value(value)?)
    }

    /// The record this snapshot was built from
    pub fn record(&self) -> &Record {
        &self.record
    }
}
