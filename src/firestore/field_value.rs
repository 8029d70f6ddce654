//! Document field values
//!
//! Converts between PocketBase records and the document data callers see:
//! reads add `createdAt` / `updatedAt` timestamps, writes require a JSON
//! object.

use super::timestamp::Timestamp;
use crate::error::{FirebaseError, FirestoreError};
use crate::pocketbase::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Record fields mirrored as timestamps, with the name they are exposed under
const TIMESTAMP_FIELDS: [(&str, &str); 2] = [("created", "createdAt"), ("updated", "updatedAt")];

/// A document field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Timestamp derived from a record date field
    Timestamp(Timestamp),
    /// Any JSON value, as stored in the record
    Value(Value),
}

impl FieldValue {
    /// Timestamp, if this is one
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts),
            FieldValue::Value(_) => None,
        }
    }

    /// JSON value, if this is not a timestamp
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(value) => Some(value),
            FieldValue::Timestamp(_) => None,
        }
    }

    /// String content of a plain string value
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(ts: Timestamp) -> Self {
        FieldValue::Timestamp(ts)
    }
}

/// Document data keyed by field name
pub type DocumentData = BTreeMap<String, FieldValue>;

/// Shallow copy of `record`, plus `createdAt` / `updatedAt` for non-empty
/// `created` / `updated` fields
///
/// Dates that fail to parse are logged and the derived field is left out.
pub(crate) fn record_to_data(record: &Record) -> DocumentData {
    let mut data: DocumentData = record
        .iter()
        .map(|(key, value)| (key.clone(), FieldValue::Value(value.clone())))
        .collect();

    for (source, target) in TIMESTAMP_FIELDS {
        let Some(raw) = record.get(source).and_then(Value::as_str) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        match Timestamp::parse(raw) {
            Ok(ts) => {
                data.insert(target.to_string(), FieldValue::Timestamp(ts));
            }
            Err(err) => {
                warn!(field = source, id = ?record.get("id"), error = %err, "skipping unparseable record date");
            }
        }
    }
    data
}

/// Serialize write data into a record body
///
/// The data must serialize to a JSON object.
pub(crate) fn to_record<T>(data: &T) -> Result<Record, FirebaseError>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(data)? {
        Value::Object(record) => Ok(record),
        other => Err(FirestoreError::InvalidData(format!(
            "document data must be an object, got {}",
            json_kind(&other)
        ))
        .into()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Current client wall-clock time, for use in write data
///
/// Unlike the SDK sentinel this is resolved locally, not by the server.
pub fn server_timestamp() -> DateTime<Utc> {
    Utc::now()
}
