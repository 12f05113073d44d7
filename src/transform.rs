//! Conversion of a primary detail record into the shape the write endpoint
//! accepts.

use anyhow::Result;
use serde_json::Value;

use crate::{LeaseDetail, SyncError};

/// Fields the write endpoint rejects or must assign itself.
///
/// `nextServer` is left to the secondary because a hex value gets re-quoted
/// on the way back in.
const DROPPED_FIELDS: [&str; 2] = ["subnet", "nextServer"];

/// Turn a detail record into a create request record.
///
/// Drops `subnet` and `nextServer` and copies `hostname` into `name`. Takes
/// the record by value so it cannot be applied twice.
pub fn prepare_for_write(mut detail: LeaseDetail) -> Result<LeaseDetail> {
    let Some(hostname) = detail.get("hostname").cloned() else {
        return Err(SyncError::MissingField {
            field: "hostname",
            record: Value::Object(detail.fields().clone()).to_string(),
        }
        .into());
    };

    for field in DROPPED_FIELDS {
        detail.remove(field);
    }
    detail.insert("name", hostname);

    Ok(detail)
}

/// Flatten a record into `key=value` pairs for a form body.
pub fn form_fields(record: &LeaseDetail) -> Vec<(String, String)> {
    record
        .fields()
        .iter()
        .map(|(key, value)| (key.clone(), form_value(value)))
        .collect()
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
