//! Turning an edit-surface draft into the body of a create/update request.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use shared::record::{Record, RecordId};

use crate::error::CoreError;

/// Field name to value, keyed by wire name. Used for drafts and request bodies.
pub type Payload = Map<String, Value>;

const ID_FIELD: &str = "id";

/// Per-kind rules for which explicit nulls survive normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadPolicy {
    pub clearable_fields: BTreeSet<String>,
}

impl PayloadPolicy {
    pub fn clearable(fields: &[&str]) -> Self {
        Self {
            clearable_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn is_clearable(&self, field: &str) -> bool {
        self.clearable_fields.contains(field)
    }
}

/// Empty strings mean "not provided" and are dropped. Nulls are dropped too,
/// except on clearable fields where a null asks the server to clear the value.
/// The record id travels in the URL, never in the body.
pub fn normalize_payload(draft: &Payload, policy: &PayloadPolicy) -> Payload {
    draft
        .iter()
        .filter(|(field, value)| {
            if field.as_str() == ID_FIELD {
                return false;
            }
            match value {
                Value::String(text) => !text.is_empty(),
                Value::Null => policy.is_clearable(field),
                _ => true,
            }
        })
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

pub fn validate_required(draft: &Payload, required: &[String]) -> Result<(), CoreError> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| match draft.get(field.as_str()) {
            None | Some(Value::Null) => true,
            Some(Value::String(text)) => text.trim().is_empty(),
            Some(_) => false,
        })
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "required fields missing: {}",
            missing.join(", ")
        )))
    }
}

pub fn draft_from_record<E: Record>(record: &E) -> Result<Payload, CoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::Validation(format!(
            "record does not serialize to an object: {other}"
        ))),
        Err(err) => Err(CoreError::Validation(format!(
            "record cannot be edited: {err}"
        ))),
    }
}

/// Draft shown when the editor reopens after a failed save: `{id?, ...payload}`.
pub fn prefilled_draft(target_id: Option<&RecordId>, payload: &Payload) -> Payload {
    let mut draft = Payload::new();
    if let Some(id) = target_id {
        if let Ok(value) = serde_json::to_value(id) {
            draft.insert(ID_FIELD.to_string(), value);
        }
    }
    for (field, value) in payload {
        draft.insert(field.clone(), value.clone());
    }
    draft
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
