//! Request payload checks. Pure functions over the parsed JSON body, no HTTP
//! or store concerns.

use serde_json::Value;

use crate::error::ValidationError;
use crate::models::TodoChanges;

/// Returns the trimmed title of a create payload.
pub fn validate_create(payload: &Value) -> Result<String, ValidationError> {
    match payload.get("title") {
        Some(Value::String(title)) => non_empty_trimmed(title).ok_or(ValidationError::MissingTitle),
        _ => Err(ValidationError::MissingTitle),
    }
}

/// Each field is optional; a present field must be well-formed. An empty
/// payload is a legal no-op update.
pub fn validate_update(payload: &Value) -> Result<TodoChanges, ValidationError> {
    let mut changes = TodoChanges::default();

    if let Some(title) = payload.get("title") {
        let title = title
            .as_str()
            .and_then(non_empty_trimmed)
            .ok_or(ValidationError::InvalidTitle)?;
        changes.title = Some(title);
    }

    if let Some(completed) = payload.get("completed") {
        let completed = completed.as_bool().ok_or(ValidationError::InvalidCompleted)?;
        changes.completed = Some(completed);
    }

    Ok(changes)
}

pub fn validate_id(raw: &str) -> Result<i64, ValidationError> {
    raw.trim().parse::<i64>().map_err(|_| ValidationError::InvalidId)
}

fn non_empty_trimmed(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
