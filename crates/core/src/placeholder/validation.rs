use serde::Serialize;
use serde_json::Value;

use super::Placeholder;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub property_name: &'static str,
    pub error_message: String,
    pub attempted_value: Value,
}

impl ValidationFailure {
    fn new(property_name: &'static str, error_message: &str, attempted_value: Value) -> Self {
        Self {
            property_name,
            error_message: error_message.to_string(),
            attempted_value,
        }
    }
}

/// Validates a placeholder before creation or update.
///
/// Returns every failing rule as a list. The only rule is a non-zero id.
pub fn validate_placeholder(placeholder: &Placeholder) -> Result<(), Vec<ValidationFailure>> {
    let mut failures = Vec::new();

    if placeholder.id == 0 {
        failures.push(ValidationFailure::new(
            "Id",
            "Id is required",
            Value::from(placeholder.id),
        ));
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
