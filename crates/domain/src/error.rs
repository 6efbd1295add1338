//! Engine error taxonomy.

use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Malformed schedule data is deliberately not represented here: the
/// schedule services degrade to "no schedule" instead of failing, so a
/// bad configuration can never break a dashboard or a reminder tick.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("An urgent session is already active for this group")]
    AlreadyActive,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].clone()
        } else {
            format!("{} validation errors", details.len())
        };

        EngineError::Validation(message)
    }
}
