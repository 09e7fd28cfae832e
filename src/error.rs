//! Error types for the agency desk.
//!
//! Store and form operations return [`AgencyResult`]. The aggregation and
//! filter engines never fail and do not use these types.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgencyError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("No profile found for user {0}")]
    Unauthenticated(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgencyError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type AgencyResult<T> = Result<T, AgencyError>;

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field error collected while validating one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns true if `field` has at least one error.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the collected errors into a result carrying `value` when empty.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors()
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "is required");
        errors.add("email", "is not a valid address");

        assert!(errors.has("email"));
        assert!(!errors.has("phone"));
        assert_eq!(
            errors.to_string(),
            "name: is required; email: is not a valid address"
        );
    }

    #[test]
    fn test_finish() {
        assert_eq!(ValidationErrors::new().finish(7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.add("title", "is required");
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_agency_error_from_validation() {
        let mut errors = ValidationErrors::new();
        errors.add("amount", "must not be negative");
        let err: AgencyError = errors.into();
        assert!(err.to_string().contains("amount: must not be negative"));
    }
}
