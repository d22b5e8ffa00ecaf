use serde::Serialize;

use crate::store::StoreError;

// ============================================================================
// Domain Errors - What a Team/Fixture operation can fail with
// ============================================================================
//
// Validation and AlreadyExists are caller mistakes and are never logged as
// faults. Cancelled/Timeout carry the context outcome through untouched.
// Everything else a store raises is Internal.
//
// ============================================================================

pub const CANNOT_CREATE_FIXTURE: &str = "fixtures/cannot-create-fixture";
pub const FIXTURE_REQUEST_FAILED: &str = "Your request to create a fixture failed";
pub const SAME_TEAM_MESSAGE: &str = "home team and away team must be different";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub details: Vec<ValidationDetail>,
}

impl ValidationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// The fixture write rejection, before any detail is attached
    pub fn fixture_request() -> Self {
        Self::new(CANNOT_CREATE_FIXTURE, FIXTURE_REQUEST_FAILED)
    }

    pub fn same_team() -> Self {
        Self::new(CANNOT_CREATE_FIXTURE, SAME_TEAM_MESSAGE)
    }

    pub fn add_detail(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.details.push(ValidationDetail {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_details(&self) -> bool {
        !self.details.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error("{collection} already contains this {field}")]
    AlreadyExists { collection: String, field: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out")]
    Timeout,

    #[error("internal store error: {0}")]
    Internal(StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::Validation(err)
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey {
                collection, field, ..
            } => DomainError::AlreadyExists { collection, field },
            StoreError::Cancelled => DomainError::Cancelled,
            StoreError::Timeout => DomainError::Timeout,
            other => DomainError::Internal(other),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_signals_are_classified() {
        let duplicate = StoreError::DuplicateKey {
            collection: "teams".to_string(),
            field: "name".to_string(),
            value: "Everton".to_string(),
        };

        assert!(matches!(
            DomainError::from(duplicate),
            DomainError::AlreadyExists { ref field, .. } if field == "name"
        ));
        assert!(matches!(DomainError::from(StoreError::Cancelled), DomainError::Cancelled));
        assert!(matches!(DomainError::from(StoreError::Timeout), DomainError::Timeout));
        assert!(matches!(
            DomainError::from(StoreError::NoDocuments),
            DomainError::Internal(StoreError::NoDocuments)
        ));
    }

    #[test]
    fn test_validation_details_accumulate() {
        let mut err = ValidationError::fixture_request();
        assert!(!err.has_details());

        err.add_detail("home_team", "Unknown home team");
        err.add_detail("away_team", "Unknown away team");

        assert_eq!(err.code, CANNOT_CREATE_FIXTURE);
        assert_eq!(err.details.len(), 2);
        assert_eq!(err.details[1].field, "away_team");
    }

    #[test]
    fn test_same_team_rejection_serializes_empty_details() {
        let json = serde_json::to_value(ValidationError::same_team()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "code": CANNOT_CREATE_FIXTURE,
                "message": SAME_TEAM_MESSAGE,
                "details": [],
            })
        );
    }
}
