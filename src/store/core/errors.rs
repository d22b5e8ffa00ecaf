// ============================================================================
// Store Errors - Signals raised by any DocumentStore backend
// ============================================================================
//
// Two signals are part of the contract and must stay distinguishable:
// - DuplicateKey: a unique index rejected a write
// - NoDocuments: a single-document read found nothing
//
// Cancelled/Timeout come from the OpContext wrapping every operation.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key in {collection}: {field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("no documents in result")]
    NoDocuments,

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    Timeout,

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("field {0} is immutable")]
    ImmutableField(String),

    #[error("value is not a document")]
    NotADocument,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }

    pub fn is_no_documents(&self) -> bool {
        matches!(self, StoreError::NoDocuments)
    }

    /// Short stable label, used as a metrics outcome
    pub fn label(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey { .. } => "duplicate_key",
            StoreError::NoDocuments => "no_documents",
            StoreError::Cancelled => "cancelled",
            StoreError::Timeout => "timeout",
            StoreError::UnknownCollection(_) => "unknown_collection",
            StoreError::InvalidPipeline(_) => "invalid_pipeline",
            StoreError::ImmutableField(_) => "immutable_field",
            StoreError::NotADocument => "not_a_document",
            StoreError::Serialization(_) => "serialization",
            StoreError::Redis(_) => "backend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_are_distinguishable() {
        let duplicate = StoreError::DuplicateKey {
            collection: "teams".to_string(),
            field: "name".to_string(),
            value: "Liverpool".to_string(),
        };

        assert!(duplicate.is_duplicate_key());
        assert!(!duplicate.is_no_documents());
        assert!(StoreError::NoDocuments.is_no_documents());
        assert!(!StoreError::Timeout.is_duplicate_key());
    }

    #[test]
    fn test_duplicate_key_message() {
        let err = StoreError::DuplicateKey {
            collection: "teams".to_string(),
            field: "short_name".to_string(),
            value: "Man Utd".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate key in teams: short_name = Man Utd");
        assert_eq!(err.label(), "duplicate_key");
    }
}
