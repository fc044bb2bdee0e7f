use thiserror::Error;

/// Request rejected by the in-memory store, mirroring DynamoDB validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_not_found_display() {
        let error = InMemoryError::TableNotFound("app".to_string());
        assert_eq!(error.to_string(), "Table not found: app");
    }

    #[test]
    fn test_validation_display() {
        let error = InMemoryError::Validation("missing key attribute PK".to_string());
        assert_eq!(
            error.to_string(),
            "Validation failed: missing key attribute PK"
        );
    }
}
