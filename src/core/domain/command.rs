use thiserror::Error;

use crate::core::domain::transaction::TransactionError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Entity already exists: {entity_type} - {details}")]
    AlreadyExists {
        entity_type: String,
        details: String,
    },

    #[error("Entity not found: {entity_type} - {details}")]
    NotFound {
        entity_type: String,
        details: String,
    },

    #[error("Expected one {entity_type} but found {count}: {details}")]
    AmbiguousResult {
        entity_type: String,
        details: String,
        count: usize,
    },

    #[error("Concurrent modification detected: {entity_type}")]
    ConcurrencyError { entity_type: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {details}")]
    ValidationError { details: String },

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl CommandError {
    pub fn member_not_found(member_id: &str) -> Self {
        CommandError::NotFound {
            entity_type: "Member".to_string(),
            details: format!("member_id: {}", member_id),
        }
    }

    pub fn member_already_exists(member_id: &str) -> Self {
        CommandError::AlreadyExists {
            entity_type: "Member".to_string(),
            details: format!("member_id: {}", member_id),
        }
    }

    pub fn ambiguous_member(member_id: &str, count: usize) -> Self {
        CommandError::AmbiguousResult {
            entity_type: "Member".to_string(),
            details: format!("member_id: {}", member_id),
            count,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CommandError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_helpers() {
        let err = CommandError::member_not_found("alice");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Entity not found: Member - member_id: alice"
        );

        let err = CommandError::ambiguous_member("bob", 2);
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Expected one Member but found 2: member_id: bob"
        );
    }
}
