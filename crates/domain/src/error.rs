//! Unified error types for the domain layer
//!
//! Every defect the core can detect is representable here as a typed value.
//! Nothing in the domain aborts the process on bad input.

use thiserror::Error;

use crate::aggregates::EncounterState;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A state-machine operation was invoked from a state that forbids it.
    /// Always a caller sequencing defect; never retried automatically.
    #[error("Invalid transition: cannot {action} from state {from}")]
    InvalidTransition {
        from: EncounterState,
        action: &'static str,
    },

    /// The shape of a challenge attempt was rejected
    #[error("Invalid attempt: {0}")]
    InvalidAttempt(#[from] AttemptError),

    /// A word failed its invariants while being wrapped into a creature
    #[error("Construction defect: {0}")]
    ConstructionDefect(String),

    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Why an attempt was rejected before the anagram comparison ran
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("empty input")]
    EmptyInput,

    #[error("'{input}' must contain letters only")]
    NonLetterCharacter { input: String },

    #[error("an anagram must differ from the source word")]
    IdenticalToTarget,
}

impl DomainError {
    /// Create an invalid transition error
    pub fn invalid_transition(from: EncounterState, action: &'static str) -> Self {
        Self::InvalidTransition { from, action }
    }

    /// Create a construction defect error
    pub fn construction_defect(msg: impl Into<String>) -> Self {
        Self::ConstructionDefect(msg.into())
    }

    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if name.is_empty() {
    ///     return Err(DomainError::validation("Player name cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Returns the attempt rejection, if this is one.
    pub fn as_attempt_error(&self) -> Option<&AttemptError> {
        match self {
            Self::InvalidAttempt(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = DomainError::invalid_transition(EncounterState::Idle, "resolve");
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot resolve from state IDLE"
        );
    }

    #[test]
    fn test_invalid_attempt_error() {
        let err = DomainError::from(AttemptError::NonLetterCharacter {
            input: "chien2".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid attempt: 'chien2' must contain letters only"
        );
        assert_eq!(
            err.as_attempt_error(),
            Some(&AttemptError::NonLetterCharacter {
                input: "chien2".to_string()
            })
        );
    }

    #[test]
    fn test_construction_defect_error() {
        let err = DomainError::construction_defect("empty word text");
        assert!(matches!(err, DomainError::ConstructionDefect(_)));
        assert!(err.as_attempt_error().is_none());
    }
}
