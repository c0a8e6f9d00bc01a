//! Generation request.

use crate::errors::GenerationError;
use serde::{Deserialize, Serialize};

/// Character and world prose for one story run.
///
/// Both fields are previously assembled prose, not raw questionnaire answers.
/// A request is consumed once by the pipeline and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Description of the hero.
    pub character: String,
    /// Description of the world the hero lives in.
    pub world: String,
}

impl GenerationRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(character: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            world: world.into(),
        }
    }

    /// Rejects empty or whitespace-only fields.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.character.trim().is_empty() {
            return Err(GenerationError::validation("character", "must not be empty"));
        }
        if self.world.trim().is_empty() {
            return Err(GenerationError::validation("world", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    #[test]
    fn test_valid_request() {
        let request = GenerationRequest::new("Ren, a young inventor", "A crystalline city");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_character_rejected() {
        let err = GenerationRequest::new("   ", "A world").validate().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(err.to_string().contains("character"));
    }

    #[test]
    fn test_empty_world_rejected() {
        let err = GenerationRequest::new("A hero", "").validate().unwrap_err();
        assert!(err.to_string().contains("world"));
    }
}
