//! Scoring errors

/// Errors returned by the scoring engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// Malformed scoring player or a state that breaks a structural invariant
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring a match that is already complete
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),
}

impl ScoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn completed() -> Self {
        Self::IllegalTransition("cannot score a completed match".to_string())
    }
}
