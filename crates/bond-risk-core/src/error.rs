use thiserror::Error;

#[derive(Debug, Error)]
pub enum BondRiskError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Portfolio store error: {0}")]
    Storage(String),

    #[error("Analytics executor error: {0}")]
    Executor(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BondRiskError {
    /// Shorthand for the most common error in the engine.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BondRiskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for failures of an external collaborator (store or executor).
    /// These are recoverable: in-memory computation keeps working.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, BondRiskError::Storage(_) | BondRiskError::Executor(_))
    }
}

impl From<serde_json::Error> for BondRiskError {
    fn from(e: serde_json::Error) -> Self {
        BondRiskError::SerializationError(e.to_string())
    }
}
