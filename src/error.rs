//! Error types for the portfolio advisor

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Client Input Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown risk tier: {0}")]
    UnknownRiskTier(String),

    // =============================
    // Collaborator Errors
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AdvisorError {
    /// Errors caused by what the user supplied; rejected, never retried
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdvisorError::InvalidInput(_) | AdvisorError::UnknownRiskTier(_)
        )
    }
}
