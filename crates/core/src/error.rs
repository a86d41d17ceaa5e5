//! Error types for the Aanya domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Aanya operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation errors ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Request rejection, produced before any side effect.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Missing fields in request: {0:?}")]
    MissingFields(Vec<String>),

    #[error("Invalid model name: {0}. Kindly select a valid AI model")]
    DisallowedModel(String),

    #[error("Message is empty or meaningless: {0:?}")]
    MeaninglessMessage(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_field_names() {
        let err = Error::Validation(ValidationError::MissingFields(vec![
            "user_email".into(),
            "model_name".into(),
        ]));
        assert!(err.to_string().contains("user_email"));
        assert!(err.to_string().contains("model_name"));
    }

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn storage_error_wraps_into_top_level() {
        let err: Error = StorageError::QueryFailed("users table".into()).into();
        assert!(err.to_string().contains("users table"));
    }
}
