//! Error types for the ostomate core

use thiserror::Error;

/// Main error type for ostomate operations
#[derive(Debug, Error)]
pub enum OstomateError {
    /// Food data provider failure (bad status, unexpected payload)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Language model collaborator failure
    #[error("Model error: {0}")]
    Model(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Annotation store error
    #[error("Store error: {0}")]
    Store(String),

    /// Not found error (generic)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit error
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Response did not have the expected shape
    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse {
        /// Name of the collaborator that produced the payload
        source_name: String,
        /// What was wrong with it
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using OstomateError
pub type Result<T> = std::result::Result<T, OstomateError>;

impl OstomateError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        OstomateError::Provider(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        OstomateError::Model(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        OstomateError::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        OstomateError::Validation(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        OstomateError::Template(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        OstomateError::Store(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        OstomateError::NotFound(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        OstomateError::RateLimit(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        OstomateError::Timeout(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        OstomateError::MalformedResponse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        OstomateError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OstomateError::provider("usda returned 500");
        assert_eq!(err.to_string(), "Provider error: usda returned 500");

        let err = OstomateError::malformed("anthropic", "expected an array");
        assert_eq!(
            err.to_string(),
            "Malformed response from anthropic: expected an array"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        fn parse() -> Result<serde_json::Value> {
            Ok(serde_json::from_str("{not json")?)
        }

        assert!(matches!(parse(), Err(OstomateError::Serialization(_))));
    }
}
