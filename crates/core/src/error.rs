//! Error types for docintel.
//!
//! One enum covers every failure kind of the pipeline: configuration, I/O,
//! the external service boundaries (embedding, search, completion, link
//! generation) and the ingestion tools.

use thiserror::Error;

/// Unified error type for docintel.
///
/// All fallible functions return `Result<T, AppError>`. Service boundary
/// failures carry a human-readable message that is safe to show to users.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied an invalid argument (empty query, bad k values)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding provider failed or returned an unusable vector
    #[error("Embedding failure: {0}")]
    Embedding(String),

    /// Vector search failed
    #[error("Search failure: {0}")]
    Search(String),

    /// Completion endpoint returned a non-success status or could not be reached
    #[error("{}", completion_message(.status_code, .message))]
    Completion {
        status_code: Option<u16>,
        message: String,
    },

    /// Completion succeeded but the answer field was missing
    #[error("Malformed completion response: {0}")]
    MalformedCompletion(String),

    /// A time-limited access link could not be produced
    #[error("Link generation error: {0}")]
    LinkGeneration(String),

    /// Writing documents into a vector index failed
    #[error("Index error: {0}")]
    Index(String),

    /// Ingestion (page records, embedding records) errors
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

fn completion_message(status_code: &Option<u16>, message: &str) -> String {
    match status_code {
        Some(code) => format!("Completion failure ({}): {}", code, message),
        None => format!("Completion failure: {}", message),
    }
}

impl AppError {
    /// Build a completion failure from an HTTP status and response body.
    pub fn completion(status_code: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Completion {
            status_code,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_display_with_status() {
        let err = AppError::completion(Some(500), "Internal Server Error");
        assert_eq!(err.to_string(), "Completion failure (500): Internal Server Error");
    }

    #[test]
    fn test_completion_display_without_status() {
        let err = AppError::completion(None, "operation timed out");
        assert_eq!(err.to_string(), "Completion failure: operation timed out");
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
