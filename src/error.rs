//! Error type shared by the store, services and API

use thiserror::Error;

/// Everything that can go wrong in a decisio operation.
///
/// The first three variants are request-scoped and carry a message meant for
/// the end user; the rest are storage or I/O failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or range
    #[error("{0}")]
    Validation(String),

    /// Missing decision or project context
    #[error("{0}")]
    NotFound(String),

    /// Operation attempted before its inputs exist (e.g. evaluate without a snapshot)
    #[error("{0}")]
    Precondition(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn decision_not_found(id: &str) -> Self {
        Error::NotFound(format!("Decision with id {} not found", id))
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::Precondition(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_display_message_verbatim() {
        let err = Error::Precondition("No project context found.".to_string());
        assert_eq!(err.to_string(), "No project context found.");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_not_found_message_names_decision() {
        let err = Error::decision_not_found("abc");
        assert_eq!(err.to_string(), "Decision with id abc not found");
    }

    #[test]
    fn test_storage_errors_are_server_side() {
        let err = Error::from(diesel::result::Error::NotFound);
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("Query error"));
    }
}
