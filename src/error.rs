//! Error types for Gator.

use thiserror::Error;

/// Common error type for Gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Database error.
    ///
    /// Errors from any sqlx backend are flattened into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No user is logged in, or the session user no longer exists.
    #[error("not logged in: {0}")]
    NotAuthenticated(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The polling interval could not be parsed.
    #[error("invalid interval {0:?}: expected a duration such as \"30s\" or \"1m\"")]
    InvalidInterval(String),

    /// There is no feed to poll.
    #[error("no feeds registered")]
    NoFeedsRegistered,

    /// Network, DNS or timeout failure while fetching a feed.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status and an unusable body.
    #[error("HTTP error fetching {url}: {status}")]
    Http { url: String, status: u16 },

    /// The response body is not an RSS document.
    #[error("feed parse error: {0}")]
    Parse(String),

    /// A publish date matched none of the known layouts.
    #[error("unparseable date: {0:?}")]
    UnparseableDate(String),

    /// The operation was interrupted by the shutdown signal.
    #[error("cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Result type alias for Gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = GatorError::NotFound("user alice".to_string());
        assert_eq!(err.to_string(), "user alice not found");
    }

    #[test]
    fn test_invalid_interval_display() {
        let err = GatorError::InvalidInterval("soon".to_string());
        assert!(err.to_string().contains("\"soon\""));
    }

    #[test]
    fn test_http_error_display() {
        let err = GatorError::Http {
            url: "https://example.com/feed.xml".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "HTTP error fetching https://example.com/feed.xml: 503"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatorError = io_err.into();
        assert!(matches!(err, GatorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: GatorError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, GatorError::Database(_)));
    }
}
