//! Error types for trackbridge.

use thiserror::Error;

/// Maximum number of characters of a response body kept in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Main error type for trackbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Request never produced a response (connect failure, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// API answered with a non-success status
    #[error("{action} failed: {status} - {body}")]
    Api {
        action: String,
        status: u16,
        body: String,
    },

    /// Response body was absent, not JSON, or had an unexpected shape
    #[error("{action}: failed to decode response ({status}): {message}")]
    Decode {
        action: String,
        status: u16,
        message: String,
        body: String,
    },

    /// Tag removal requested for a tag the issue does not carry
    #[error("Tag '{tag}' not found on {issue_id}")]
    TagNotFound { issue_id: String, tag: String },

    /// Caller input rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build an API error, truncating the response body.
    pub fn api(action: impl Into<String>, status: u16, body: &str) -> Self {
        Error::Api {
            action: action.into(),
            status,
            body: truncate_body(body),
        }
    }

    /// Build a decode error, truncating the response body.
    pub fn decode(
        action: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        body: &str,
    ) -> Self {
        Error::Decode {
            action: action.into(),
            status,
            message: message.into(),
            body: truncate_body(body),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) && matches!(self, Error::Api { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }
}

/// Cut a response body down to [`MAX_ERROR_BODY_CHARS`], on a char boundary.
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let kept: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS - 3).collect();
    format!("{}...", kept)
}

/// Result type alias for trackbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_body_untouched() {
        assert_eq!(truncate_body("  Not found \n"), "Not found");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2000);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte_body() {
        let body = "ошибка ".repeat(200);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn test_status_helpers() {
        let err = Error::api("get issue", 404, "missing");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());

        let err = Error::api("get issue", 403, "nope");
        assert!(err.is_unauthorized());

        let err = Error::decode("get issue", 200, "expected value", "<html>");
        assert_eq!(err.status(), Some(200));
        assert!(!err.is_not_found());

        let err = Error::TagNotFound {
            issue_id: "DEMO-1".to_string(),
            tag: "urgent".to_string(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Tag 'urgent' not found on DEMO-1");
    }

    #[test]
    fn test_api_error_message() {
        let err = Error::api("search issues", 500, "boom");
        assert_eq!(err.to_string(), "search issues failed: 500 - boom");
    }
}
