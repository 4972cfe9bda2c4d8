use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type used across this crate.
pub type Result<T, E = SnoozeError> = std::result::Result<T, E>;

/// All different error types this crate uses.
#[derive(Error, Debug)]
pub enum SnoozeError {
    /// Failed to get a response at all.
    #[error("Request failed: {error}")]
    HttpRequestFailure {
        /// The reqwest error.
        error: reqwest::Error,
    },
    /// The service rejected the request (bad credentials, unknown user or
    /// story, validation failure).
    #[error("Request rejected with {status}: {message}")]
    ClientError {
        /// The 4xx status of the response.
        status: StatusCode,
        /// The message the service sent along, if any.
        message: String,
    },
    /// The service failed to process the request.
    #[error("Service failed with {status}: {message}")]
    ServerError {
        /// The 5xx status of the response.
        status: StatusCode,
        /// The message the service sent along, if any.
        message: String,
    },
    /// Received a response that is neither a success nor an error.
    #[error("Expected a 2xx Success but got: {status}")]
    UnexpectedStatus { status: StatusCode },
    /// Received a success response whose body does not match the expected
    /// shape.
    #[error("Failed to decode response body: {error}")]
    Decode {
        /// The serde error.
        error: serde_json::Error,
        /// The content that resulted in the error.
        body: Bytes,
    },
    /// The configured base url can't be joined with endpoint paths.
    #[error("url {url} can not be a base url")]
    InvalidBaseUrl { url: String },
    #[error("Invalid url: {error}")]
    InvalidUrl { error: url::ParseError },
    /// Reading or writing the persisted session failed.
    #[error("Session storage failed: {error}")]
    SessionStore { error: std::io::Error },
    /// The persisted session is not valid json.
    #[error("Malformed session file: {error}")]
    SessionFormat { error: serde_json::Error },
}

impl SnoozeError {
    /// Classify a non success response by its status.
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("no reason given")
                .to_string()
        });
        if status.is_client_error() {
            SnoozeError::ClientError { status, message }
        } else if status.is_server_error() {
            SnoozeError::ServerError { status, message }
        } else {
            SnoozeError::UnexpectedStatus { status }
        }
    }

    /// The status of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SnoozeError::ClientError { status, .. }
            | SnoozeError::ServerError { status, .. }
            | SnoozeError::UnexpectedStatus { status } => Some(*status),
            SnoozeError::HttpRequestFailure { error } => error.status(),
            _ => None,
        }
    }

    /// Whether the request ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SnoozeError::HttpRequestFailure { error } => error.is_timeout(),
            _ => false,
        }
    }

    /// Whether the service reported the credentials as invalid.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl From<reqwest::Error> for SnoozeError {
    /// The url is dropped, its query may carry the session token.
    fn from(error: reqwest::Error) -> Self {
        SnoozeError::HttpRequestFailure {
            error: error.without_url(),
        }
    }
}

impl From<url::ParseError> for SnoozeError {
    fn from(error: url::ParseError) -> Self {
        SnoozeError::InvalidUrl { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_status() {
        let err = SnoozeError::from_status(StatusCode::UNAUTHORIZED, Some("bad token".into()));
        assert!(matches!(err, SnoozeError::ClientError { .. }));
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Request rejected with 401 Unauthorized: bad token");

        let err = SnoozeError::from_status(StatusCode::BAD_GATEWAY, None);
        assert!(matches!(
            err,
            SnoozeError::ServerError { ref message, .. } if message == "Bad Gateway"
        ));

        let err = SnoozeError::from_status(StatusCode::MULTIPLE_CHOICES, None);
        assert!(matches!(err, SnoozeError::UnexpectedStatus { .. }));
        assert_eq!(err.status(), Some(StatusCode::MULTIPLE_CHOICES));
        assert!(!err.is_timeout());
    }
}
