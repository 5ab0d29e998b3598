use super::capability::Capability;
use thiserror::Error;

/// Coarse classification of a backend failure.
///
/// Dispatch treats every kind as a failed attempt; the kind only tells operators whether
/// the peer was down, returned garbage, or never implemented the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Timeout, connection error or non-success status.
    Transport,
    /// The backend answered but the payload could not be decoded.
    Decode,
    /// The backend does not implement the requested query.
    Unsupported,
}

impl FailureKind {
    /// Returns a static string representation for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Errors returned by a single backend invocation.
///
/// Network errors are sanitized into strings so the error is `Clone` and can be shared
/// between every waiter of a single-flight computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// Request exceeded the configured timeout duration.
    #[error("request timeout")]
    Timeout,

    /// Failed to establish a connection to the backend.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx status code.
    ///
    /// First field is the HTTP status code, second is the error message.
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    /// Network-level error from the underlying HTTP client.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be parsed or normalized.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend does not implement this query.
    #[error("{0} is not supported by this backend")]
    Unsupported(Capability),
}

impl BackendError {
    /// Returns the failure classification used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidResponse(_) => FailureKind::Decode,
            Self::Unsupported(_) => FailureKind::Unsupported,
            _ => FailureKind::Transport,
        }
    }

    /// Returns `true` if this error is transient and a later call may succeed.
    ///
    /// Timeouts, connection and network errors, HTTP 5xx and HTTP 429 are transient. Reported
    /// as the `transient` field on backend failure events.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) | Self::Network(_) => true,
            Self::Http(status, _) => (500..=599).contains(status) || *status == 429,
            Self::InvalidResponse(_) | Self::Unsupported(_) => false,
        }
    }

    /// Converts a `reqwest` error into a sanitized backend error.
    ///
    /// The original error may embed the full request URL, which can carry credentials.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::ConnectionFailed("connection refused or unreachable".to_string())
        } else if error.is_decode() {
            Self::InvalidResponse("response decode error".to_string())
        } else if error.is_body() {
            Self::Network("response body error".to_string())
        } else if error.is_redirect() {
            Self::Network("too many redirects".to_string())
        } else if error.is_request() {
            Self::Network("request failed".to_string())
        } else {
            Self::Network("network error".to_string())
        }
    }
}
