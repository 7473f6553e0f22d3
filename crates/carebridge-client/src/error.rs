//! Client error types.

use thiserror::Error;

/// Errors from the session client's I/O layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request could not be completed (connect, timeout, decode).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs.
        body: String,
    },

    /// Bearer token missing, expired or rejected. The auth session has been
    /// cleared.
    #[error("not authenticated")]
    Unauthorized,

    /// Neither configuration nor the backend supplied a media server URL.
    #[error("no media server URL configured or returned by backend")]
    MissingServerUrl,

    /// Backend issued an unusable credential.
    #[error("invalid media credential: {0}")]
    InvalidCredential(String),

    /// Persisted auth state could not be read or written.
    #[error("token store error: {0}")]
    Store(String),
}

impl ClientError {
    /// Returns true if the user must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_requires_login() {
        assert!(ClientError::Unauthorized.requires_login());
        assert!(!ClientError::MissingServerUrl.requires_login());
        assert!(!ClientError::Status { status: 500, body: String::new() }.requires_login());
    }
}
