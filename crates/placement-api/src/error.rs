//! Error types for the API layer.
//!
//! The variants line up with how the portal reacts, not with HTTP status
//! codes one-to-one:
//!
//! - [`ApiError::InvalidCredentials`] → show a message on the login form
//! - [`ApiError::Unauthorized`] → log out everywhere and go to login
//! - [`ApiError::Rejected`] → show the backend's reason on the current view
//! - everything else → a failure the user can only retry

/// Errors that can occur when calling the API gateway.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The login endpoint answered with a non-2xx status.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An authenticated request was answered with 401: the token is no
    /// longer accepted.
    #[error("session is no longer valid")]
    Unauthorized,

    /// The backend answered with another non-2xx status.
    ///
    /// `detail` is the FastAPI-style `{"detail": ...}` message when the
    /// body carries one, otherwise the raw body (possibly empty).
    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The request never got an HTTP answer (connection refused, timeout,
    /// TLS failure, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 2xx but the body isn't what we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client was configured with an unusable base URL.
    #[error("invalid API configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// `true` if the error means the session must be dropped.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_includes_status_and_detail() {
        let err = ApiError::Rejected {
            status: 409,
            detail: "Email already registered".into(),
        };
        let text = err.to_string();
        assert!(text.contains("409"));
        assert!(text.contains("Email already registered"));
    }

    #[test]
    fn test_is_unauthorized_only_for_unauthorized() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::InvalidCredentials.is_unauthorized());
        assert!(!ApiError::InvalidResponse("x".into()).is_unauthorized());
    }
}
