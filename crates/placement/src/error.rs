//! Unified error type for the portal facade.

use placement_api::ApiError;
use placement_routes::RouteError;
use placement_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// Hosts using the `placement` facade deal with this single type instead
/// of importing errors from each sub-crate. `#[from]` generates the `From`
/// impls, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A session-level error (empty token, unknown role).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A route table couldn't be built.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The API gateway call failed. Credential rejection lands here as
    /// `Api(ApiError::InvalidCredentials)`.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An authenticated call got 401. The session has already been
    /// cleared and the portal moved to the login view.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// An authenticated call was attempted with no session.
    #[error("not logged in")]
    NotAuthenticated,

    /// A login response arrived after the attempt was abandoned,
    /// superseded, or the portal went away. The session is unchanged.
    #[error("login attempt was superseded")]
    LoginDiscarded,

    /// Following redirects from this path never reached a rendered view.
    #[error("redirect loop starting at {0:?}")]
    RedirectLoop(String),

    /// A configuration value couldn't be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PortalError {
    /// `true` if the backend rejected the email/password pair.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::Api(ApiError::InvalidCredentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err: PortalError = SessionError::UnknownRole("guest".into()).into();
        assert!(matches!(err, PortalError::Session(_)));
        assert!(err.to_string().contains("guest"));
    }

    #[test]
    fn test_from_route_error() {
        let err: PortalError = RouteError::DuplicatePattern("/jobs".into()).into();
        assert!(matches!(err, PortalError::Route(_)));
    }

    #[test]
    fn test_from_api_error() {
        let err: PortalError = ApiError::InvalidCredentials.into();
        assert!(err.is_invalid_credentials());
    }

    #[test]
    fn test_is_invalid_credentials_false_for_other_api_errors() {
        let err: PortalError = ApiError::Unauthorized.into();
        assert!(!err.is_invalid_credentials());
        assert!(!PortalError::SessionExpired.is_invalid_credentials());
    }
}
