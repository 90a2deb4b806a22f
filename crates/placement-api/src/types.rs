//! Request and response bodies for the API gateway.
//!
//! Field names match the backend's JSON exactly. Where the backend has
//! used more than one name over time, the old one is accepted as a serde
//! alias.

use placement_session::Role;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// `POST /login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /login` success body: the credential and the role it grants.
///
/// The backend sends `access_token` (plus a `token_type` we don't need);
/// `token` is accepted too. Unknown fields are ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(alias = "access_token")]
    pub token: String,
    pub role: Role,
}

// Hand-written so a stray `{:?}` can't leak the credential into logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// `POST /register` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// `POST /register` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

/// `POST /forgot-password` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// `POST /reset-password` body. `token` is the one-time reset token from
/// the emailed link, not a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// A bare `{"message": "..."}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_accepts_access_token_alias() {
        let body = r#"{"access_token":"abc","token_type":"bearer","role":"employer"}"#;
        let creds: Credentials = serde_json::from_str(body).unwrap();
        assert_eq!(creds.token, "abc");
        assert_eq!(creds.role, Role::Employer);
    }

    #[test]
    fn test_credentials_accepts_plain_token_field() {
        let creds: Credentials =
            serde_json::from_str(r#"{"token":"t1","role":"admin"}"#).unwrap();
        assert_eq!(creds.token, "t1");
        assert_eq!(creds.role, Role::Admin);
    }

    #[test]
    fn test_credentials_legacy_user_role_is_student() {
        let creds: Credentials =
            serde_json::from_str(r#"{"access_token":"t","role":"user"}"#).unwrap();
        assert_eq!(creds.role, Role::Student);
    }

    #[test]
    fn test_credentials_missing_role_fails() {
        // The oldest backend returned only a token. We can't gate views
        // without a role, so that's an invalid response.
        let result: Result<Credentials, _> =
            serde_json::from_str(r#"{"access_token":"t","token_type":"bearer"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials {
            token: "super-secret".into(),
            role: Role::Admin,
        };
        let text = format!("{creds:?}");
        assert!(!text.contains("super-secret"));
        assert!(text.contains("Admin"));
    }

    #[test]
    fn test_reset_password_request_field_names() {
        let body = ResetPasswordRequest {
            token: "r1".into(),
            new_password: "pw".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "token": "r1", "new_password": "pw" }));
    }
}
