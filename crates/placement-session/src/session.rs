//! Session types: the data structures that describe who is logged in.
//!
//! A "session" is the client's record of an authenticated identity. It
//! pairs:
//! - WHAT proves the identity (an opaque token issued by the backend)
//! - WHICH views the identity may see (a [`Role`])
//!
//! Either both halves exist or neither does. Instead of two independent
//! `Option`s that could drift apart, [`Session`] is an enum whose
//! authenticated variant carries both values together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The closed set of portal roles.
///
/// `#[serde(rename_all = "lowercase")]` makes the wire/storage tags
/// `"admin"`, `"employer"`, `"student"`. The backend historically issued
/// `"user"` for students, so that tag is accepted as an alias when
/// decoding but never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employer,
    #[serde(alias = "user")]
    Student,
}

impl Role {
    /// Every role, in a stable order. Handy for exhaustive tests and
    /// property-based generators.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Employer, Role::Student];

    /// The canonical tag for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employer => "employer",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "admin" => Ok(Self::Admin),
            "employer" => Ok(Self::Employer),
            "student" | "user" => Ok(Self::Student),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The process-wide authentication state.
///
/// ```text
///   Anonymous ──(login)──→ Authenticated { token, role }
///       ↑                          │
///       └──────────(logout)────────┘
/// ```
///
/// Logging in while already authenticated replaces both fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// Nobody is logged in.
    #[default]
    Anonymous,

    /// A backend-issued credential and the role it was issued for.
    Authenticated { token: String, role: Role },
}

impl Session {
    /// Builds an authenticated session.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyToken`] for an empty or
    /// whitespace-only token.
    pub fn authenticated(
        token: impl Into<String>,
        role: Role,
    ) -> Result<Self, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self::Authenticated { token, role })
    }

    /// The credential, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { token, .. } => Some(token),
        }
    }

    /// The role, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { role, .. } => Some(*role),
        }
    }

    /// `true` iff a credential is present.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// A read-only copy of the session handed to consumers.
///
/// `revision` increases by one on every committed `login`/`logout`, so a
/// consumer can tell "same session" from "logged out and back in as the
/// same user".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    session: Session,
    revision: u64,
}

impl SessionSnapshot {
    pub(crate) fn new(session: Session, revision: u64) -> Self {
        Self { session, revision }
    }

    /// An anonymous snapshot at revision 0. Useful for evaluating routes
    /// before any provider exists.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Wraps an arbitrary session at revision 0.
    ///
    /// Intended for route/menu evaluation in tests and previews; live
    /// snapshots come from [`SessionProvider`](crate::SessionProvider).
    pub fn of(session: Session) -> Self {
        Self::new(session, 0)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
