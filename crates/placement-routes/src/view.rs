//! The portal's screens and where each role lands after login.

use std::fmt;

use placement_session::Role;
use serde::{Deserialize, Serialize};

/// Every screen the portal can show.
///
/// The router renders these; this crate only decides WHICH one. Each view
/// has one canonical path pattern ([`View::path`]) used both by the
/// default route table and as a redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    // -- Public --
    Landing,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,

    // -- Student --
    StudentHome,
    StudentProfile,
    StudentApplications,
    ApplyJob,

    // -- Employer --
    EmployerHome,
    EmployerApplications,

    // -- Admin --
    AdminHome,

    // -- Any authenticated role --
    JobPostings,
    JobDetail,
}

impl View {
    /// The canonical path pattern for this view.
    ///
    /// Patterns with a `:param` segment (`ApplyJob`, `JobDetail`,
    /// `EmployerApplications`) are never used as redirect targets.
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::ForgotPassword => "/forgot-password",
            Self::ResetPassword => "/reset-password",
            Self::StudentHome => "/dashboard",
            Self::StudentProfile => "/profile",
            Self::StudentApplications => "/applications",
            Self::ApplyJob => "/apply/:job_id",
            Self::EmployerHome => "/employer/dashboard",
            Self::EmployerApplications => "/employer/applications/:job_id",
            Self::AdminHome => "/admin",
            Self::JobPostings => "/jobs",
            Self::JobDetail => "/jobs/:job_id",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug already prints the variant name, which is what logs want.
        write!(f, "{self:?}")
    }
}

/// Where a role lands after login, or when it tries to open a view
/// reserved for another role.
pub fn home_view(role: Role) -> View {
    match role {
        Role::Admin => View::AdminHome,
        Role::Employer => View::EmployerHome,
        Role::Student => View::StudentHome,
    }
}
