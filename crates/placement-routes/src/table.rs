//! Route declarations and path matching.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use placement_session::Role;
use serde::{Deserialize, Serialize};

use crate::{RouteError, View};

/// Values captured from `:param` segments, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// RouteRequirement
// ---------------------------------------------------------------------------

/// Who may see a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    /// Anyone, logged in or not.
    Public,

    /// Any logged-in user, whatever the role.
    AuthenticatedAny,

    /// A logged-in user whose role is in the set.
    RoleIn(BTreeSet<Role>),
}

impl RouteRequirement {
    /// Shorthand for a single-role requirement.
    pub fn role(role: Role) -> Self {
        Self::RoleIn(BTreeSet::from([role]))
    }

    /// Shorthand for a multi-role requirement.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::RoleIn(roles.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// One declared route: a path pattern, the view it shows, and who may see it.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    view: View,
    requirement: Option<RouteRequirement>,
    guest_only: bool,
}

impl Route {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// The requirement as declared, `None` if the route left it out.
    pub fn declared_requirement(&self) -> Option<&RouteRequirement> {
        self.requirement.as_ref()
    }

    /// The requirement the guard enforces.
    ///
    /// An undeclared requirement is denied by default: it means "any
    /// logged-in user", never "public".
    pub fn requirement(&self) -> &RouteRequirement {
        const DEFAULT_DENY: &RouteRequirement = &RouteRequirement::AuthenticatedAny;
        self.requirement.as_ref().unwrap_or(DEFAULT_DENY)
    }

    /// `true` for login/registration: a logged-in user is sent home instead.
    pub fn is_guest_only(&self) -> bool {
        self.guest_only
    }

    /// Matches `segments` (already split) against this pattern.
    fn matches(&self, segments: &[&str]) -> Option<Params> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Literal(lit) if lit == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(invalid("must start with '/'"));
    };
    if pattern.contains(['?', '#']) {
        return Err(invalid("must not contain a query or fragment"));
    }

    let mut segments = Vec::new();
    let mut names = HashSet::new();
    for raw in rest.split('/').filter(|s| !s.is_empty()) {
        if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("parameter name is empty"));
            }
            if !names.insert(name) {
                return Err(invalid("parameter name repeated"));
            }
            segments.push(Segment::Param(name.to_string()));
        } else {
            segments.push(Segment::Literal(raw.to_string()));
        }
    }
    Ok(segments)
}

/// Splits a requested path into segments.
///
/// Drops the query string and fragment, and ignores empty segments so
/// `/jobs/` and `//jobs` both mean `/jobs`.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// An ordered list of routes. The first matching route wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// The portal's own routes.
    ///
    /// | Path                             | Requirement        |
    /// |----------------------------------|--------------------|
    /// | `/`, `/forgot-password`, `/reset-password` | public   |
    /// | `/login`, `/register`            | public, guest only |
    /// | `/dashboard`, `/profile`, `/applications`, `/apply/:job_id` | student |
    /// | `/employer/dashboard`, `/employer/applications/:job_id` | employer |
    /// | `/admin`                         | admin              |
    /// | `/jobs`, `/jobs/:job_id`         | any logged-in user |
    pub fn portal() -> Self {
        use RouteRequirement::{AuthenticatedAny, Public};

        let student = || RouteRequirement::role(Role::Student);
        let employer = || RouteRequirement::role(Role::Employer);

        Self::builder()
            .route(View::Landing.path(), View::Landing, Public)
            .guest_only(View::Login.path(), View::Login)
            .guest_only(View::Register.path(), View::Register)
            .route(View::ForgotPassword.path(), View::ForgotPassword, Public)
            .route(View::ResetPassword.path(), View::ResetPassword, Public)
            .route(View::StudentHome.path(), View::StudentHome, student())
            .route(View::StudentProfile.path(), View::StudentProfile, student())
            .route(
                View::StudentApplications.path(),
                View::StudentApplications,
                student(),
            )
            .route(View::ApplyJob.path(), View::ApplyJob, student())
            .route(
                View::AdminHome.path(),
                View::AdminHome,
                RouteRequirement::role(Role::Admin),
            )
            .route(View::EmployerHome.path(), View::EmployerHome, employer())
            .route(
                View::EmployerApplications.path(),
                View::EmployerApplications,
                employer(),
            )
            .route(View::JobPostings.path(), View::JobPostings, AuthenticatedAny)
            .route(View::JobDetail.path(), View::JobDetail, AuthenticatedAny)
            .build()
            // Patterns come from `View::path`, covered by tests.
            .expect("built-in portal routes are valid")
    }

    /// Finds the first route matching `path`, with its captured params.
    pub fn find(&self, path: &str) -> Option<(&Route, Params)> {
        let segments = split_path(path);
        self.routes
            .iter()
            .find_map(|route| route.matches(&segments).map(|params| (route, params)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::portal()
    }
}

/// Collects route declarations; [`build`](Self::build) validates them.
///
/// # Example
///
/// ```rust
/// use placement_routes::{RouteRequirement, RouteTable, View};
/// use placement_session::Role;
///
/// let table = RouteTable::builder()
///     .route("/", View::Landing, RouteRequirement::Public)
///     .guest_only("/login", View::Login)
///     .route("/admin", View::AdminHome, RouteRequirement::role(Role::Admin))
///     .build()
///     .expect("valid patterns");
/// assert_eq!(table.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    pending: Vec<(String, View, Option<RouteRequirement>, bool)>,
}

impl RouteTableBuilder {
    /// Declares a route with an explicit requirement.
    pub fn route(mut self, pattern: &str, view: View, requirement: RouteRequirement) -> Self {
        self.pending
            .push((pattern.to_string(), view, Some(requirement), false));
        self
    }

    /// Declares a public route that logged-in users are redirected away from.
    pub fn guest_only(mut self, pattern: &str, view: View) -> Self {
        self.pending.push((
            pattern.to_string(),
            view,
            Some(RouteRequirement::Public),
            true,
        ));
        self
    }

    /// Declares a route without a requirement.
    ///
    /// The guard treats it as [`RouteRequirement::AuthenticatedAny`].
    pub fn undeclared(mut self, pattern: &str, view: View) -> Self {
        self.pending.push((pattern.to_string(), view, None, false));
        self
    }

    /// Parses every pattern and returns the table.
    ///
    /// # Errors
    /// - [`RouteError::InvalidPattern`] for a malformed pattern
    /// - [`RouteError::DuplicatePattern`] for a pattern declared twice
    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(self.pending.len());

        for (pattern, view, requirement, guest_only) in self.pending {
            let segments = parse_pattern(&pattern)?;
            // Param names don't change what a pattern matches.
            let shape: Vec<Option<String>> = segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(lit) => Some(lit.clone()),
                    Segment::Param(_) => None,
                })
                .collect();
            if !seen.insert(shape) {
                return Err(RouteError::DuplicatePattern(pattern));
            }
            if requirement.is_none() {
                tracing::warn!(
                    %pattern,
                    %view,
                    "route has no requirement, defaulting to authenticated-only"
                );
            }
            routes.push(Route {
                pattern,
                segments,
                view,
                requirement,
                guest_only,
            });
        }

        Ok(RouteTable { routes })
    }
}
