//! The route guard: render or redirect, decided in one place.
//!
//! The rules, in evaluation order:
//!
//! ```text
//! path matches no route          → redirect to Landing   (checked last)
//! Public, guest-only, logged in  → redirect to role home
//! Public                         → render
//! AuthenticatedAny, logged in    → render
//! RoleIn(set), role in set       → render
//! RoleIn(set), other role        → redirect to role home
//! anything else, logged out      → redirect to Login
//! ```
//!
//! "Checked last" means the catch-all only applies when no declared route
//! matched; it never shadows a real route.

use placement_session::SessionSnapshot;
use serde::Serialize;

use crate::{Params, RouteRequirement, RouteTable, View, home_view};

/// Why the guard redirected. Hosts can use this to show a message
/// ("please log in") and logs use it to explain navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// The route needs a session and there is none.
    NotAuthenticated,
    /// A session exists but its role isn't allowed on this route.
    WrongRole,
    /// A logged-in user opened the login or registration view.
    AlreadyAuthenticated,
    /// No route matches the requested path.
    NotFound,
}

/// What the router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Show `view`, with any `:param` values captured from the path.
    Render { view: View, params: Params },

    /// Go to `to` instead.
    Redirect { to: View, reason: RedirectReason },
}

impl RouteDecision {
    fn redirect(to: View, reason: RedirectReason) -> Self {
        Self::Redirect { to, reason }
    }

    /// The view that ends up on screen or is navigated to next.
    pub fn view(&self) -> View {
        match self {
            Self::Render { view, .. } => *view,
            Self::Redirect { to, .. } => *to,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

/// Decides what to show for `path` given the current session.
///
/// Pure and synchronous: no I/O, no waiting on in-flight requests. Call it
/// with the last committed snapshot on every route match.
pub fn guard(table: &RouteTable, session: &SessionSnapshot, path: &str) -> RouteDecision {
    let decision = match table.find(path) {
        Some((route, params)) => {
            let role = session.role();

            match (route.requirement(), role) {
                (RouteRequirement::Public, Some(role)) if route.is_guest_only() => {
                    RouteDecision::redirect(home_view(role), RedirectReason::AlreadyAuthenticated)
                }
                (RouteRequirement::Public, _) => RouteDecision::Render {
                    view: route.view(),
                    params,
                },
                (RouteRequirement::AuthenticatedAny, Some(_)) => RouteDecision::Render {
                    view: route.view(),
                    params,
                },
                (RouteRequirement::RoleIn(allowed), Some(role)) if allowed.contains(&role) => {
                    RouteDecision::Render {
                        view: route.view(),
                        params,
                    }
                }
                (RouteRequirement::RoleIn(_), Some(role)) => {
                    RouteDecision::redirect(home_view(role), RedirectReason::WrongRole)
                }
                (_, None) => {
                    RouteDecision::redirect(View::Login, RedirectReason::NotAuthenticated)
                }
            }
        }
        None => RouteDecision::redirect(View::Landing, RedirectReason::NotFound),
    };

    match &decision {
        RouteDecision::Render { view, .. } => {
            tracing::trace!(path, %view, "route rendered");
        }
        RouteDecision::Redirect { to, reason } => {
            tracing::debug!(path, to = %to, ?reason, "route redirected");
        }
    }
    decision
}
