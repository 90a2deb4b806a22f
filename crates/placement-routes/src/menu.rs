//! The navigation menu, derived entirely from the session snapshot.

use placement_session::{Role, SessionSnapshot};
use serde::Serialize;

use crate::View;

/// One entry in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    /// A link to a view.
    Link { label: &'static str, to: View },
    /// The logout action. The host wires it to `Portal::logout`.
    Logout,
}

const fn link(label: &'static str, to: View) -> MenuItem {
    MenuItem::Link { label, to }
}

const HOME: MenuItem = link("Home", View::Landing);

const GUEST_LINKS: &[MenuItem] = &[link("Login", View::Login), link("Register", View::Register)];

const ADMIN_LINKS: &[MenuItem] = &[link("Admin Dashboard", View::AdminHome)];

const EMPLOYER_LINKS: &[MenuItem] = &[
    link("Employer Dashboard", View::EmployerHome),
    link("Job Postings", View::JobPostings),
];

const STUDENT_LINKS: &[MenuItem] = &[
    link("Dashboard", View::StudentHome),
    link("Profile", View::StudentProfile),
    link("Job Postings", View::JobPostings),
    link("Job Applications", View::StudentApplications),
];

fn role_links(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Admin => ADMIN_LINKS,
        Role::Employer => EMPLOYER_LINKS,
        Role::Student => STUDENT_LINKS,
    }
}

/// Builds the menu for the current session.
///
/// `Home` always comes first. Logged-out users get login/register links;
/// logged-in users get their role's links followed by [`MenuItem::Logout`].
pub fn menu(session: &SessionSnapshot) -> Vec<MenuItem> {
    let mut items = vec![HOME];
    match session.role() {
        None => items.extend_from_slice(GUEST_LINKS),
        Some(role) => {
            items.extend_from_slice(role_links(role));
            items.push(MenuItem::Logout);
        }
    }
    items
}
