//! Route guard: which page a caller may see, as a pure function of
//! authentication state, resolved role and requested path.

use crate::client::role::Role;

pub const LANDING: &str = "/";
pub const ADMIN_HOME: &str = "/admin";
pub const STUDENT_HOME: &str = "/student";
pub const ACCESS_DENIED: &str = "/access-denied";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppRoute {
    Landing,
    AdminArea,
    StudentArea,
    AccessDenied,
    Unknown,
}

impl AppRoute {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');

        match path {
            "" => AppRoute::Landing,
            ACCESS_DENIED => AppRoute::AccessDenied,
            _ if in_area(path, ADMIN_HOME) => AppRoute::AdminArea,
            _ if in_area(path, STUDENT_HOME) => AppRoute::StudentArea,
            _ => AppRoute::Unknown,
        }
    }
}

fn in_area(path: &str, root: &str) -> bool {
    path == root || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    ShowLanding,
    Redirect(&'static str),
}

pub fn decide(authenticated: bool, role: Role, path: &str) -> GuardDecision {
    let route = AppRoute::parse(path);

    match route {
        AppRoute::AccessDenied => return GuardDecision::Allow,
        AppRoute::Unknown => return GuardDecision::Redirect(LANDING),
        _ => {}
    }

    if !authenticated {
        return GuardDecision::ShowLanding;
    }

    match (route, role) {
        (AppRoute::Landing, Role::Admin) => GuardDecision::Redirect(ADMIN_HOME),
        (AppRoute::Landing, Role::Student) => GuardDecision::Redirect(STUDENT_HOME),
        (AppRoute::Landing, Role::Guest) => GuardDecision::ShowLanding,
        (AppRoute::AdminArea, Role::Admin) => GuardDecision::Allow,
        (AppRoute::StudentArea, Role::Student) => GuardDecision::Allow,
        (AppRoute::AdminArea | AppRoute::StudentArea, _) => GuardDecision::Redirect(ACCESS_DENIED),
        (AppRoute::AccessDenied | AppRoute::Unknown, _) => GuardDecision::Allow,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

const ADMIN_LINKS: &[NavLink] = &[
    NavLink { label: "Dashboard", path: ADMIN_HOME },
    NavLink { label: "Questions", path: "/admin/questions" },
];

const STUDENT_LINKS: &[NavLink] = &[
    NavLink { label: "Dashboard", path: STUDENT_HOME },
    NavLink { label: "Take Quiz", path: "/student/quiz" },
    NavLink { label: "My Results", path: "/student/results" },
];

pub fn navigation_links(role: Role) -> &'static [NavLink] {
    match role {
        Role::Admin => ADMIN_LINKS,
        Role::Student => STUDENT_LINKS,
        Role::Guest => &[],
    }
}
