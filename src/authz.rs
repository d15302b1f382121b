use crate::models::Role;

pub struct Permission {
    pub resource: &'static str,
    pub action: &'static str,
    pub roles: &'static [Role],
}

const ALL_ROLES: &[Role] = &[
    Role::Student,
    Role::Supervisor,
    Role::Committee,
    Role::Discussion,
    Role::Admin,
];

const STAFF: &[Role] = &[
    Role::Supervisor,
    Role::Committee,
    Role::Discussion,
    Role::Admin,
];

// Process-wide permission matrix. Absence of an entry means denial for every
// role, admin included.
pub const PERMISSIONS: &[Permission] = &[
    Permission {
        resource: "projects",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "projects",
        action: "create",
        roles: &[Role::Supervisor, Role::Admin],
    },
    Permission {
        resource: "projects",
        action: "edit",
        roles: &[Role::Supervisor, Role::Admin],
    },
    Permission {
        resource: "projects",
        action: "delete",
        roles: &[Role::Admin],
    },
    Permission {
        resource: "projects",
        action: "register",
        roles: &[Role::Student],
    },
    Permission {
        resource: "proposals",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "proposals",
        action: "create",
        roles: &[Role::Student, Role::Supervisor],
    },
    Permission {
        resource: "proposals",
        action: "review",
        roles: &[Role::Committee, Role::Admin],
    },
    Permission {
        resource: "documents",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "documents",
        action: "upload",
        roles: &[Role::Student, Role::Supervisor],
    },
    Permission {
        resource: "documents",
        action: "delete",
        roles: &[Role::Supervisor, Role::Admin],
    },
    Permission {
        resource: "evaluations",
        action: "view",
        roles: STAFF,
    },
    Permission {
        resource: "evaluations",
        action: "create",
        roles: &[Role::Supervisor, Role::Discussion],
    },
    Permission {
        resource: "grades",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "grades",
        action: "compute",
        roles: &[Role::Committee, Role::Admin],
    },
    Permission {
        resource: "grades",
        action: "approve",
        roles: &[Role::Committee],
    },
    Permission {
        resource: "grades",
        action: "reject",
        roles: &[Role::Committee],
    },
    Permission {
        resource: "requests",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "requests",
        action: "create",
        roles: &[Role::Student],
    },
    Permission {
        resource: "requests",
        action: "accept",
        roles: &[Role::Supervisor],
    },
    Permission {
        resource: "requests",
        action: "reject",
        roles: &[Role::Supervisor],
    },
    Permission {
        resource: "schedules",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "schedules",
        action: "manage",
        roles: &[Role::Committee, Role::Admin],
    },
    Permission {
        resource: "committees",
        action: "view",
        roles: STAFF,
    },
    Permission {
        resource: "committees",
        action: "manage",
        roles: &[Role::Admin],
    },
    Permission {
        resource: "groups",
        action: "view",
        roles: ALL_ROLES,
    },
    Permission {
        resource: "groups",
        action: "create",
        roles: &[Role::Student],
    },
    Permission {
        resource: "groups",
        action: "join",
        roles: &[Role::Student],
    },
    Permission {
        resource: "groups",
        action: "leave",
        roles: &[Role::Student],
    },
    Permission {
        resource: "groups",
        action: "manage",
        roles: &[Role::Admin],
    },
    Permission {
        resource: "users",
        action: "view",
        roles: &[Role::Admin],
    },
    Permission {
        resource: "users",
        action: "manage",
        roles: &[Role::Admin],
    },
];

// Guarded front-end routes and the roles allowed through.
pub const ROUTES: &[(&str, &[Role])] = &[
    ("/dashboard", ALL_ROLES),
    ("/projects", ALL_ROLES),
    ("/proposals", ALL_ROLES),
    ("/evaluations", STAFF),
    ("/schedules", ALL_ROLES),
    ("/committees", STAFF),
    ("/admin", &[Role::Admin]),
];

/// Fail-closed lookup: a (resource, action) pair with no entry denies every
/// role.
pub fn authorize(role: Role, resource: &str, action: &str) -> bool {
    PERMISSIONS
        .iter()
        .find(|p| p.resource == resource && p.action == action)
        .map(|p| p.roles.contains(&role))
        .unwrap_or(false)
}

/// Route guard: an unauthenticated session is always denied.
pub fn can_access_route(session_role: Option<Role>, allowed_roles: &[Role]) -> bool {
    match session_role {
        Some(role) => allowed_roles.contains(&role),
        None => false,
    }
}

pub fn route_roles(path: &str) -> Option<&'static [Role]> {
    ROUTES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, roles)| *roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committee_approves_grades() {
        assert!(authorize(Role::Committee, "grades", "approve"));
        assert!(!authorize(Role::Supervisor, "grades", "approve"));
        assert!(!authorize(Role::Admin, "grades", "approve"));
    }

    #[test]
    fn only_students_register_projects() {
        assert!(authorize(Role::Student, "projects", "register"));
        assert!(!authorize(Role::Supervisor, "projects", "register"));
    }

    #[test]
    fn unknown_pairs_deny_every_role() {
        for role in [
            Role::Student,
            Role::Supervisor,
            Role::Committee,
            Role::Discussion,
            Role::Admin,
        ] {
            assert!(!authorize(role, "projects", "transmogrify"));
            assert!(!authorize(role, "no-such-resource", "view"));
        }
    }

    #[test]
    fn unauthenticated_sessions_are_denied() {
        assert!(!can_access_route(None, ALL_ROLES));
        assert!(can_access_route(Some(Role::Student), ALL_ROLES));
        assert!(!can_access_route(
            Some(Role::Student),
            route_roles("/admin").unwrap()
        ));
    }

    #[test]
    fn unknown_routes_have_no_allowed_roles() {
        assert!(route_roles("/no-such-route").is_none());
    }
}
