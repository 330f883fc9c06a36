use tracing::error;

/// True when a role requirement admits the given role set.
///
/// An absent or empty requirement admits everyone; otherwise the sets must
/// share at least one role.
pub fn roles_admit(required: Option<&[String]>, roles: &[String]) -> bool {
    match required {
        None => true,
        Some(req) if req.is_empty() => true,
        Some(req) => roles.iter().any(|r| req.iter().any(|q| q == r)),
    }
}

/// Element-level permission check: does the session hold any of `permission_roles`?
///
/// Unlike route gating, an empty list here is a programming error: it is logged
/// and denied.
pub fn check_permission(session_roles: &[String], permission_roles: &[&str]) -> bool {
    if permission_roles.is_empty() {
        error!(target: "libris::session", "check_permission needs a non-empty role list, e.g. [\"admin\", \"root\"]");
        return false;
    }
    session_roles.iter().any(|r| permission_roles.iter().any(|p| p == r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[&str]) -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn absent_or_empty_requirement_admits() {
        assert!(roles_admit(None, &[]));
        assert!(roles_admit(Some(&[]), &v(&["user"])));
    }

    #[test]
    fn requirement_needs_intersection() {
        let req = v(&["admin", "root"]);
        assert!(roles_admit(Some(&req), &v(&["user", "root"])));
        assert!(!roles_admit(Some(&req), &v(&["user"])));
        assert!(!roles_admit(Some(&req), &[]));
    }

    #[test]
    fn check_permission_rejects_empty_list() {
        assert!(!check_permission(&v(&["admin"]), &[]));
        assert!(check_permission(&v(&["admin"]), &["admin", "root"]));
        assert!(!check_permission(&v(&["user"]), &["admin"]));
    }
}
