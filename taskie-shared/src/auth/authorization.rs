/// Role-based access control
///
/// Access is decided from a static table: each role says whether it may touch
/// data owned by other users. Routes declare which roles may call them; the
/// owner of the resource comes from the `:user_id` path segment.
///
/// | role    | can access others' data |
/// |---------|-------------------------|
/// | `admin` | yes                     |
/// | `user`  | no                      |
///
/// # Example
///
/// ```
/// use taskie_shared::auth::authorization::{authorize, ADMIN, USER};
/// use taskie_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let caller = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "ada@example.com".into(),
///     name: "Ada".into(),
///     role_name: USER.into(),
/// };
///
/// assert!(authorize(Some(&caller), &[ADMIN, USER], Some(caller.user_id)).is_ok());
/// assert!(authorize(Some(&caller), &[ADMIN, USER], Some(Uuid::new_v4())).is_err());
/// assert!(authorize(Some(&caller), &[ADMIN], None).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

pub const ADMIN: &str = "admin";
pub const USER: &str = "user";

/// Every role known to the system, in seeding order
pub const ROLES: &[&str] = &[ADMIN, USER];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationRule {
    pub role: &'static str,
    pub can_access_others_data: bool,
}

pub static AUTHORIZATION_RULES: &[AuthorizationRule] = &[
    AuthorizationRule {
        role: ADMIN,
        can_access_others_data: true,
    },
    AuthorizationRule {
        role: USER,
        can_access_others_data: false,
    },
];

/// Looks up the rule for a role name
pub fn rule_for(role: &str) -> Option<&'static AuthorizationRule> {
    AUTHORIZATION_RULES.iter().find(|rule| rule.role == role)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// No identity (or an identity without a role) reached the check
    #[error("User role or ID not found in token")]
    MissingIdentity,

    #[error("User role not authorized for this resource")]
    RoleNotAllowed,

    /// The role passed the allow-list but has no entry in the rules table
    #[error("Role rules not found for {0}")]
    UnknownRole(String),

    #[error("You can only access your own resources")]
    NotOwner,
}

/// Decides whether `auth` may reach a route restricted to `allowed_roles`
/// that concerns data owned by `resource_owner`
///
/// Checks run in order: identity present, role allowed, rule exists, then
/// ownership when the rule forbids cross-user access.
pub fn authorize(
    auth: Option<&AuthContext>,
    allowed_roles: &[&str],
    resource_owner: Option<Uuid>,
) -> Result<(), AuthzError> {
    let auth = auth
        .filter(|auth| !auth.role_name.is_empty() && !auth.user_id.is_nil())
        .ok_or(AuthzError::MissingIdentity)?;

    if !allowed_roles.contains(&auth.role_name.as_str()) {
        return Err(AuthzError::RoleNotAllowed);
    }

    let rule = rule_for(&auth.role_name)
        .ok_or_else(|| AuthzError::UnknownRole(auth.role_name.clone()))?;

    match resource_owner {
        Some(owner) if !rule.can_access_others_data && owner != auth.user_id => {
            Err(AuthzError::NotOwner)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: &str) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "caller@example.com".to_string(),
            name: "Caller".to_string(),
            role_name: role.to_string(),
        }
    }

    #[test]
    fn test_rules_table() {
        assert!(rule_for(ADMIN).unwrap().can_access_others_data);
        assert!(!rule_for(USER).unwrap().can_access_others_data);
        assert!(rule_for("guest").is_none());
        assert_eq!(ROLES.len(), AUTHORIZATION_RULES.len());
    }

    #[test]
    fn test_missing_identity() {
        assert_eq!(authorize(None, &[ADMIN, USER], None), Err(AuthzError::MissingIdentity));

        let mut roleless = caller(USER);
        roleless.role_name.clear();
        assert_eq!(
            authorize(Some(&roleless), &[ADMIN, USER], None),
            Err(AuthzError::MissingIdentity)
        );
    }

    #[test]
    fn test_user_on_own_resource() {
        let user = caller(USER);
        assert!(authorize(Some(&user), &[ADMIN, USER], Some(user.user_id)).is_ok());
    }

    #[test]
    fn test_user_on_foreign_resource() {
        let user = caller(USER);
        assert_eq!(
            authorize(Some(&user), &[ADMIN, USER], Some(Uuid::new_v4())),
            Err(AuthzError::NotOwner)
        );
    }

    #[test]
    fn test_admin_on_foreign_resource() {
        let admin = caller(ADMIN);
        assert!(authorize(Some(&admin), &[ADMIN, USER], Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_role_not_in_allow_list() {
        let user = caller(USER);
        assert_eq!(authorize(Some(&user), &[ADMIN], None), Err(AuthzError::RoleNotAllowed));
    }

    #[test]
    fn test_allowed_role_without_rule() {
        let auditor = caller("auditor");
        assert_eq!(
            authorize(Some(&auditor), &["auditor"], None),
            Err(AuthzError::UnknownRole("auditor".to_string()))
        );
    }

    #[test]
    fn test_no_resource_owner_skips_ownership() {
        let user = caller(USER);
        assert!(authorize(Some(&user), &[USER], None).is_ok());
    }
}
