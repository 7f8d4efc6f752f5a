//! Fixed role hierarchy and permission table.
//!
//! Both are compile-time constants: a role's rank is its position in
//! [`ROLE_HIERARCHY`] and its permissions come from [`permissions_for`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROLE_GUEST: &str = "guest";
pub const ROLE_USER: &str = "user";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

/// Permission token granting every permission.
pub const WILDCARD: &str = "*";

/// Well-known permission names.
pub mod perms {
    pub const READ_PUBLIC: &str = "read:public";
    pub const READ_OWN: &str = "read:own";
    pub const WRITE_OWN: &str = "write:own";
    pub const READ_TENANT: &str = "read:tenant";
    pub const WRITE_TENANT: &str = "write:tenant";
    pub const MODERATE_CONTENT: &str = "moderate:content";
    pub const MANAGE_USERS: &str = "manage:users";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Moderator,
    Admin,
    Superadmin,
}

/// Roles ordered from least to most privileged.
pub const ROLE_HIERARCHY: [Role; 5] = [
    Role::Guest,
    Role::User,
    Role::Moderator,
    Role::Admin,
    Role::Superadmin,
];

impl Role {
    /// Parse a role name, case-insensitively. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Role> {
        ROLE_HIERARCHY
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => ROLE_GUEST,
            Role::User => ROLE_USER,
            Role::Moderator => ROLE_MODERATOR,
            Role::Admin => ROLE_ADMIN,
            Role::Superadmin => ROLE_SUPERADMIN,
        }
    }

    /// Rank in the hierarchy; `guest` is 0.
    pub fn level(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission set granted to a role.
pub fn permissions_for(role: Role) -> &'static [&'static str] {
    use perms::*;
    match role {
        Role::Guest => &[READ_PUBLIC],
        Role::User => &[READ_PUBLIC, READ_OWN, WRITE_OWN],
        Role::Moderator => &[READ_PUBLIC, READ_OWN, WRITE_OWN, READ_TENANT, MODERATE_CONTENT],
        Role::Admin => &[
            READ_PUBLIC,
            READ_OWN,
            WRITE_OWN,
            READ_TENANT,
            WRITE_TENANT,
            MANAGE_USERS,
        ],
        Role::Superadmin => &[WILDCARD],
    }
}

/// Whether `role` grants `permission`, either directly or via the wildcard.
///
/// Role names are matched exactly; an unknown role has no permissions.
pub fn has_permission(role: &str, permission: &str) -> bool {
    let Some(role) = exact_role(role) else {
        return false;
    };
    let granted = permissions_for(role);
    granted.contains(&WILDCARD) || granted.contains(&permission)
}

/// Whether `role` ranks at least as high as `min_role`.
///
/// Both names must be recognized; an unknown name on either side fails.
pub fn has_role_level(role: &str, min_role: &str) -> bool {
    match (exact_role(role), exact_role(min_role)) {
        (Some(role), Some(min_role)) => role.level() >= min_role.level(),
        _ => false,
    }
}

fn exact_role(name: &str) -> Option<Role> {
    ROLE_HIERARCHY.into_iter().find(|role| role.as_str() == name)
}
