use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Authorization tier of a user.
///
/// Variants are declared in privilege order so `Ord` gives
/// `User < Moderator < Admin`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Resolve the stored role field plus the legacy privilege flags into the
    /// single effective role.
    ///
    /// `is_staff` and `is_superuser` are aliases for admin. This is the only
    /// place the flags are interpreted; everything downstream sees a `Role`.
    pub fn resolve(role: Role, is_staff: bool, is_superuser: bool) -> Role {
        if is_staff || is_superuser {
            Role::Admin
        } else {
            role
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn at_least(self, other: Role) -> bool {
        self >= other
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}' (expected one of: user, moderator, admin)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_order() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin.at_least(Role::Moderator));
        assert!(!Role::User.at_least(Role::Moderator));
    }

    #[test]
    fn flags_resolve_to_admin() {
        assert_eq!(Role::resolve(Role::User, true, false), Role::Admin);
        assert_eq!(Role::resolve(Role::Moderator, false, true), Role::Admin);
        assert_eq!(Role::resolve(Role::Moderator, false, false), Role::Moderator);
    }

    #[test]
    fn parse_and_display_agree() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
    }
}
