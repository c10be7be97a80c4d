use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Column value in `users.role`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Caller identity rebuilt from a verified token; lives for one request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_known_values() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
        assert!("Root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_as_pascal_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"User\"");
    }
}
