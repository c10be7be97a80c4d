use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::{Identity, Role};

/// JWT payload carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub name: String,   // login handle
    pub role: Role,
    pub email: String,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Identity {
            id: c.sub,
            name: c.name,
            role: c.role,
            email: c.email,
        }
    }
}
