use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::identity::Role;

/// Row as stored in `users`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_deleted: bool,
    pub created_at: OffsetDateTime,
}

/// User record in the database.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never serialized
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r.role.parse::<Role>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".into(),
            source: Box::new(e),
        })?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            role,
            is_deleted: r.is_deleted,
            created_at: r.created_at,
        })
    }
}

/// Fields needed to insert a user. The hash is computed before this exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
