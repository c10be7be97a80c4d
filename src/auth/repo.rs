use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserRow};
use crate::{db::map_write_error, error::StoreError};

/// Credential store. Every lookup ignores soft-deleted users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_active_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list_active(&self) -> Result<Vec<User>, StoreError>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    /// Returns `false` when no active user has `id`.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, arg: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(arg)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, is_deleted, created_at
            FROM users
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_active_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        self.find_one(
            r#"
            SELECT id, name, email, password_hash, role, is_deleted, created_at
            FROM users
            WHERE name = $1 AND NOT is_deleted
            "#,
            name,
        )
        .await
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one(
            r#"
            SELECT id, name, email, password_hash, role, is_deleted, created_at
            FROM users
            WHERE email = $1 AND NOT is_deleted
            "#,
            email,
        )
        .await
    }

    async fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, is_deleted, created_at
            FROM users
            WHERE NOT is_deleted
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, is_deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(User::try_from(row)?)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users SET is_deleted = TRUE
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
