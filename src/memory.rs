//! In-memory `UserStore` + `TaskStore` used by tests in place of Postgres.
//! Mirrors the SQL semantics: partial unique indexes on active users,
//! version-checked task updates, soft deletes.

use async_trait::async_trait;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::StoreError,
    tasks::{
        repo::TaskStore,
        repo_types::{NewTask, Task, TaskCounts, TaskQuery, TaskScope},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
}

fn matches(query: &TaskQuery, task: &Task) -> bool {
    if task.is_deleted {
        return false;
    }
    if let TaskScope::AssignedTo(user_id) = query.scope {
        if task.assigned_to_user_id != user_id {
            return false;
        }
    }
    if query.status.is_some_and(|s| s != task.status) {
        return false;
    }
    if query.priority.as_deref().is_some_and(|p| p != task.priority) {
        return false;
    }
    match (query.due_on, task.due_date) {
        (None, _) => true,
        (Some(day), Some(due)) => due.to_offset(UtcOffset::UTC).date() == day,
        (Some(_), None) => false,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id && !u.is_deleted).cloned())
    }

    async fn find_active_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.name == name && !u.is_deleted).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email && !u.is_deleted).cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| !u.is_deleted).cloned().collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let active = || users.iter().filter(|u| !u.is_deleted);
        if active().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users_email_active_idx".into()));
        }
        if active().any(|u| u.name == user.name) {
            return Err(StoreError::Duplicate("users_name_active_idx".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_deleted: false,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id && !u.is_deleted) {
            Some(u) => {
                u.is_deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|t| matches(query, t)).cloned().collect())
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id && !t.is_deleted).cloned())
    }

    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let created = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            assigned_to_user_id: task.assigned_to_user_id,
            version: 1,
            is_deleted: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tasks.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, task: &Task, expected_version: i32) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .iter_mut()
            .find(|t| t.id == task.id && !t.is_deleted)
            .ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict);
        }
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.due_date = task.due_date;
        stored.priority = task.priority.clone();
        stored.status = task.status;
        stored.assigned_to_user_id = task.assigned_to_user_id;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == id && !t.is_deleted) {
            Some(t) => {
                t.is_deleted = true;
                t.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_by_status(&self, user_id: Uuid) -> Result<TaskCounts, StoreError> {
        let tasks = self.tasks.read().await;
        let mut counts = TaskCounts::default();
        for t in tasks
            .iter()
            .filter(|t| t.assigned_to_user_id == user_id && !t.is_deleted)
        {
            counts.add(t.status, 1);
        }
        Ok(counts)
    }
}
