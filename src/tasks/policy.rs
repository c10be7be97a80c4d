//! Who may do what with a task.
//!
//! Every function here is pure: it looks at the caller's [`Identity`] and,
//! where relevant, the stored [`Task`], and either returns a decision or an
//! [`AccessDenied`]. A task that does not exist never reaches this module, so
//! "forbidden" and "not found" stay separate outcomes.

use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Task, TaskScope, TaskStatus};
use crate::auth::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("Only administrators can create tasks.")]
    CreateRequiresAdmin,
    #[error("Only administrators can delete tasks.")]
    DeleteRequiresAdmin,
    #[error("This task is not assigned to you.")]
    NotAssignee,
    #[error("Administrator privileges required.")]
    AdminOnly,
    #[error("You may only view your own account.")]
    NotSelf,
}

/// Fields submitted with an update. `None` leaves the stored value alone;
/// `due_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub priority: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to_user_id: Option<Uuid>,
}

pub fn list_scope(who: &Identity) -> TaskScope {
    match who.role {
        Role::Admin => TaskScope::All,
        Role::User => TaskScope::AssignedTo(who.id),
    }
}

/// Counts are always about the caller's own tasks, whatever the role.
pub fn count_scope(who: &Identity) -> Uuid {
    who.id
}

pub fn authorize_read(who: &Identity, task: &Task) -> Result<(), AccessDenied> {
    match who.role {
        Role::Admin => Ok(()),
        Role::User if task.assigned_to_user_id == who.id => Ok(()),
        Role::User => Err(AccessDenied::NotAssignee),
    }
}

pub fn authorize_create(who: &Identity) -> Result<(), AccessDenied> {
    match who.role {
        Role::Admin => Ok(()),
        Role::User => Err(AccessDenied::CreateRequiresAdmin),
    }
}

pub fn authorize_delete(who: &Identity) -> Result<(), AccessDenied> {
    match who.role {
        Role::Admin => Ok(()),
        Role::User => Err(AccessDenied::DeleteRequiresAdmin),
    }
}

/// Produces the task as it should be stored after `changes`.
///
/// Admins get every submitted field. The assignee may only move the status;
/// anything else they submit is dropped.
pub fn apply_update(
    who: &Identity,
    existing: &Task,
    changes: TaskChanges,
) -> Result<Task, AccessDenied> {
    let mut next = existing.clone();
    match who.role {
        Role::Admin => {
            if let Some(title) = changes.title {
                next.title = title;
            }
            if let Some(description) = changes.description {
                next.description = description;
            }
            if let Some(due) = changes.due_date {
                next.due_date = due;
            }
            if let Some(priority) = changes.priority {
                next.priority = priority;
            }
            if let Some(status) = changes.status {
                next.status = status;
            }
            if let Some(assignee) = changes.assigned_to_user_id {
                next.assigned_to_user_id = assignee;
            }
        }
        Role::User => {
            if existing.assigned_to_user_id != who.id {
                return Err(AccessDenied::NotAssignee);
            }
            if let Some(status) = changes.status {
                next.status = status;
            }
        }
    }
    Ok(next)
}

pub fn authorize_user_admin(who: &Identity) -> Result<(), AccessDenied> {
    match who.role {
        Role::Admin => Ok(()),
        Role::User => Err(AccessDenied::AdminOnly),
    }
}

pub fn authorize_view_user(who: &Identity, user_id: Uuid) -> Result<(), AccessDenied> {
    match who.role {
        Role::Admin => Ok(()),
        Role::User if who.id == user_id => Ok(()),
        Role::User => Err(AccessDenied::NotSelf),
    }
}
