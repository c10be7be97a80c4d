use time::{macros::format_description, Date};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, TaskFilter, UpdateTaskRequest},
    policy::{self, TaskChanges},
    repo_types::{NewTask, Task, TaskCounts, TaskQuery, TaskStatus, DEFAULT_PRIORITY},
};
use crate::{
    auth::identity::Identity,
    error::{AppError, AppResult, StoreError},
    state::AppState,
};

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found.".into())
}

fn parse_filter(who: &Identity, filter: TaskFilter) -> AppResult<TaskQuery> {
    let status = match filter.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<TaskStatus>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        None => None,
    };
    let due_on = match filter.due_date.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            Date::parse(s, format_description!("[year]-[month]-[day]"))
                .map_err(|_| AppError::Validation("dueDate must be YYYY-MM-DD".into()))?,
        ),
        None => None,
    };
    Ok(TaskQuery {
        scope: policy::list_scope(who),
        status,
        priority: filter.priority.filter(|p| !p.is_empty()),
        due_on,
    })
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Task title is required.".into()));
    }
    Ok(())
}

async fn ensure_assignee_exists(st: &AppState, user_id: Uuid) -> AppResult<()> {
    if st.users.find_active_by_id(user_id).await?.is_none() {
        warn!(%user_id, "task references a non-existent user");
        return Err(AppError::Validation("Assigned user does not exist.".into()));
    }
    Ok(())
}

pub async fn list_tasks(st: &AppState, who: &Identity, filter: TaskFilter) -> AppResult<Vec<Task>> {
    let query = parse_filter(who, filter)?;
    let tasks = st.tasks.list(&query).await?;
    info!(user_id = %who.id, count = tasks.len(), "tasks listed");
    Ok(tasks)
}

pub async fn get_task(st: &AppState, who: &Identity, id: Uuid) -> AppResult<Task> {
    let task = st.tasks.find_active(id).await?.ok_or_else(task_not_found)?;
    if let Err(denied) = policy::authorize_read(who, &task) {
        warn!(task_id = %id, user_id = %who.id, "task read denied");
        return Err(denied.into());
    }
    Ok(task)
}

pub async fn create_task(st: &AppState, who: &Identity, req: CreateTaskRequest) -> AppResult<Task> {
    policy::authorize_create(who)?;
    validate_title(&req.title)?;
    ensure_assignee_exists(st, req.assigned_to_user_id).await?;

    let task = st
        .tasks
        .create(NewTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req
                .priority
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            status: req.status.unwrap_or_default(),
            assigned_to_user_id: req.assigned_to_user_id,
        })
        .await?;
    info!(task_id = %task.id, assignee = %task.assigned_to_user_id, "task created");
    Ok(task)
}

pub async fn update_task(
    st: &AppState,
    who: &Identity,
    path_id: Uuid,
    req: UpdateTaskRequest,
) -> AppResult<Task> {
    if req.id != path_id {
        warn!(%path_id, body_id = %req.id, "task update with mismatched ids");
        return Err(AppError::Validation("Task ID mismatch.".into()));
    }

    let existing = st.tasks.find_active(path_id).await?.ok_or_else(task_not_found)?;
    let expected_version = req.version.unwrap_or(existing.version);
    let changes = TaskChanges {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        priority: req.priority,
        status: req.status,
        assigned_to_user_id: req.assigned_to_user_id,
    };

    let next = match policy::apply_update(who, &existing, changes) {
        Ok(next) => next,
        Err(denied) => {
            warn!(task_id = %path_id, user_id = %who.id, "task update denied");
            return Err(denied.into());
        }
    };
    validate_title(&next.title)?;
    if next.assigned_to_user_id != existing.assigned_to_user_id {
        ensure_assignee_exists(st, next.assigned_to_user_id).await?;
    }

    let updated = st
        .tasks
        .update(&next, expected_version)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => task_not_found(),
            other => {
                warn!(task_id = %path_id, error = %other, "task update failed");
                AppError::from(other)
            }
        })?;
    info!(task_id = %path_id, version = updated.version, "task updated");
    Ok(updated)
}

pub async fn delete_task(st: &AppState, who: &Identity, id: Uuid) -> AppResult<()> {
    policy::authorize_delete(who)?;
    if !st.tasks.soft_delete(id).await? {
        return Err(task_not_found());
    }
    info!(task_id = %id, "task soft deleted");
    Ok(())
}

pub async fn count_tasks(st: &AppState, who: &Identity) -> AppResult<TaskCounts> {
    let counts = st.tasks.count_by_status(policy::count_scope(who)).await?;
    info!(
        user_id = %who.id,
        completed = counts.completed,
        in_progress = counts.in_progress,
        pending = counts.pending,
        "task counts"
    );
    Ok(counts)
}
