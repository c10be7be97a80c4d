use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewTask, Task, TaskCounts, TaskQuery, TaskRow, TaskScope, TaskStatus};
use crate::{db::map_write_error, error::StoreError};

/// Task record access. Soft-deleted tasks are never returned or modified.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;
    async fn find_active(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
    async fn create(&self, task: NewTask) -> Result<Task, StoreError>;
    /// Writes every mutable field of `task` if the stored version still equals
    /// `expected_version`. A mismatch is `StoreError::Conflict`; a missing row
    /// is `StoreError::NotFound`.
    async fn update(&self, task: &Task, expected_version: i32) -> Result<Task, StoreError>;
    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn count_by_status(&self, user_id: Uuid) -> Result<TaskCounts, StoreError>;
}

const TASK_COLUMNS: &str = "id, title, description, due_date, priority, status, \
                            assigned_to_user_id, version, is_deleted, created_at";

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
}

impl PgTaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    Ok(rows
        .into_iter()
        .map(Task::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE NOT is_deleted"
        ));
        if let TaskScope::AssignedTo(user_id) = query.scope {
            qb.push(" AND assigned_to_user_id = ").push_bind(user_id);
        }
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(priority) = &query.priority {
            qb.push(" AND priority = ").push_bind(priority.clone());
        }
        if let Some(day) = query.due_on {
            qb.push(" AND (due_date AT TIME ZONE 'UTC')::date = ")
                .push_bind(day);
        }
        qb.push(" ORDER BY created_at ASC");

        let rows = qb.build_query_as::<TaskRow>().fetch_all(&self.db).await?;
        into_tasks(rows)
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, due_date, priority, status, assigned_to_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(&task.priority)
        .bind(task.status.as_str())
        .bind(task.assigned_to_user_id)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(Task::try_from(row)?)
    }

    async fn update(&self, task: &Task, expected_version: i32) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
               SET title = $2, description = $3, due_date = $4, priority = $5,
                   status = $6, assigned_to_user_id = $7, version = version + 1
             WHERE id = $1 AND version = $8 AND NOT is_deleted
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(&task.priority)
        .bind(task.status.as_str())
        .bind(task.assigned_to_user_id)
        .bind(expected_version)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?;

        if let Some(row) = row {
            return Ok(Task::try_from(row)?);
        }

        // Nothing matched: either the row is gone or someone bumped the version.
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1 AND NOT is_deleted)",
        )
        .bind(task.id)
        .fetch_one(&self.db)
        .await?;
        if exists {
            Err(StoreError::Conflict)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE tasks SET is_deleted = TRUE, version = version + 1
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn count_by_status(&self, user_id: Uuid) -> Result<TaskCounts, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
              FROM tasks
             WHERE assigned_to_user_id = $1 AND NOT is_deleted
             GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut counts = TaskCounts::default();
        for (status, n) in rows {
            let status = status.parse::<TaskStatus>().map_err(|e| {
                StoreError::Database(sqlx::Error::ColumnDecode {
                    index: "status".into(),
                    source: Box::new(e),
                })
            })?;
            counts.add(status, n);
        }
        Ok(counts)
    }
}
