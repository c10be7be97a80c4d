use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub const DEFAULT_PRIORITY: &str = "Normal";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown task status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<OffsetDateTime>,
    pub priority: String,
    pub status: String,
    pub assigned_to_user_id: Uuid,
    pub version: i32,
    pub is_deleted: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<OffsetDateTime>,
    pub priority: String,
    pub status: TaskStatus,
    pub assigned_to_user_id: Uuid,
    pub version: i32, // bumped on every write
    pub is_deleted: bool,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = sqlx::Error;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<TaskStatus>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".into(),
            source: Box::new(e),
        })?;
        Ok(Self {
            id: r.id,
            title: r.title,
            description: r.description,
            due_date: r.due_date,
            priority: r.priority,
            status,
            assigned_to_user_id: r.assigned_to_user_id,
            version: r.version,
            is_deleted: r.is_deleted,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<OffsetDateTime>,
    pub priority: String,
    pub status: TaskStatus,
    pub assigned_to_user_id: Uuid,
}

/// Which tasks a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    AssignedTo(Uuid),
}

#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub scope: TaskScope,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    pub due_on: Option<Date>, // calendar day in UTC
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub completed: i64,
    pub in_progress: i64,
    pub pending: i64,
}

impl TaskCounts {
    pub fn add(&mut self, status: TaskStatus, n: i64) {
        match status {
            TaskStatus::Pending => self.pending += n,
            TaskStatus::InProgress => self.in_progress += n,
            TaskStatus::Completed => self.completed += n,
        }
    }
}
