use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Task, TaskStatus};

/// Query string for `GET /tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>, // YYYY-MM-DD
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "due_date::option")]
    pub due_date: Option<OffsetDateTime>,
    pub priority: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to_user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absent keeps the stored date; `null` clears it.
    #[serde(default, deserialize_with = "due_date::double_option")]
    pub due_date: Option<Option<OffsetDateTime>>,
    pub priority: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to_user_id: Option<Uuid>,
    /// Version the client last saw; defaults to the stored one.
    pub version: Option<i32>,
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
mod due_date {
    use serde::{de::Error, Deserialize, Deserializer};
    use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

    fn parse(s: &str) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(s, &Rfc3339).ok().or_else(|| {
            Date::parse(s, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|d| d.midnight().assume_utc())
        })
    }

    pub fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OffsetDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) => parse(&s).map(Some).ok_or_else(|| {
                D::Error::custom(format!(
                    "invalid dueDate {s:?}, expected RFC 3339 or YYYY-MM-DD"
                ))
            }),
        }
    }

    pub fn double_option<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Option<OffsetDateTime>>, D::Error> {
        option(d).map(Some)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub priority: String,
    pub status: TaskStatus,
    pub assigned_to_user_id: Uuid,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            due_date: t.due_date,
            priority: t.priority,
            status: t.status,
            assigned_to_user_id: t.assigned_to_user_id,
            version: t.version,
            created_at: t.created_at,
        }
    }
}
