use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, TaskFilter, TaskView, UpdateTaskRequest},
    repo_types::TaskCounts,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/count", get(count_tasks))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppQuery(filter): AppQuery<TaskFilter>,
) -> AppResult<Json<Vec<TaskView>>> {
    let tasks = services::list_tasks(&state, &who, filter).await?;
    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TaskView>> {
    let task = services::get_task(&state, &who, id).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, who, payload), fields(user_id = %who.id))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<TaskView>)> {
    let task = services::create_task(&state, &who, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/tasks/{}", task.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(task.into())))
}

#[instrument(skip(state, who, payload), fields(user_id = %who.id))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> AppResult<Json<TaskView>> {
    let task = services::update_task(&state, &who, id, payload).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_task(&state, &who, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn count_tasks(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> AppResult<Json<TaskCounts>> {
    Ok(Json(services::count_tasks(&state, &who).await?))
}
