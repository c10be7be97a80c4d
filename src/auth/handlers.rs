use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        identity::Identity,
        services,
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
    tasks::policy,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/users", get(list_users))
        .route("/auth/users/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = services::login(&state, payload).await?;
    Ok(Json(LoginResponse { token }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(who): AuthUser) -> Json<Identity> {
    Json(who)
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> AppResult<Json<Vec<PublicUser>>> {
    policy::authorize_user_admin(&who)?;
    let users = state.users.list_active().await?;
    info!(count = users.len(), "users listed");
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<PublicUser>> {
    policy::authorize_view_user(&who, id)?;
    let user = state
        .users
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, who), fields(user_id = %who.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    policy::authorize_user_admin(&who)?;
    if !state.users.soft_delete(id).await? {
        return Err(AppError::NotFound("User not found.".into()));
    }
    info!(deleted_user_id = %id, "user soft deleted");
    Ok(StatusCode::NO_CONTENT)
}
