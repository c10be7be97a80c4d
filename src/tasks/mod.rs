mod dto;
pub mod handlers;
pub mod policy;
pub mod repo;
pub mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::task_routes()
}
