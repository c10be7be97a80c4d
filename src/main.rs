mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
#[cfg(test)]
mod memory;
mod state;
mod tasks;

use crate::{auth::services::ensure_admin, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tasktrack=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Bad JWT or database settings stop the process here, before serving.
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;
    let app_state = AppState::init(config).await?;
    let config = app_state.config.clone();

    match &config.admin {
        Some(admin) => {
            ensure_admin(&app_state, admin).await?;
        }
        None => tracing::info!("ADMIN_PASSWORD not set; skipping admin bootstrap"),
    }

    let app = app::build_app(app_state);
    app::serve(app, &config.host, config.port).await
}
