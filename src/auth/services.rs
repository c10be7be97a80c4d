use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    identity::Role,
    password::{hash_password, verify_password},
    repo_types::{NewUser, User},
};
use crate::{
    config::AdminBootstrap,
    error::{AppError, AppResult},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Verified against when the login name is unknown, so a miss costs the
    // same as a wrong password.
    static ref DUMMY_HASH: String =
        hash_password("tasktrack-dummy-password").unwrap_or_default();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password.".into())
}

pub async fn register(st: &AppState, req: RegisterRequest) -> AppResult<User> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AppError::Validation("Name is required.".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email.".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    if st.users.find_active_by_email(&email).await?.is_some() {
        info!(email = %email, "registration with existing email");
        return Err(AppError::Conflict("Email already registered.".into()));
    }
    if st.users.find_active_by_name(&name).await?.is_some() {
        info!(name = %name, "registration with existing name");
        return Err(AppError::Conflict("Name already taken.".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = st
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Returns a signed token. Unknown names and wrong passwords produce the
/// same error.
pub async fn login(st: &AppState, req: LoginRequest) -> AppResult<String> {
    let name = req.name.trim();
    if name.is_empty() || req.password.is_empty() {
        warn!("login attempt with missing credentials");
        return Err(AppError::Validation(
            "Username and password are required.".into(),
        ));
    }

    let user = st.users.find_active_by_name(name).await?;
    let verified = match &user {
        Some(u) => verify_password(&req.password, &u.password_hash),
        None => {
            let _ = verify_password(&req.password, &DUMMY_HASH);
            false
        }
    };

    let user = match user {
        Some(u) if verified => u,
        _ => {
            warn!(name = %name, "failed login attempt");
            return Err(invalid_credentials());
        }
    };

    let token = st.keys.sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Makes sure the configured admin account exists. Returns `true` when it
/// had to be created.
pub async fn ensure_admin(st: &AppState, admin: &AdminBootstrap) -> AppResult<bool> {
    if let Some(existing) = st.users.find_active_by_name(&admin.name).await? {
        return match existing.role {
            Role::Admin => {
                info!(user_id = %existing.id, "admin user already exists");
                Ok(false)
            }
            Role::User => Err(AppError::Conflict(format!(
                "user {:?} exists without admin role",
                admin.name
            ))),
        };
    }

    let password_hash = hash_password(&admin.password)?;
    let user = st
        .users
        .create(NewUser {
            name: admin.name.clone(),
            email: admin.email.trim().to_lowercase(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = %user.id, "admin user created");
    Ok(true)
}
