use serde::Deserialize;

/// Startup-time configuration failure. Never produced while serving requests.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("configuration value {0} must not be empty")]
    Empty(&'static str),
    #[error("configuration value {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Builds a signing configuration, rejecting blank values up front.
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let cfg = Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_ISSUER"));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_AUDIENCE"));
        }
        Ok(())
    }
}

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub admin: Option<AdminBootstrap>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig::new(
            required("JWT_SECRET")?,
            required("JWT_ISSUER")?,
            required("JWT_AUDIENCE")?,
        )?;

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "APP_PORT",
                reason: e.to_string(),
            })?,
            Err(_) => 8080,
        };

        let admin = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|password| AdminBootstrap {
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "admin".into()),
                email: std::env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@default.com".into()),
                password,
            });

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            admin,
        })
    }
}
