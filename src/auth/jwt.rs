use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, repo_types::User};
use crate::{config::JwtConfig, state::AppState};

/// Lifetime of an issued token.
pub const TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token expired")]
    Expired,
    #[error("token issuer mismatch")]
    InvalidIssuer,
    #[error("token audience mismatch")]
    InvalidAudience,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            ErrorKind::InvalidAudience => JwtError::InvalidAudience,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Malformed(e.to_string()),
        }
    }
}

/// HS256 signing and verification keys with the expected issuer/audience.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    pub fn sign(&self, user: &User) -> Result<String, JwtError> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `issued_at`; it expires `TOKEN_TTL` later.
    pub fn sign_at(&self, user: &User, issued_at: OffsetDateTime) -> Result<String, JwtError> {
        let exp = issued_at + TOKEN_TTL;
        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            role: user.role,
            email: user.email.clone(),
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(JwtError::Signing)?;
        debug!(user_id = %user.id, role = %user.role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
