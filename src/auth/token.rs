use crate::{config::Settings, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: i32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signing material and lifetime for access tokens.
///
/// Built once from [`Settings`] and shared with handlers and the auth
/// middleware through `web::Data`.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    expiration: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration: Duration::hours(expiration_hours),
        }
    }
}

impl From<&Settings> for TokenConfig {
    fn from(settings: &Settings) -> Self {
        TokenConfig::new(settings.jwt_secret.clone(), settings.jwt_expiration_hours)
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Generates a signed HS256 token for `user_id`.
pub fn generate_token(user_id: i32, config: &TokenConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + config.expiration).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies signature and expiry, returning the decoded claims.
///
/// Any failure (malformed, bad signature, expired) is `AppError::Unauthorized`.
pub fn verify_token(token: &str, config: &TokenConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(AppError::from)
}
