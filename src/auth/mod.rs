pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims, TokenConfig};

/// Payload for `POST /api/auth/signup`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Display name, 1 to 100 characters.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// At least 8 characters.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Payload for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Returned by signup and login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

impl AuthResponse {
    pub fn bearer(access_token: String, user_id: i32, email: String, name: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id,
            email,
            name,
        }
    }
}
