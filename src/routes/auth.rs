use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthMiddleware, AuthResponse,
        AuthenticatedUser, LoginRequest, SignupRequest, TokenConfig,
    },
    error::AppError,
    models::{user::normalize_email, User, UserCredentials},
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Mounts signup, login and the token-protected profile endpoint under `prefix`.
pub fn register(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix).service(signup).service(login).service(
            web::resource("/me")
                .wrap(AuthMiddleware)
                .route(web::get().to(me)),
        ),
    );
}

/// Register a new user
///
/// Creates the account and returns an access token, so the client is signed
/// in immediately.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid input")
    )
)]
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenConfig>,
    payload: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let SignupRequest {
        name,
        email,
        password,
    } = payload.into_inner();

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError("name: must not be blank".into()));
    }
    let email = normalize_email(&email);

    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = web::block(move || hash_password(&password)).await??;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
         RETURNING id, name, email, created_at",
    )
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent signup for the same email.
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::BadRequest("Email already registered".into())
        }
        other => other.into(),
    })?;

    log::info!("registered user {}", user.id);
    let token = generate_token(user.id, &tokens)?;
    Ok(HttpResponse::Created().json(AuthResponse::bearer(
        token, user.id, user.email, user.name,
    )))
}

/// Login user
///
/// Wrong email and wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Invalid input")
    )
)]
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let LoginRequest { email, password } = payload.into_inner();

    let user = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, name, email, password_hash FROM users WHERE email = $1",
    )
    .bind(normalize_email(&email))
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    let stored_hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &stored_hash)).await??;
    if !matches {
        log::debug!("failed login for user {}", user.id);
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(user.id, &tokens)?;
    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        token, user.id, user.email, user.name,
    )))
}

/// Current user profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The signed-in user", body = User),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, User>(
        "SELECT id, name, email, created_at FROM users WHERE id = $1",
    )
    .bind(user.0)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}
