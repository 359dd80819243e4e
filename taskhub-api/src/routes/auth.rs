/// Authentication endpoints
///
/// - `POST /api/auth/register`: create an account
/// - `POST /api/auth/login`: exchange credentials for a JWT
/// - `GET /api/auth/profile`: the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::AuthContext,
        password::{hash_password_blocking, verify_password_blocking},
    },
    models::user::{normalize_email, CreateUser, UserSummary},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Registers a new user
///
/// ```text
/// POST /api/auth/register
///
/// { "name": "Ana", "email": "ana@example.com", "password": "correct horse" }
/// ```
///
/// Responds `201` with `{ "message": "User registered successfully", "userId": "..." }`.
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;

    let password_hash = hash_password_blocking(req.password).await?;

    let user = state
        .stores
        .users
        .create(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id.to_string(),
        }),
    ))
}

/// Logs a user in
///
/// ```text
/// POST /api/auth/login
///
/// { "email": "ana@example.com", "password": "correct horse" }
/// ```
///
/// Responds with `{ "token": "eyJ..." }`. Unknown emails and wrong passwords
/// get the same `401`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .stores
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(invalid_credentials());
    }

    let claims = Claims::with_expiration(
        user.id,
        Duration::hours(state.config.jwt.expiration_hours),
    );
    let token = create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { token }))
}

/// The authenticated user's `{ id, name, email }`
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserSummary>> {
    let user = state
        .stores
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(&user)))
}
