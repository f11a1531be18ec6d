//! Account Routes

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use storage::{NewUser, UserRecord};
use tracing::info;

use crate::auth::{create_token, hash_password, verify_password, Claims};
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub city: String,
    pub role: String,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            city: user.city.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCityRequest {
    pub city: Option<String>,
}

/// Trimmed, non-empty field
fn field(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Register a user
pub async fn register(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (Some(username), Some(password)) = (field(&req.username), field(&req.password)) else {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    };
    if username.chars().count() < 3 {
        return Err(ApiError::BadRequest("Username must be at least 3 characters".to_string()));
    }
    if password.chars().count() < 6 {
        return Err(ApiError::BadRequest("Password must be at least 6 characters".to_string()));
    }

    let password_hash = hash_password(&password, state.config.auth.bcrypt_cost)?;
    let user = state
        .repository
        .create_user(NewUser {
            username,
            password_hash,
            email: field(&req.email),
            city: field(&req.city),
            full_name: field(&req.full_name),
            role: None,
        })
        .await?;

    info!(user_id = user.id, "Registered user {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<SharedState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (field(&req.username), field(&req.password)) else {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let user = state
        .repository
        .find_user_by_username(&username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&password, &user.password_hash) {
        return Err(invalid());
    }

    let access_token = create_token(
        &state.config.auth.jwt_secret,
        &user,
        state.config.auth.token_expire_secs,
    )
    .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token,
        user: UserView::from(&user),
    }))
}

/// Change the caller's city
pub async fn update_city(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateCityRequest>,
) -> ApiResult<Json<Value>> {
    let city = field(&req.city).ok_or_else(|| ApiError::BadRequest("City is required".to_string()))?;
    let user_id = claims.user_id()?;

    state
        .repository
        .update_city(user_id, &city)
        .await
        .map_err(|e| match e {
            storage::StorageError::NotFound => ApiError::BadRequest("User not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(json!({ "message": "City updated successfully", "city": city })))
}
