use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::database::models::{CreateUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: User,
}

/// POST /auth/login
pub async fn login(State(state): State<AppState>, ValidatedJson(input): ValidatedJson<LoginRequest>) -> ApiResult {
    let user = state.services.users.authenticate(&input.email, &input.password).await?;
    let access_token = state.keys.issue_access(user.id, &user.email, &user.role)?;
    let refresh_token = state.keys.issue_refresh(user.id, &user.email, &user.role)?;
    info!("User {} logged in", user.id);

    ApiResponse::success("Login successful").record(&LoginResponse {
        access_token,
        refresh_token,
        user,
    })
}

/// POST /auth/register - self-registration always gets the default role
pub async fn register(State(state): State<AppState>, ValidatedJson(mut input): ValidatedJson<CreateUser>) -> ApiResult {
    if !state.config.security.allow_registration {
        return Err(ApiError::bad_request("Registration is disabled"));
    }
    input.role = None;
    let user = state.services.users.create(input).await?;
    ApiResponse::success("User registered successfully").record(&user)
}
