use axum::{extract::State, Extension};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /auth/me - the account behind the current token
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult {
    let user = state
        .services
        .users
        .find_active(auth.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User account is inactive"))?;
    ApiResponse::success("User fetched successfully").record(&user)
}
