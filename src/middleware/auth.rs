use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{AuthError, Claims};
use crate::error::ApiError;
use crate::state::AppState;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Authenticated caller, placed in request extensions by [`auth_guard`]
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AuthError::MissingToken),
        None => Err(AuthError::InvalidToken(
            "Authorization header must use Bearer token format".to_string(),
        )),
    }
}

/// Issue a fresh access token from `x-refresh-token` when the refresh flow is
/// enabled and the token's user is still active.
async fn refresh_access(state: &AppState, headers: &HeaderMap) -> Result<(AuthUser, String), AuthError> {
    if !state.keys.refresh_enabled() {
        return Err(AuthError::RefreshDisabled);
    }
    let token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let claims = state.keys.verify_refresh(token)?;

    let user = state
        .services
        .users
        .find_active(claims.sub)
        .await
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?
        .ok_or(AuthError::InactiveUser)?;

    let access = state.keys.issue_access(user.id, &user.email, &user.role)?;
    debug!("Reissued access token for user {}", user.id);
    Ok((
        AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
        },
        access,
    ))
}

/// Bearer-token guard for every non-public route.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.config.security.is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let verified = bearer_token(request.headers()).and_then(|token| state.keys.verify_access(token));
    let (user, reissued) = match verified {
        Ok(claims) => (AuthUser::from(claims), None),
        Err(err @ (AuthError::ExpiredToken | AuthError::InvalidToken(_) | AuthError::WrongTokenType)) => {
            match refresh_access(&state, request.headers()).await {
                Ok((user, token)) => (user, Some(token)),
                Err(refresh_err) => {
                    if refresh_err != AuthError::RefreshDisabled {
                        warn!("Refresh rejected for {}: {}", request.uri().path(), refresh_err);
                    }
                    warn!("Rejected token for {}: {}", request.uri().path(), err);
                    return Err(err.into());
                }
            }
        }
        Err(err) => {
            warn!("Rejected request for {}: {}", request.uri().path(), err);
            return Err(err.into());
        }
    };

    request.extensions_mut().insert(user);
    let mut response = next.run(request).await;

    if let Some(token) = reissued {
        let value = HeaderValue::from_str(&token).map_err(|e| ApiError::internal(e.to_string()))?;
        response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
    }
    Ok(response)
}
