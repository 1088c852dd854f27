use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /health - 503 when the store does not answer
pub async fn health(State(state): State<AppState>) -> ApiResult {
    let now = Utc::now();
    match state.store.health_check().await {
        Ok(()) => ApiResponse::success("Service is healthy").record(&json!({
            "status": "ok",
            "database": state.store.backend(),
            "timestamp": now,
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiResponse::with_status(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable").record(&json!({
                "status": "degraded",
                "database": state.store.backend(),
                "timestamp": now,
            }))
        }
    }
}

/// GET / - service banner
pub async fn root() -> ApiResult {
    ApiResponse::success("Laminate catalog API").record(&json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth/login, /auth/register (public), /auth/me",
            "health": "/health (public)",
            "entities": [
                "/category", "/category-price", "/category-item", "/laminate-number",
                "/veneer-size", "/user-type", "/user"
            ],
            "actions": "/create, /get/all, ?id=, /update, /toggle/status, /options",
        }
    }))
}
