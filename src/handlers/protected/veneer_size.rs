use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateVeneerSize, UpdateVeneerSize};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /veneer-size/create
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateVeneerSize>,
) -> ApiResult {
    let record = state.services.veneer_sizes.create(input).await?;
    ApiResponse::success("Veneer size created successfully").record(&record)
}

/// POST /veneer-size/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.veneer_sizes.list(&query).await?;
    ApiResponse::success("Veneer sizes fetched successfully").page(&page)
}

/// GET /veneer-size?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.veneer_sizes.get(query.parse()?).await?;
    ApiResponse::success("Veneer size fetched successfully").record(&record)
}

/// POST /veneer-size/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateVeneerSize>,
) -> ApiResult {
    let record = state.services.veneer_sizes.update(input).await?;
    ApiResponse::success("Veneer size updated successfully").record(&record)
}

/// POST /veneer-size/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.veneer_sizes.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("Veneer size {} successfully", verb)).record(&record)
}

/// GET /veneer-size/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.veneer_sizes.options().await?;
    ApiResponse::success("Veneer size options fetched successfully").records(&options)
}
