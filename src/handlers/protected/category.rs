use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateCategory, UpdateCategory};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /category/create
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> ApiResult {
    let record = state.services.categories.create(input).await?;
    ApiResponse::success("Category created successfully").record(&record)
}

/// POST /category/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.categories.list(&query).await?;
    ApiResponse::success("Categories fetched successfully").page(&page)
}

/// GET /category?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.categories.get(query.parse()?).await?;
    ApiResponse::success("Category fetched successfully").record(&record)
}

/// POST /category/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> ApiResult {
    let record = state.services.categories.update(input).await?;
    ApiResponse::success("Category updated successfully").record(&record)
}

/// POST /category/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.categories.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("Category {} successfully", verb)).record(&record)
}

/// GET /category/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.categories.options().await?;
    ApiResponse::success("Category options fetched successfully").records(&options)
}
