use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateCategoryPrice, UpdateCategoryPrice};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /category-price/create
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCategoryPrice>,
) -> ApiResult {
    let record = state.services.category_prices.create(input).await?;
    ApiResponse::success("Category price created successfully").record(&record)
}

/// POST /category-price/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.category_prices.list(&query).await?;
    ApiResponse::success("Category prices fetched successfully").page(&page)
}

/// GET /category-price?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.category_prices.get(query.parse()?).await?;
    ApiResponse::success("Category price fetched successfully").record(&record)
}

/// POST /category-price/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateCategoryPrice>,
) -> ApiResult {
    let record = state.services.category_prices.update(input).await?;
    ApiResponse::success("Category price updated successfully").record(&record)
}

/// POST /category-price/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.category_prices.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("Category price {} successfully", verb)).record(&record)
}

/// GET /category-price/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.category_prices.options().await?;
    ApiResponse::success("Category price options fetched successfully").records(&options)
}

/// POST /category-price/generate - preview line items without saving
pub async fn generate(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCategoryPrice>,
) -> ApiResult {
    let items = state.services.category_prices.generate(input).await?;
    ApiResponse::success(format!("{} items generated", items.len())).records(&items)
}
