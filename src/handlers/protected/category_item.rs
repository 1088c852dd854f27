use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateCategoryItems, UpdateCategoryItem};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /category-item/create - batch create, one outcome per requested item
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCategoryItems>,
) -> ApiResult {
    let outcome = state.services.category_items.create_batch(input).await?;
    ApiResponse::batch(outcome, "category items")
}

/// POST /category-item/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.category_items.list(&query).await?;
    ApiResponse::success("Category items fetched successfully").page(&page)
}

/// GET /category-item?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.category_items.get(query.parse()?).await?;
    ApiResponse::success("Category item fetched successfully").record(&record)
}

/// POST /category-item/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateCategoryItem>,
) -> ApiResult {
    let record = state.services.category_items.update(input).await?;
    ApiResponse::success("Category item updated successfully").record(&record)
}

/// POST /category-item/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.category_items.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("Category item {} successfully", verb)).record(&record)
}

/// GET /category-item/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.category_items.options().await?;
    ApiResponse::success("Category item options fetched successfully").records(&options)
}
