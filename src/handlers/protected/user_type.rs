use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateUserType, UpdateUserType};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /user-type/create
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUserType>,
) -> ApiResult {
    let record = state.services.user_types.create(input).await?;
    ApiResponse::success("User type created successfully").record(&record)
}

/// POST /user-type/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.user_types.list(&query).await?;
    ApiResponse::success("User types fetched successfully").page(&page)
}

/// GET /user-type?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.user_types.get(query.parse()?).await?;
    ApiResponse::success("User type fetched successfully").record(&record)
}

/// POST /user-type/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateUserType>,
) -> ApiResult {
    let record = state.services.user_types.update(input).await?;
    ApiResponse::success("User type updated successfully").record(&record)
}

/// POST /user-type/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.user_types.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("User type {} successfully", verb)).record(&record)
}

/// GET /user-type/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.user_types.options().await?;
    ApiResponse::success("User type options fetched successfully").records(&options)
}
