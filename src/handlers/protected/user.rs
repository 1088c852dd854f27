use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateUser, UpdateUser};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /user/create
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> ApiResult {
    let record = state.services.users.create(input).await?;
    ApiResponse::success("User created successfully").record(&record)
}

/// POST /user/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.users.list(&query).await?;
    ApiResponse::success("Users fetched successfully").page(&page)
}

/// GET /user?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.users.get(query.parse()?).await?;
    ApiResponse::success("User fetched successfully").record(&record)
}

/// POST /user/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> ApiResult {
    let record = state.services.users.update(input).await?;
    ApiResponse::success("User updated successfully").record(&record)
}

/// POST /user/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.users.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("User {} successfully", verb)).record(&record)
}

/// GET /user/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.users.options().await?;
    ApiResponse::success("User options fetched successfully").records(&options)
}
