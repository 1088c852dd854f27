use axum::{
    body::Bytes,
    extract::{Query, State},
};

use crate::database::models::{CreateLaminateNumbers, UpdateLaminateNumber};
use crate::handlers::{list_request, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::state::AppState;

/// POST /laminate-number/create - batch create, one outcome per requested item
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateLaminateNumbers>,
) -> ApiResult {
    let outcome = state.services.laminate_numbers.create_batch(input).await?;
    ApiResponse::batch(outcome, "laminate numbers")
}

/// POST /laminate-number/get/all
pub async fn list(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = state.list_query(&list_request(&body)?)?;
    let page = state.services.laminate_numbers.list(&query).await?;
    ApiResponse::success("Laminate numbers fetched successfully").page(&page)
}

/// GET /laminate-number?id=
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.laminate_numbers.get(query.parse()?).await?;
    ApiResponse::success("Laminate number fetched successfully").record(&record)
}

/// POST /laminate-number/update
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateLaminateNumber>,
) -> ApiResult {
    let record = state.services.laminate_numbers.update(input).await?;
    ApiResponse::success("Laminate number updated successfully").record(&record)
}

/// POST /laminate-number/toggle/status?id=
pub async fn toggle_status(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult {
    let record = state.services.laminate_numbers.toggle_status(query.parse()?).await?;
    let verb = if record.is_active { "activated" } else { "deactivated" };
    ApiResponse::success(format!("Laminate number {} successfully", verb)).record(&record)
}

/// GET /laminate-number/options
pub async fn options(State(state): State<AppState>) -> ApiResult {
    let options = state.services.laminate_numbers.options().await?;
    ApiResponse::success("Laminate number options fetched successfully").records(&options)
}
