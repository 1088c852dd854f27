use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, INTERNAL_ERROR_MESSAGE};
use crate::filter::ListResult;
use crate::services::BatchOutcome;
use crate::state::AppState;

/// Uniform envelope: `{isSuccess, statusCode, message?, record?, records?, totalRecords?}`
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Map<String, Value>,
}

fn to_value<T: Serialize>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| {
        tracing::error!("Failed to serialize response data: {}", e);
        ApiError::internal(format!("Failed to serialize response data: {}", e))
    })
}

impl ApiResponse {
    /// 200 with a message
    pub fn success(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(message.into()));
        Self { status, body }
    }

    pub fn record<T: Serialize>(mut self, record: &T) -> Result<Self, ApiError> {
        self.body.insert("record".into(), to_value(record)?);
        Ok(self)
    }

    pub fn records<T: Serialize>(mut self, records: &[T]) -> Result<Self, ApiError> {
        self.body.insert("records".into(), to_value(&records)?);
        Ok(self)
    }

    /// A list page: `records` plus `totalRecords`
    pub fn page<T: Serialize>(self, page: &ListResult<T>) -> Result<Self, ApiError> {
        let mut response = self.records(&page.records)?;
        response
            .body
            .insert("totalRecords".into(), Value::from(page.total_records));
        Ok(response)
    }

    /// Outcome of a batch create. Nothing created and only duplicates is the
    /// exists error; nothing created for any other reason is a 400 envelope
    /// that still carries the summary.
    pub fn batch<T: Serialize>(outcome: BatchOutcome<T>, created: &str) -> ApiResult {
        let summary = &outcome.summary;
        if summary.succeeded == 0 {
            if outcome.all_duplicates() {
                let message = match summary.failures.as_slice() {
                    [only] => only.message.clone(),
                    _ => format!("All {} already exist", created),
                };
                return Err(ApiError::exists(message));
            }
            return ApiResponse::with_status(StatusCode::BAD_REQUEST, format!("No {} were created", created))
                .record(summary)?
                .records(&outcome.records);
        }

        let message = if summary.failed == 0 {
            format!("{} {} created successfully", summary.succeeded, created)
        } else {
            format!("{} {} created, {} failed", summary.succeeded, created, summary.failed)
        };
        ApiResponse::success(message)
            .record(summary)?
            .records(&outcome.records)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();
        envelope.insert("isSuccess".into(), Value::Bool(!(self.status.is_client_error() || self.status.is_server_error())));
        envelope.insert("statusCode".into(), Value::from(self.status.as_u16()));
        envelope.extend(self.body);
        (self.status, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;

/// Swap the text of an internal error for a generic message.
pub fn sanitize_internal(response: Response) -> Response {
    match response.extensions().get::<ApiError>() {
        Some(ApiError::Internal(message)) => {
            tracing::error!("Internal error hidden from client: {}", message);
            ApiError::internal(INTERNAL_ERROR_MESSAGE).into_response()
        }
        _ => response,
    }
}

/// Applies [`sanitize_internal`] when running in production.
pub async fn sanitize_internal_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if state.config.is_production() {
        sanitize_internal(response)
    } else {
        response
    }
}
