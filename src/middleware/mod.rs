pub mod auth;
pub mod response;
pub mod validated_json;

pub use auth::{auth_guard, AuthUser, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};
pub use response::{sanitize_internal_errors, ApiResponse, ApiResult};
pub use validated_json::ValidatedJson;
