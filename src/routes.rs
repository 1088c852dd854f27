use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Uri,
    },
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{auth_guard, sanitize_internal_errors, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};
use crate::state::AppState;

/// The full HTTP surface. Everything except `/` passes the auth guard, which
/// lets allow-listed paths through.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_request_size_bytes);

    Router::new()
        .merge(auth_routes())
        .merge(entity_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_guard))
        .route("/", get(handlers::public::health::root))
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), sanitize_internal_errors))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::protected::session;
    use handlers::public::{auth, health};

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(session::me))
}

fn entity_routes() -> Router<AppState> {
    use handlers::protected::*;

    Router::new()
        .merge(crud(
            "/category",
            post(category::create),
            post(category::list),
            get(category::get),
            post(category::update),
            post(category::toggle_status),
            get(category::options),
        ))
        .merge(crud(
            "/category-price",
            post(category_price::create),
            post(category_price::list),
            get(category_price::get),
            post(category_price::update),
            post(category_price::toggle_status),
            get(category_price::options),
        ))
        .route("/category-price/generate", post(category_price::generate))
        .merge(crud(
            "/category-item",
            post(category_item::create),
            post(category_item::list),
            get(category_item::get),
            post(category_item::update),
            post(category_item::toggle_status),
            get(category_item::options),
        ))
        .merge(crud(
            "/laminate-number",
            post(laminate_number::create),
            post(laminate_number::list),
            get(laminate_number::get),
            post(laminate_number::update),
            post(laminate_number::toggle_status),
            get(laminate_number::options),
        ))
        .merge(crud(
            "/veneer-size",
            post(veneer_size::create),
            post(veneer_size::list),
            get(veneer_size::get),
            post(veneer_size::update),
            post(veneer_size::toggle_status),
            get(veneer_size::options),
        ))
        .merge(crud(
            "/user-type",
            post(user_type::create),
            post(user_type::list),
            get(user_type::get),
            post(user_type::update),
            post(user_type::toggle_status),
            get(user_type::options),
        ))
        .merge(crud(
            "/user",
            post(user::create),
            post(user::list),
            get(user::get),
            post(user::update),
            post(user::toggle_status),
            get(user::options),
        ))
}

/// The six-route set every entity exposes under `prefix`.
fn crud(
    prefix: &str,
    create: MethodRouter<AppState>,
    list: MethodRouter<AppState>,
    get_one: MethodRouter<AppState>,
    update: MethodRouter<AppState>,
    toggle: MethodRouter<AppState>,
    options: MethodRouter<AppState>,
) -> Router<AppState> {
    Router::new()
        .route(prefix, get_one)
        .route(&format!("{}/create", prefix), create)
        .route(&format!("{}/get/all", prefix), list)
        .route(&format!("{}/update", prefix), update)
        .route(&format!("{}/toggle/status", prefix), toggle)
        .route(&format!("{}/options", prefix), options)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(REFRESH_TOKEN_HEADER),
        ])
        .expose_headers([HeaderName::from_static(ACCESS_TOKEN_HEADER)])
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::route_not_found(format!("Route {} {} not found", method, uri.path()))
}
