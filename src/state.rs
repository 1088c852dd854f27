use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::filter::{ListQuery, ListRequest};
use crate::error::ApiError;
use crate::services::Services;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub keys: Arc<JwtKeys>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let keys = JwtKeys::from_config(&config.security);
        Self {
            services: Arc::new(Services::new(store.clone())),
            keys: Arc::new(keys),
            config: Arc::new(config),
            store,
        }
    }

    /// Turn a `/get/all` body into a query, applying the configured page cap.
    pub fn list_query(&self, request: &ListRequest) -> Result<ListQuery, ApiError> {
        Ok(ListQuery::from_request(request, self.config.filter.max_page_size)?)
    }
}
