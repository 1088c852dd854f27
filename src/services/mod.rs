pub mod category;
pub mod category_item;
pub mod category_price;
pub mod combination;
pub mod laminate_number;
pub mod user;
pub mod user_type;
pub mod veneer_size;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{Collection, DatabaseError, DocumentStore};
use crate::error::ApiError;
use crate::filter::{Pipeline, Predicate};

pub use category::CategoryService;
pub use category_item::CategoryItemService;
pub use category_price::CategoryPriceService;
pub use laminate_number::LaminateNumberService;
pub use user::UserService;
pub use user_type::UserTypeService;
pub use veneer_size::VeneerSizeService;

/// All entity services, built once per process over a shared store.
pub struct Services {
    pub categories: CategoryService,
    pub category_prices: CategoryPriceService,
    pub category_items: CategoryItemService,
    pub laminate_numbers: LaminateNumberService,
    pub veneer_sizes: VeneerSizeService,
    pub user_types: UserTypeService,
    pub users: UserService,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            categories: CategoryService::new(store.clone()),
            category_prices: CategoryPriceService::new(store.clone()),
            category_items: CategoryItemService::new(store.clone()),
            laminate_numbers: LaminateNumberService::new(store.clone()),
            veneer_sizes: VeneerSizeService::new(store.clone()),
            user_types: UserTypeService::new(store.clone()),
            users: UserService::new(store),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub name: String,
    pub message: String,
    #[serde(skip)]
    pub exists: bool,
}

/// Per-item outcome counts of a batch create
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub summary: BatchSummary,
    pub records: Vec<T>,
}

impl<T> BatchOutcome<T> {
    pub fn from_results(results: Vec<(String, Result<T, ApiError>)>) -> Self {
        let mut summary = BatchSummary::default();
        let mut records = Vec::new();
        for (name, result) in results {
            match result {
                Ok(record) => {
                    summary.succeeded += 1;
                    records.push(record);
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.failures.push(BatchFailure {
                        name,
                        message: err.message().to_string(),
                        exists: err.is_exists(),
                    });
                }
            }
        }
        Self { summary, records }
    }

    /// Nothing created and every failure was a duplicate.
    pub fn all_duplicates(&self) -> bool {
        self.summary.succeeded == 0
            && self.summary.failed > 0
            && self.summary.failures.iter().all(|f| f.exists)
    }
}

/// Maps a storage miss to "<entity> not found".
pub(crate) fn not_found(entity: &'static str) -> impl Fn(DatabaseError) -> ApiError {
    move |err| match err {
        DatabaseError::NotFound(_) => ApiError::not_found(format!("{} not found", entity)),
        other => other.into(),
    }
}

/// Whether an active record of `collection` points at `id` through `field`.
pub(crate) async fn has_active_reference(
    store: &dyn DocumentStore,
    collection: Collection,
    field: &str,
    id: Uuid,
) -> Result<bool, ApiError> {
    let predicate = Predicate::eq(field, serde_json::Value::String(id.to_string())).active();
    Ok(store.count(collection, &Pipeline::matching(predicate)).await? > 0)
}

/// Trimmed, non-empty text or a validation error naming the field.
pub(crate) fn required(value: &str, label: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_outcome_counts_and_flags_duplicates() {
        let outcome: BatchOutcome<u32> = BatchOutcome::from_results(vec![
            ("a".into(), Err(ApiError::exists("a exists"))),
            ("b".into(), Err(ApiError::exists("b exists"))),
        ]);
        assert_eq!(outcome.summary.failed, 2);
        assert!(outcome.all_duplicates());

        let mixed: BatchOutcome<u32> = BatchOutcome::from_results(vec![
            ("a".into(), Ok(1)),
            ("b".into(), Err(ApiError::bad_request("bad"))),
        ]);
        assert_eq!(mixed.summary.succeeded, 1);
        assert_eq!(mixed.records, vec![1]);
        assert!(!mixed.all_duplicates());
    }

    #[test]
    fn required_trims() {
        assert_eq!(required("  Oak ", "Name").unwrap(), "Oak");
        assert_eq!(required("   ", "Name").unwrap_err(), ApiError::validation("Name is required"));
    }
}
