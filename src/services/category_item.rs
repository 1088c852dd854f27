use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::category::CategoryService;
use super::category_price::CategoryPriceService;
use super::{combination, not_found, BatchOutcome};
use crate::database::models::{
    Category, CategoryItem, CategoryPrice, CreateCategoryItems, NewCategoryItem, OptionItem, PriceItem,
    UpdateCategoryItem,
};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Lookup, Predicate};

pub struct CategoryItemService {
    repo: Repository<CategoryItem>,
    categories: CategoryService,
    prices: CategoryPriceService,
    store: Arc<dyn DocumentStore>,
}

impl CategoryItemService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::CategoryItems, store.clone()).with_lookup(Lookup::by_id(
                Collection::Categories,
                "categoryId",
                "name",
                "categoryName",
            )),
            categories: CategoryService::new(store.clone()),
            prices: CategoryPriceService::new(store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, category_id: Uuid, item_name: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::CategoryItems)
            .field("categoryId", category_id.to_string())
            .field("itemName", item_name)
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists(format!("Category item {} already exists", item_name)));
        }
        Ok(())
    }

    /// Create one item per priced entry matching the requested field values.
    /// Items are created concurrently and fail independently.
    pub async fn create_batch(&self, input: CreateCategoryItems) -> Result<BatchOutcome<CategoryItem>, ApiError> {
        let category = self.categories.require_active(input.category_id).await?;
        let price = self
            .prices
            .active_for_category(category.id)
            .await?
            .ok_or_else(|| ApiError::bad_request("No active price list for this category"))?;

        let matched = combination::match_items(&price.items, &price.fields, &input.field_values);
        if matched.is_empty() {
            return Err(ApiError::bad_request("No priced items match the requested field values"));
        }

        let mut seen = HashSet::new();
        let futures = matched.iter().map(|item| {
            let first = seen.insert(item.name.to_lowercase());
            let category = &category;
            let price = &price;
            async move {
                let result = if first {
                    self.create_one(category, price, item).await
                } else {
                    Err(ApiError::exists(format!("{} is repeated in the request", item.name)))
                };
                (item.name.clone(), result)
            }
        });
        let outcome = BatchOutcome::from_results(join_all(futures).await);
        info!(
            "Category item batch for {}: {} created, {} failed",
            category.name, outcome.summary.succeeded, outcome.summary.failed
        );
        Ok(outcome)
    }

    async fn create_one(
        &self,
        category: &Category,
        price: &CategoryPrice,
        item: &PriceItem,
    ) -> Result<CategoryItem, ApiError> {
        self.ensure_unique(category.id, &item.name, None).await?;
        let record = NewCategoryItem {
            category_id: category.id,
            category_price_id: price.id,
            tax_rate: item.tax_rate,
            tax_code: item.tax_code.clone(),
            item_name: item.name.clone(),
            purchase_price: item.purchase_price,
        };
        Ok(self.repo.insert(&record).await?)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<CategoryItem>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryItem, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("Category item"))
    }

    pub async fn update(&self, mut input: UpdateCategoryItem) -> Result<CategoryItem, ApiError> {
        let current = self.get(input.id).await?;
        if let Some(name) = &input.item_name {
            let name = super::required(name, "Item name")?;
            if current.is_active {
                self.ensure_unique(current.category_id, &name, Some(current.id)).await?;
            }
            input.item_name = Some(name);
        }
        Ok(self.repo.update(current.id, &input).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<CategoryItem, ApiError> {
        let current = self.get(id).await?;
        if !current.is_active {
            self.ensure_unique(current.category_id, &current.item_name, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|i| OptionItem::new(i.id, i.item_name))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateCategory, CreateCategoryPrice, FieldValues};
    use crate::database::MemoryStore;

    fn fv(field: &str, values: &[&str]) -> FieldValues {
        FieldValues {
            field: field.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    async fn setup() -> (CategoryItemService, Uuid) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let category = CategoryService::new(store.clone())
            .create(CreateCategory {
                name: "Doors".into(),
                tax_rate: 12.0,
                tax_code: "4418".into(),
                fields: vec!["Color".into(), "Size".into()],
                profit: 0.0,
                scheme: 0.0,
                commission: 0.0,
                discount: 0.0,
            })
            .await
            .unwrap();
        CategoryPriceService::new(store.clone())
            .create(CreateCategoryPrice {
                category_id: category.id,
                fields: None,
                field_values: vec![fv("Color", &["Red", "Blue"]), fv("Size", &["S", "M"])],
                items: None,
            })
            .await
            .unwrap();
        (CategoryItemService::new(store), category.id)
    }

    #[tokio::test]
    async fn batch_creates_matching_items() {
        let (service, category_id) = setup().await;
        let outcome = service
            .create_batch(CreateCategoryItems {
                category_id,
                field_values: vec![fv("Color", &["Red"]), fv("Size", &["S", "M", "XL"])],
            })
            .await
            .unwrap();
        assert_eq!(outcome.summary.succeeded, 2);
        let names: Vec<&str> = outcome.records.iter().map(|r| r.item_name.as_str()).collect();
        assert_eq!(names, vec!["Red, S", "Red, M"]);
        assert_eq!(outcome.records[0].category_name.as_deref(), Some("Doors"));
        assert_eq!(outcome.records[0].tax_rate, 12.0);
    }

    #[tokio::test]
    async fn repeating_a_batch_reports_duplicates() {
        let (service, category_id) = setup().await;
        let input = CreateCategoryItems {
            category_id,
            field_values: vec![fv("Color", &["Blue"]), fv("Size", &["M"])],
        };
        service.create_batch(input.clone()).await.unwrap();
        let again = service.create_batch(input).await.unwrap();
        assert!(again.all_duplicates());
    }

    #[tokio::test]
    async fn category_without_price_is_rejected() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let category = CategoryService::new(store.clone())
            .create(CreateCategory {
                name: "Bare".into(),
                tax_rate: 0.0,
                tax_code: String::new(),
                fields: vec![],
                profit: 0.0,
                scheme: 0.0,
                commission: 0.0,
                discount: 0.0,
            })
            .await
            .unwrap();
        let err = CategoryItemService::new(store)
            .create_batch(CreateCategoryItems {
                category_id: category.id,
                field_values: vec![fv("Color", &["Red"])],
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
