use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::category::CategoryService;
use super::combination;
use super::{has_active_reference, not_found};
use crate::database::models::{
    Category, CategoryPrice, CreateCategoryPrice, FieldValues, OptionItem, PriceItem, UpdateCategoryPrice,
};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Lookup, Predicate};

pub struct CategoryPriceService {
    repo: Repository<CategoryPrice>,
    categories: CategoryService,
    store: Arc<dyn DocumentStore>,
}

impl CategoryPriceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::CategoryPrices, store.clone()).with_lookup(Lookup::by_id(
                Collection::Categories,
                "categoryId",
                "name",
                "categoryName",
            )),
            categories: CategoryService::new(store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, category_id: Uuid, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::CategoryPrices)
            .field("categoryId", category_id.to_string())
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists("Price list already exists for this category"));
        }
        Ok(())
    }

    fn build_items(category: &Category, fields: &[String], field_values: &[FieldValues]) -> Vec<PriceItem> {
        combination::generate_items(fields, field_values, category.tax_rate, &category.tax_code)
    }

    /// Items that `create` would generate, without persisting anything.
    pub async fn generate(&self, input: CreateCategoryPrice) -> Result<Vec<PriceItem>, ApiError> {
        let category = self.categories.get(input.category_id).await?;
        let fields = input.fields.unwrap_or_else(|| category.fields.clone());
        Ok(Self::build_items(&category, &fields, &input.field_values))
    }

    pub async fn create(&self, mut input: CreateCategoryPrice) -> Result<CategoryPrice, ApiError> {
        let category = self.categories.require_active(input.category_id).await?;
        self.ensure_unique(category.id, None).await?;

        let fields = input.fields.take().unwrap_or_else(|| category.fields.clone());
        if input.items.is_none() {
            input.items = Some(Self::build_items(&category, &fields, &input.field_values));
        }
        input.fields = Some(fields);

        let price = self.repo.insert(&input).await?;
        info!(
            "Created price list {} for category {} with {} items",
            price.id,
            category.name,
            price.items.len()
        );
        Ok(price)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<CategoryPrice>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryPrice, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("Category price"))
    }

    /// Partial update. Changing the category, fields or field values without
    /// explicit items regenerates them, keeping prices of surviving names.
    pub async fn update(&self, mut input: UpdateCategoryPrice) -> Result<CategoryPrice, ApiError> {
        let current = self.get(input.id).await?;

        let category_id = input.category_id.unwrap_or(current.category_id);
        let category = if category_id != current.category_id {
            let category = self.categories.require_active(category_id).await?;
            if current.is_active {
                self.ensure_unique(category_id, Some(current.id)).await?;
            }
            category
        } else {
            self.categories.get(category_id).await?
        };

        let shape_changed =
            input.category_id.is_some() || input.fields.is_some() || input.field_values.is_some();
        if input.items.is_none() && shape_changed {
            let fields = input.fields.clone().unwrap_or_else(|| current.fields.clone());
            let field_values = input.field_values.clone().unwrap_or_else(|| current.field_values.clone());
            let regenerated = Self::build_items(&category, &fields, &field_values);
            input.items = Some(combination::preserve_prices(regenerated, &current.items));
        }

        Ok(self.repo.update(current.id, &input).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<CategoryPrice, ApiError> {
        let current = self.get(id).await?;
        if current.is_active {
            if has_active_reference(self.store.as_ref(), Collection::CategoryItems, "categoryPriceId", id).await? {
                return Err(ApiError::bad_request(
                    "Category price is used by active category items and cannot be deactivated",
                ));
            }
        } else {
            self.ensure_unique(current.category_id, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|p| OptionItem::new(p.id, p.category_name.unwrap_or_default()))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }

    /// The category's active price list, if any.
    pub async fn active_for_category(&self, category_id: Uuid) -> Result<Option<CategoryPrice>, ApiError> {
        let predicate = Predicate::eq("categoryId", Value::String(category_id.to_string())).active();
        Ok(self.repo.select_any(predicate, None).await?.into_iter().next())
    }
}
