use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{has_active_reference, not_found, required};
use crate::database::models::{Category, CreateCategory, OptionItem, UpdateCategory};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Predicate};

pub struct CategoryService {
    repo: Repository<Category>,
    store: Arc<dyn DocumentStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::Categories, store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, name: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::Categories)
            .field("name", name)
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists("Category already exists"));
        }
        Ok(())
    }

    pub async fn create(&self, mut input: CreateCategory) -> Result<Category, ApiError> {
        input.name = required(&input.name, "Category name")?;
        self.ensure_unique(&input.name, None).await?;
        let category = self.repo.insert(&input).await?;
        info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<Category>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("Category"))
    }

    pub async fn update(&self, mut input: UpdateCategory) -> Result<Category, ApiError> {
        let current = self.get(input.id).await?;
        if let Some(name) = &input.name {
            let name = required(name, "Category name")?;
            if current.is_active {
                self.ensure_unique(&name, Some(current.id)).await?;
            }
            input.name = Some(name);
        }
        Ok(self.repo.update(current.id, &input).await?)
    }

    /// Flip `isActive`. Deactivation is refused while active prices, items or
    /// veneer sizes still reference the category.
    pub async fn toggle_status(&self, id: Uuid) -> Result<Category, ApiError> {
        let current = self.get(id).await?;
        if current.is_active {
            for (collection, label) in [
                (Collection::CategoryPrices, "category prices"),
                (Collection::CategoryItems, "category items"),
                (Collection::VeneerSizes, "veneer sizes"),
            ] {
                if has_active_reference(self.store.as_ref(), collection, "categoryId", id).await? {
                    return Err(ApiError::bad_request(format!(
                        "Category is used by active {} and cannot be deactivated",
                        label
                    )));
                }
            }
        } else {
            self.ensure_unique(&current.name, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|c| OptionItem::new(c.id, c.name))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }

    /// Active category or a 400 naming it.
    pub async fn require_active(&self, id: Uuid) -> Result<Category, ApiError> {
        let category = self.get(id).await?;
        if !category.is_active {
            return Err(ApiError::bad_request("Category is inactive"));
        }
        Ok(category)
    }
}
