use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::category::CategoryService;
use super::not_found;
use crate::database::models::{CreateVeneerSize, NewVeneerSize, OptionItem, UpdateVeneerSize, VeneerSize};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository, Sequence};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Lookup, Predicate};

pub struct VeneerSizeService {
    repo: Repository<VeneerSize>,
    categories: CategoryService,
    store: Arc<dyn DocumentStore>,
}

impl VeneerSizeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::VeneerSizes, store.clone()).with_lookup(Lookup::by_id(
                Collection::Categories,
                "categoryId",
                "name",
                "categoryName",
            )),
            categories: CategoryService::new(store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, height: f64, width: f64, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::VeneerSizes)
            .field("height", height)
            .field("width", width)
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists(format!("Veneer size {}x{} already exists", height, width)));
        }
        Ok(())
    }

    pub async fn create(&self, input: CreateVeneerSize) -> Result<VeneerSize, ApiError> {
        self.categories.require_active(input.category_id).await?;
        self.ensure_unique(input.height, input.width, None).await?;

        let postfix = self.store.next_sequence(&Sequence::VENEER_SIZE, 1).await?;
        let record = NewVeneerSize {
            height: input.height,
            width: input.width,
            category_id: input.category_id,
            code: Sequence::VENEER_SIZE.format(postfix),
            postfix,
        };
        let size = self.repo.insert(&record).await?;
        info!("Created veneer size {} ({})", size.code, size.label());
        Ok(size)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<VeneerSize>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<VeneerSize, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("Veneer size"))
    }

    pub async fn update(&self, input: UpdateVeneerSize) -> Result<VeneerSize, ApiError> {
        let current = self.get(input.id).await?;
        if let Some(category_id) = input.category_id.filter(|c| *c != current.category_id) {
            self.categories.require_active(category_id).await?;
        }
        if current.is_active && (input.height.is_some() || input.width.is_some()) {
            let height = input.height.unwrap_or(current.height);
            let width = input.width.unwrap_or(current.width);
            self.ensure_unique(height, width, Some(current.id)).await?;
        }
        Ok(self.repo.update(current.id, &input).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<VeneerSize, ApiError> {
        let current = self.get(id).await?;
        if !current.is_active {
            self.ensure_unique(current.height, current.width, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|v| OptionItem::new(v.id, v.label()))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateCategory;
    use crate::database::MemoryStore;

    async fn setup() -> (VeneerSizeService, Uuid) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let category = CategoryService::new(store.clone())
            .create(CreateCategory {
                name: "Veneer".into(),
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
        (VeneerSizeService::new(store), category.id)
    }

    #[tokio::test]
    async fn codes_are_sequential_and_sizes_unique() {
        let (service, category_id) = setup().await;
        let a = service
            .create(CreateVeneerSize { height: 8.0, width: 4.0, category_id })
            .await
            .unwrap();
        let b = service
            .create(CreateVeneerSize { height: 7.0, width: 3.0, category_id })
            .await
            .unwrap();
        assert_eq!((a.code.as_str(), b.code.as_str()), ("V001", "V002"));
        assert_eq!(a.category_name.as_deref(), Some("Veneer"));

        let err = service
            .create(CreateVeneerSize { height: 8.0, width: 4.0, category_id })
            .await
            .unwrap_err();
        assert!(err.is_exists());
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (service, _) = setup().await;
        let err = service
            .create(CreateVeneerSize { height: 1.0, width: 1.0, category_id: Uuid::now_v7() })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::not_found("Category not found"));
    }
}
