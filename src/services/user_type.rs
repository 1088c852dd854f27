use std::sync::Arc;
use uuid::Uuid;

use super::{not_found, required};
use crate::database::models::{CreateUserType, OptionItem, UpdateUserType, UserType};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Predicate};

pub struct UserTypeService {
    repo: Repository<UserType>,
    store: Arc<dyn DocumentStore>,
}

impl UserTypeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::UserTypes, store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, name: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::UserTypes)
            .field("name", name)
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists("User type already exists"));
        }
        Ok(())
    }

    pub async fn create(&self, mut input: CreateUserType) -> Result<UserType, ApiError> {
        input.name = required(&input.name, "User type name")?;
        self.ensure_unique(&input.name, None).await?;
        Ok(self.repo.insert(&input).await?)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<UserType>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<UserType, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("User type"))
    }

    pub async fn update(&self, mut input: UpdateUserType) -> Result<UserType, ApiError> {
        let current = self.get(input.id).await?;
        if let Some(name) = &input.name {
            let name = required(name, "User type name")?;
            if current.is_active {
                self.ensure_unique(&name, Some(current.id)).await?;
            }
            input.name = Some(name);
        }
        Ok(self.repo.update(current.id, &input).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<UserType, ApiError> {
        let current = self.get(id).await?;
        if !current.is_active {
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
            .map(|t| OptionItem::new(t.id, t.name))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }
}
