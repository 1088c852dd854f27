use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{not_found, required};
use crate::auth::{AuthError, Password};
use crate::database::models::user::DEFAULT_ROLE;
use crate::database::models::{CreateUser, NewUser, OptionItem, UpdateUser, User};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository};
use crate::error::ApiError;
use crate::filter::{FilterOp, ListQuery, ListResult, Predicate};

fn normalize_email(email: &str) -> Result<String, ApiError> {
    Ok(required(email, "Email")?.to_lowercase())
}

fn role_or_default(role: Option<&str>) -> String {
    match role.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => DEFAULT_ROLE.to_string(),
    }
}

pub struct UserService {
    repo: Repository<User>,
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::Users, store.clone()).with_hidden(&["password"]),
            store,
        }
    }

    /// Emails are unique across active and inactive accounts.
    async fn ensure_unique(&self, email: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::Users)
            .field("email", email)
            .excluding(exclude)
            .include_inactive()
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists("User already exists"));
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let predicate = Predicate::all().with("email", FilterOp::IEq, Value::String(email.to_string()));
        Ok(self.repo.select_any(predicate, None).await?.into_iter().next())
    }

    pub async fn create(&self, input: CreateUser) -> Result<User, ApiError> {
        let email = normalize_email(&input.email)?;
        let name = required(&input.name, "Name")?;
        self.ensure_unique(&email, None).await?;

        let password = Password::new(&input.password)?;
        let record = NewUser {
            name,
            email,
            password: password.into_string(),
            role: role_or_default(input.role.as_deref()),
        };
        let user = self.repo.insert(&record).await?;
        info!("Created user {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Checks credentials; unknown emails still pay for one hash verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.find_by_email(&email).await? else {
            Password::verify_dummy(password);
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !Password::from_hash(user.password.clone()).verify(password) {
            warn!("Invalid password for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            return Err(AuthError::InactiveUser.into());
        }
        Ok(user)
    }

    /// The user behind a token, if the account still exists and is active.
    pub async fn find_active(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.repo.select_one(id).await?.filter(|u| u.is_active))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<User>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("User"))
    }

    pub async fn update(&self, input: UpdateUser) -> Result<User, ApiError> {
        let current = self.get(input.id).await?;
        let mut patch = Map::new();

        if let Some(name) = &input.name {
            patch.insert("name".into(), Value::String(required(name, "Name")?));
        }
        if let Some(email) = &input.email {
            let email = normalize_email(email)?;
            if email != current.email {
                self.ensure_unique(&email, Some(current.id)).await?;
            }
            patch.insert("email".into(), Value::String(email));
        }
        if let Some(password) = &input.password {
            let hash = Password::new(password)?;
            patch.insert("password".into(), Value::String(hash.into_string()));
        }
        if let Some(role) = &input.role {
            patch.insert("role".into(), Value::String(role_or_default(Some(role))));
        }

        Ok(self.repo.update_data(current.id, patch).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<User, ApiError> {
        let current = self.get(id).await?;
        if !current.is_active {
            self.ensure_unique(&current.email, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|u| OptionItem::new(u.id, u.name))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn ada() -> CreateUser {
        CreateUser {
            name: "Ada".into(),
            email: " Ada@Example.com ".into(),
            password: "correct horse".into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_hashes() {
        let user = service().create(ada()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, DEFAULT_ROLE);
        assert!(user.password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn email_is_unique_even_when_inactive() {
        let service = service();
        let user = service.create(ada()).await.unwrap();
        service.toggle_status(user.id).await.unwrap();
        let err = service.create(ada()).await.unwrap_err();
        assert_eq!(err, ApiError::exists("User already exists"));
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_status() {
        let service = service();
        let user = service.create(ada()).await.unwrap();

        let ok = service.authenticate("ADA@example.com", "correct horse").await.unwrap();
        assert_eq!(ok.id, user.id);

        let wrong = service.authenticate("ada@example.com", "wrong password").await.unwrap_err();
        assert_eq!(wrong.status_code(), 401);
        let unknown = service.authenticate("bob@example.com", "whatever1").await.unwrap_err();
        assert_eq!(unknown, wrong);

        service.toggle_status(user.id).await.unwrap();
        let inactive = service.authenticate("ada@example.com", "correct horse").await.unwrap_err();
        assert_eq!(inactive, ApiError::from(AuthError::InactiveUser));
        assert!(service.find_active(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rehashes_password() {
        let service = service();
        let user = service.create(ada()).await.unwrap();
        service
            .update(UpdateUser {
                id: user.id,
                name: None,
                email: None,
                password: Some("battery staple".into()),
                role: Some("admin".into()),
            })
            .await
            .unwrap();
        let updated = service.authenticate("ada@example.com", "battery staple").await.unwrap();
        assert_eq!(updated.role, "admin");
    }
}
