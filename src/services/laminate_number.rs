use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{not_found, required, BatchOutcome};
use crate::database::models::{
    CreateLaminateNumbers, LaminateNumber, NewLaminateNumber, OptionItem, UpdateLaminateNumber,
};
use crate::database::{Collection, DocumentStore, DuplicateCheck, Repository, Sequence};
use crate::error::ApiError;
use crate::filter::{ListQuery, ListResult, Predicate};

/// (company, catalog, finish, name) identity of a laminate number
struct Identity<'a> {
    company_id: &'a str,
    catalog_id: &'a str,
    finish_id: &'a str,
    name: &'a str,
}

pub struct LaminateNumberService {
    repo: Repository<LaminateNumber>,
    store: Arc<dyn DocumentStore>,
}

impl LaminateNumberService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(Collection::LaminateNumbers, store.clone()),
            store,
        }
    }

    async fn ensure_unique(&self, identity: &Identity<'_>, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken = DuplicateCheck::new(Collection::LaminateNumbers)
            .field("companyId", identity.company_id)
            .field("catalogId", identity.catalog_id)
            .field("finishId", identity.finish_id)
            .field("name", identity.name)
            .excluding(exclude)
            .exists(self.store.as_ref())
            .await?;
        if taken {
            return Err(ApiError::exists(format!("Laminate number {} already exists", identity.name)));
        }
        Ok(())
    }

    /// Create one record per requested name.
    ///
    /// Names repeated in the request or already active fail individually. The
    /// survivors get consecutive postfixes from one sequence reservation, in
    /// request order.
    pub async fn create_batch(&self, input: CreateLaminateNumbers) -> Result<BatchOutcome<LaminateNumber>, ApiError> {
        let company_id = required(&input.company_id, "Company")?;
        let catalog_id = required(&input.catalog_id, "Catalog")?;
        let finish_id = required(&input.finish_id, "Finish")?;

        let names: Vec<String> = input
            .requested_names()
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(ApiError::validation("At least one name is required"));
        }

        let mut seen = HashSet::new();
        let repeated: Vec<bool> = names.iter().map(|n| !seen.insert(n.to_lowercase())).collect();

        let checks = names.iter().zip(&repeated).map(|(name, repeated)| {
            let identity = Identity {
                company_id: &company_id,
                catalog_id: &catalog_id,
                finish_id: &finish_id,
                name,
            };
            async move {
                if *repeated {
                    return Err(ApiError::exists(format!("{} is repeated in the request", name)));
                }
                self.ensure_unique(&identity, None).await
            }
        });
        let checked = join_all(checks).await;

        let accepted = checked.iter().filter(|r| r.is_ok()).count() as u64;
        let first = if accepted > 0 {
            self.store.next_sequence(&Sequence::LAMINATE_NUMBER, accepted).await?
        } else {
            0
        };

        let mut next = first;
        let inserts = names.iter().zip(checked).map(|(name, check)| {
            let postfix = match check {
                Ok(()) => {
                    next += 1;
                    Ok(next - 1)
                }
                Err(err) => Err(err),
            };
            let record = postfix.map(|postfix| NewLaminateNumber {
                company_id: company_id.clone(),
                catalog_id: catalog_id.clone(),
                finish_id: finish_id.clone(),
                name: name.clone(),
                code: Sequence::LAMINATE_NUMBER.format(postfix),
                postfix,
            });
            async move {
                let result = match record {
                    Ok(record) => self.repo.insert(&record).await.map_err(ApiError::from),
                    Err(err) => Err(err),
                };
                (name.clone(), result)
            }
        });
        let outcome = BatchOutcome::from_results(join_all(inserts).await);
        info!(
            "Laminate number batch: {} created, {} failed",
            outcome.summary.succeeded, outcome.summary.failed
        );
        Ok(outcome)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<LaminateNumber>, ApiError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<LaminateNumber, ApiError> {
        self.repo.select_404(id).await.map_err(not_found("Laminate number"))
    }

    pub async fn update(&self, mut input: UpdateLaminateNumber) -> Result<LaminateNumber, ApiError> {
        let current = self.get(input.id).await?;
        if let Some(name) = &input.name {
            input.name = Some(required(name, "Name")?);
        }
        let identity = Identity {
            company_id: input.company_id.as_deref().unwrap_or(&current.company_id),
            catalog_id: input.catalog_id.as_deref().unwrap_or(&current.catalog_id),
            finish_id: input.finish_id.as_deref().unwrap_or(&current.finish_id),
            name: input.name.as_deref().unwrap_or(&current.name),
        };
        if current.is_active {
            self.ensure_unique(&identity, Some(current.id)).await?;
        }
        Ok(self.repo.update(current.id, &input).await?)
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<LaminateNumber, ApiError> {
        let current = self.get(id).await?;
        if !current.is_active {
            let identity = Identity {
                company_id: &current.company_id,
                catalog_id: &current.catalog_id,
                finish_id: &current.finish_id,
                name: &current.name,
            };
            self.ensure_unique(&identity, Some(id)).await?;
        }
        Ok(self.repo.set_active(id, !current.is_active).await?)
    }

    pub async fn options(&self) -> Result<Vec<OptionItem>, ApiError> {
        let mut items: Vec<OptionItem> = self
            .repo
            .select_any(Predicate::all().active(), None)
            .await?
            .into_iter()
            .map(|l| OptionItem::new(l.id, format!("{} - {}", l.code, l.name)))
            .collect();
        OptionItem::sort(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn request(names: &[&str]) -> CreateLaminateNumbers {
        CreateLaminateNumbers {
            company_id: "c1".into(),
            catalog_id: "k1".into(),
            finish_id: "f1".into(),
            names: Some(names.iter().map(|n| n.to_string()).collect()),
            name: None,
        }
    }

    #[tokio::test]
    async fn continues_from_existing_max_postfix() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        store
            .insert(
                Collection::LaminateNumbers,
                json!({ "companyId": "c0", "catalogId": "k0", "finishId": "f0", "name": "old", "code": "N007", "postfix": 7 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
        let service = LaminateNumberService::new(store);
        let outcome = service.create_batch(request(&["A", "B", "C"])).await.unwrap();
        let codes: Vec<(&str, i64)> = outcome.records.iter().map(|r| (r.code.as_str(), r.postfix)).collect();
        assert_eq!(codes, vec![("N008", 8), ("N009", 9), ("N010", 10)]);
    }

    #[tokio::test]
    async fn duplicates_fail_individually_without_consuming_postfixes() {
        let service = LaminateNumberService::new(Arc::new(MemoryStore::new()));
        service.create_batch(request(&["A"])).await.unwrap();
        let outcome = service.create_batch(request(&["a", "B", "b"])).await.unwrap();
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.failed, 2);
        assert_eq!(outcome.records[0].code, "N002");

        let all_dupes = service.create_batch(request(&["A", "B"])).await.unwrap();
        assert!(all_dupes.all_duplicates());
    }

    #[tokio::test]
    async fn empty_request_is_invalid() {
        let service = LaminateNumberService::new(Arc::new(MemoryStore::new()));
        let err = service.create_batch(request(&["  "])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
