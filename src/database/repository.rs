use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::document::{from_value, into_data, Collection};
use super::store::DocumentStore;
use super::DatabaseError;
use crate::filter::{ListQuery, ListResult, Lookup, Page, Pipeline, Predicate, SortSpec, Stage};

/// Typed access to one collection. Lookups registered here are applied to
/// every read so joined display fields are always populated.
pub struct Repository<T> {
    collection: Collection,
    store: Arc<dyn DocumentStore>,
    lookups: Vec<Lookup>,
    hidden: &'static [&'static str],
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection,
            store: self.store.clone(),
            lookups: self.lookups.clone(),
            hidden: self.hidden,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: DeserializeOwned + Send,
{
    pub fn new(collection: Collection, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection,
            store,
            lookups: vec![],
            hidden: &[],
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// Fields clients may neither filter nor sort on.
    pub fn with_hidden(mut self, fields: &'static [&'static str]) -> Self {
        self.hidden = fields;
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    fn extra_stages(&self) -> Vec<Stage> {
        self.lookups.iter().cloned().map(Stage::Lookup).collect()
    }

    pub async fn insert<I: Serialize + Sync>(&self, input: &I) -> Result<T, DatabaseError> {
        self.insert_data(into_data(input)?).await
    }

    pub async fn insert_data(&self, data: Map<String, Value>) -> Result<T, DatabaseError> {
        let doc = self.store.insert(self.collection, data).await?;
        if self.lookups.is_empty() {
            doc.into_entity()
        } else {
            self.select_404(doc.id).await
        }
    }

    /// Fetch by id regardless of `isActive`.
    pub async fn select_one(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let pipeline = Pipeline::matching(Predicate::eq("id", Value::String(id.to_string())));
        let pipeline = self
            .extra_stages()
            .into_iter()
            .fold(pipeline, |p, stage| p.push(stage))
            .push(Stage::Limit(1));
        match self.store.aggregate(self.collection, &pipeline).await?.into_iter().next() {
            Some(value) => from_value(value).map(Some),
            None => Ok(None),
        }
    }

    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))
    }

    /// Partial update; only the serialized fields of `patch` are written.
    pub async fn update<I: Serialize + Sync>(&self, id: Uuid, patch: &I) -> Result<T, DatabaseError> {
        self.update_data(id, into_data(patch)?).await
    }

    pub async fn update_data(&self, id: Uuid, patch: Map<String, Value>) -> Result<T, DatabaseError> {
        self.store
            .update(self.collection, id, patch)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))?;
        self.select_404(id).await
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<T, DatabaseError> {
        self.store
            .set_active(self.collection, id, active)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))?;
        self.select_404(id).await
    }

    /// Page of records plus the unpaginated total, fetched concurrently.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<T>, DatabaseError> {
        let pipeline = if self.hidden.is_empty() {
            query.pipeline(self.extra_stages())
        } else {
            query.clone().without_fields(self.hidden).pipeline(self.extra_stages())
        };
        let (rows, total) = tokio::try_join!(
            self.store.aggregate(self.collection, &pipeline),
            self.store.count(self.collection, &pipeline),
        )?;
        let records = rows.into_iter().map(from_value).collect::<Result<Vec<T>, _>>()?;
        Ok(ListResult {
            records,
            total_records: total,
        })
    }

    pub async fn select_any(&self, predicate: Predicate, sort: Option<SortSpec>) -> Result<Vec<T>, DatabaseError> {
        let pipeline = match sort {
            Some(sort) => Pipeline::assemble(predicate, sort, Page::unbounded(), self.extra_stages()),
            None => self
                .extra_stages()
                .into_iter()
                .fold(Pipeline::matching(predicate), |p, stage| p.push(stage)),
        };
        self.store
            .aggregate(self.collection, &pipeline)
            .await?
            .into_iter()
            .map(from_value)
            .collect()
    }

    pub async fn count(&self, predicate: Predicate) -> Result<u64, DatabaseError> {
        self.store.count(self.collection, &Pipeline::matching(predicate)).await
    }

    pub async fn exists(&self, predicate: Predicate) -> Result<bool, DatabaseError> {
        Ok(self.count(predicate).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::filter::ListRequest;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Named {
        id: Uuid,
        name: String,
        is_active: bool,
    }

    fn repo() -> Repository<Named> {
        Repository::new(Collection::UserTypes, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn insert_and_fetch_by_id() {
        let repo = repo();
        let created = repo.insert(&json!({ "name": "Admin" })).await.unwrap();
        let fetched = repo.select_404(created.id).await.unwrap();
        assert_eq!(fetched.name, "Admin");
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let err = repo().select_404(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn inactive_records_are_listed_out_but_fetchable() {
        let repo = repo();
        let a = repo.insert(&json!({ "name": "A" })).await.unwrap();
        repo.insert(&json!({ "name": "B" })).await.unwrap();
        repo.set_active(a.id, false).await.unwrap();

        let query = ListQuery::from_request(&ListRequest::default(), None).unwrap();
        let page = repo.list(&query).await.unwrap();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.records[0].name, "B");
        assert!(!repo.select_404(a.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn hidden_fields_are_ignored_in_lists() {
        let repo = repo().with_hidden(&["secret"]);
        repo.insert(&json!({ "name": "A", "secret": "s3cr3t" })).await.unwrap();
        repo.insert(&json!({ "name": "B", "secret": "other" })).await.unwrap();

        let req = ListRequest {
            filter: Some(json!({ "secret": { "startsWith": "s3" } })),
            sort_by: Some("secret".into()),
            ..Default::default()
        };
        let page = repo.list(&ListQuery::from_request(&req, None).unwrap()).await.unwrap();
        assert_eq!(page.total_records, 2);
        let names: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
