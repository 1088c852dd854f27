use serde_json::Value;
use uuid::Uuid;

use super::document::Collection;
use super::store::DocumentStore;
use super::DatabaseError;
use crate::filter::{FilterOp, Pipeline, Predicate, Stage};

/// Existence check for a record matching all fields case-insensitively,
/// excluding the record being edited.
#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    pub collection: Collection,
    pub exclude_id: Option<Uuid>,
    pub fields: Vec<(String, Value)>,
    pub active_only: bool,
}

impl DuplicateCheck {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            exclude_id: None,
            fields: vec![],
            active_only: true,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    /// Include inactive records, for globally unique fields such as email.
    pub fn include_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub fn predicate(&self) -> Predicate {
        let mut predicate = Predicate::all();
        for (field, value) in &self.fields {
            predicate = match value {
                Value::String(s) => predicate.with(field.as_str(), FilterOp::IEq, Value::String(s.trim().to_string())),
                other => predicate.with(field.as_str(), FilterOp::Eq, other.clone()),
            };
        }
        if let Some(id) = self.exclude_id {
            predicate = predicate.with("id", FilterOp::Ne, Value::String(id.to_string()));
        }
        if self.active_only {
            predicate = predicate.active();
        }
        predicate
    }

    pub async fn exists(&self, store: &dyn DocumentStore) -> Result<bool, DatabaseError> {
        let pipeline = Pipeline::matching(self.predicate()).push(Stage::Limit(1));
        Ok(!store.aggregate(self.collection, &pipeline).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use serde_json::json;

    async fn store_with(name: &str) -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let doc = store
            .insert(Collection::UserTypes, json!({ "name": name }).as_object().cloned().unwrap())
            .await
            .unwrap();
        (store, doc.id)
    }

    #[tokio::test]
    async fn matches_case_insensitively() {
        let (store, _) = store_with("Admin").await;
        let check = DuplicateCheck::new(Collection::UserTypes).field("name", " ADMIN ");
        assert!(check.exists(&store).await.unwrap());
    }

    #[tokio::test]
    async fn excludes_own_id() {
        let (store, id) = store_with("Admin").await;
        let check = DuplicateCheck::new(Collection::UserTypes)
            .field("name", "admin")
            .excluding(Some(id));
        assert!(!check.exists(&store).await.unwrap());
    }

    #[tokio::test]
    async fn ignores_inactive_unless_asked() {
        let (store, id) = store_with("Admin").await;
        store.set_active(Collection::UserTypes, id, false).await.unwrap();
        let check = DuplicateCheck::new(Collection::UserTypes).field("name", "admin");
        assert!(!check.exists(&store).await.unwrap());
        assert!(check.include_inactive().exists(&store).await.unwrap());
    }

    #[tokio::test]
    async fn numeric_fields_use_equality() {
        let store = MemoryStore::new();
        store
            .insert(Collection::VeneerSizes, json!({ "height": 8, "width": 4 }).as_object().cloned().unwrap())
            .await
            .unwrap();
        let same = DuplicateCheck::new(Collection::VeneerSizes).field("height", 8.0).field("width", 4);
        assert!(same.exists(&store).await.unwrap());
        let other = DuplicateCheck::new(Collection::VeneerSizes).field("height", 8).field("width", 5);
        assert!(!other.exists(&store).await.unwrap());
    }
}
