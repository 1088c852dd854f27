use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::document::{Collection, Document};
use super::sequence::Sequence;
use super::DatabaseError;
use crate::filter::Pipeline;

/// Document storage shared by every entity service.
///
/// Implementations must agree on filter semantics: `MemoryStore` backs the
/// integration tests while `PgStore` backs production.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn insert(&self, collection: Collection, data: Map<String, Value>) -> Result<Document, DatabaseError>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError>;

    /// Shallow-merge `patch` into the body and bump `updatedAt`.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, DatabaseError>;

    async fn set_active(&self, collection: Collection, id: Uuid, active: bool) -> Result<Option<Document>, DatabaseError>;

    /// Run a pipeline, returning flat documents including joined fields.
    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Value>, DatabaseError>;

    /// Number of records produced by the pipeline, ignoring its pagination.
    async fn count(&self, collection: Collection, pipeline: &Pipeline) -> Result<u64, DatabaseError>;

    /// Atomically reserve `count` consecutive values; returns the first one.
    async fn next_sequence(&self, sequence: &Sequence, count: u64) -> Result<i64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn migrate(&self) -> Result<(), DatabaseError>;
}
