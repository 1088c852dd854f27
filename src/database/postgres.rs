use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, FromRow, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::document::{strip_system_fields, Collection, Document};
use super::query_builder::{QueryBuilder, SqlResult};
use super::sequence::Sequence;
use super::store::DocumentStore;
use super::DatabaseError;
use crate::config::DatabaseConfig;
use crate::filter::Pipeline;

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    data: sqlx::types::Json<Map<String, Value>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            data: row.data.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed document store: one JSONB table per collection.
pub struct PgStore {
    pool: PgPool,
    log_sql: bool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig, log_sql: bool) -> Result<Self, DatabaseError> {
        let url = url::Url::parse(&config.url).map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    // Timestamps rendered through to_jsonb must carry +00:00.
                    conn.execute("SET TIME ZONE 'UTC'").await?;
                    Ok(())
                })
            })
            .connect(url.as_str())
            .await?;

        info!(
            "Connected to PostgreSQL at {}:{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(5432)
        );
        Ok(Self { pool, log_sql })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn log(&self, sql: &SqlResult) {
        if self.log_sql {
            debug!(query = %sql.query, params = ?sql.params, "compiled pipeline");
        }
    }

    async fn fetch_document(&self, query: &str, id: Uuid, extra: Vec<Value>) -> Result<Option<Document>, DatabaseError> {
        let mut q = sqlx::query_as::<_, DocumentRow>(query).bind(id);
        for v in extra {
            q = q.bind(sqlx::types::Json(v));
        }
        Ok(q.fetch_optional(&self.pool).await?.map(Document::from))
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, collection: Collection, data: Map<String, Value>) -> Result<Document, DatabaseError> {
        let doc = Document::new(data);
        let query = format!(
            "INSERT INTO \"{}\" (id, data, is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
            collection.table_name()
        );
        sqlx::query(&query)
            .bind(doc.id)
            .bind(sqlx::types::Json(&doc.data))
            .bind(doc.is_active)
            .bind(doc.created_at)
            .bind(doc.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let query = format!(
            "SELECT id, data, is_active, created_at, updated_at FROM \"{}\" WHERE id = $1",
            collection.table_name()
        );
        self.fetch_document(&query, id, vec![]).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, DatabaseError> {
        let query = format!(
            "UPDATE \"{}\" SET data = data || $2, updated_at = now() WHERE id = $1 \
             RETURNING id, data, is_active, created_at, updated_at",
            collection.table_name()
        );
        let patch = Value::Object(strip_system_fields(patch));
        self.fetch_document(&query, id, vec![patch]).await
    }

    async fn set_active(&self, collection: Collection, id: Uuid, active: bool) -> Result<Option<Document>, DatabaseError> {
        let query = format!(
            "UPDATE \"{}\" SET is_active = $2, updated_at = now() WHERE id = $1 \
             RETURNING id, data, is_active, created_at, updated_at",
            collection.table_name()
        );
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Value>, DatabaseError> {
        let sql = QueryBuilder::select(collection, pipeline)?;
        self.log(&sql);
        let rows = sql
            .bind_as(sqlx::query_as::<_, DocumentRow>(&sql.query))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| Document::from(r).to_value()).collect())
    }

    async fn count(&self, collection: Collection, pipeline: &Pipeline) -> Result<u64, DatabaseError> {
        let sql = QueryBuilder::count(collection, pipeline)?;
        self.log(&sql);
        let row = sql.bind(sqlx::query(&sql.query)).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn next_sequence(&self, sequence: &Sequence, count: u64) -> Result<i64, DatabaseError> {
        let query = format!(
            "INSERT INTO counters (key, value) \
             VALUES ($1, (SELECT COALESCE(MAX((data ->> $3::text)::bigint), 0) FROM \"{}\") + $2) \
             ON CONFLICT (key) DO UPDATE SET value = counters.value + $2 \
             RETURNING value",
            sequence.collection.table_name()
        );
        let count = count as i64;
        let row = sqlx::query(&query)
            .bind(sequence.key)
            .bind(count)
            .bind(sequence.field)
            .fetch_one(&self.pool)
            .await?;
        let last: i64 = row.try_get("value")?;
        Ok(last - count + 1)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        for collection in Collection::all() {
            let table = collection.table_name();
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (\
                 id uuid PRIMARY KEY, \
                 data jsonb NOT NULL DEFAULT '{{}}'::jsonb, \
                 is_active boolean NOT NULL DEFAULT true, \
                 created_at timestamptz NOT NULL DEFAULT now(), \
                 updated_at timestamptz NOT NULL DEFAULT now())"
            );
            self.pool.execute(ddl.as_str()).await?;
            let index = format!(
                "CREATE INDEX IF NOT EXISTS \"{table}_active_created_idx\" ON \"{table}\" (is_active, created_at)"
            );
            self.pool.execute(index.as_str()).await?;
            info!("Ensured table {}", table);
        }
        self.pool
            .execute("CREATE TABLE IF NOT EXISTS counters (key text PRIMARY KEY, value bigint NOT NULL)")
            .await?;
        self.pool
            .execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS users_email_idx ON users (lower(data ->> 'email'))",
            )
            .await?;
        Ok(())
    }
}
