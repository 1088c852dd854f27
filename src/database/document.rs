use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::DatabaseError;

/// Fields owned by the store. They live in columns, never inside `data`.
pub const SYSTEM_FIELDS: &[&str] = &["id", "isActive", "createdAt", "updatedAt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Categories,
    CategoryPrices,
    CategoryItems,
    LaminateNumbers,
    VeneerSizes,
    UserTypes,
    Users,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Categories => "categories",
            Collection::CategoryPrices => "category_prices",
            Collection::CategoryItems => "category_items",
            Collection::LaminateNumbers => "laminate_numbers",
            Collection::VeneerSizes => "veneer_sizes",
            Collection::UserTypes => "user_types",
            Collection::Users => "users",
        }
    }

    pub fn all() -> &'static [Collection] {
        &[
            Collection::Categories,
            Collection::CategoryPrices,
            Collection::CategoryItems,
            Collection::LaminateNumbers,
            Collection::VeneerSizes,
            Collection::UserTypes,
            Collection::Users,
        ]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// One stored record: system columns plus a free-form JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Map<String, Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            data: strip_system_fields(data),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field lookup that sees system columns under their API names.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "isActive" => Some(Value::Bool(self.is_active)),
            "createdAt" => Some(Value::String(format_timestamp(&self.created_at))),
            "updatedAt" => Some(Value::String(format_timestamp(&self.updated_at))),
            _ => self.data.get(name).cloned(),
        }
    }

    /// Flat `{id, ...data, isActive, createdAt, updatedAt}` rendering.
    pub fn to_value(&self) -> Value {
        let mut out = Map::with_capacity(self.data.len() + SYSTEM_FIELDS.len());
        out.insert("id".to_string(), Value::String(self.id.to_string()));
        for (k, v) in &self.data {
            out.insert(k.clone(), v.clone());
        }
        out.insert("isActive".to_string(), Value::Bool(self.is_active));
        out.insert("createdAt".to_string(), Value::String(format_timestamp(&self.created_at)));
        out.insert("updatedAt".to_string(), Value::String(format_timestamp(&self.updated_at)));
        Value::Object(out)
    }

    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T, DatabaseError> {
        from_value(self.to_value())
    }
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, DatabaseError> {
    serde_json::from_value(value).map_err(|e| DatabaseError::InvalidDocument(e.to_string()))
}

/// Serialize an input struct into a document body.
pub fn into_data<T: Serialize>(input: &T) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(strip_system_fields(map)),
        Ok(other) => Err(DatabaseError::InvalidDocument(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(DatabaseError::InvalidDocument(e.to_string())),
    }
}

pub fn strip_system_fields(mut data: Map<String, Value>) -> Map<String, Value> {
    for field in SYSTEM_FIELDS {
        data.remove(*field);
    }
    data
}

pub fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.contains(&name)
}

/// RFC 3339 in UTC with microseconds, matching what PostgreSQL stores.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}
