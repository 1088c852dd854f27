use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::document::{strip_system_fields, Collection, Document};
use super::sequence::Sequence;
use super::store::DocumentStore;
use super::DatabaseError;
use crate::filter::{Condition, FilterOp, Lookup, Pipeline, Predicate, SortDirection, SortSpec, Stage};

type Row = Map<String, Value>;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<Collection, Vec<Document>>,
    counters: HashMap<&'static str, i64>,
}

impl MemoryState {
    fn docs(&self, collection: Collection) -> &[Document] {
        self.collections.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }

    fn doc_mut(&mut self, collection: Collection, id: Uuid) -> Option<&mut Document> {
        self.collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
    }
}

/// In-process store selected by `DATABASE_URL=memory://`.
///
/// Evaluates pipelines with the same semantics the PostgreSQL compiler emits:
/// JSONB type ordering with strings compared bytewise, missing fields only
/// equal to `null`, missing values sorted after present ones when ascending.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(state: &MemoryState, collection: Collection, pipeline: &Pipeline) -> Vec<Row> {
        let mut rows: Vec<Row> = state
            .docs(collection)
            .iter()
            .filter_map(|d| match d.to_value() {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();

        for stage in pipeline.stages() {
            match stage {
                Stage::Match(predicate) => rows.retain(|row| matches_predicate(row, predicate)),
                Stage::Lookup(lookup) => {
                    for row in rows.iter_mut() {
                        let label = resolve_lookup(state, lookup, row);
                        row.insert(lookup.as_field.clone(), label);
                    }
                }
                Stage::Sort(sort) => rows.sort_by(|a, b| compare_rows(a, b, sort)),
                Stage::Skip(n) => {
                    let n = (*n as usize).min(rows.len());
                    rows.drain(..n);
                }
                Stage::Limit(n) => rows.truncate(*n as usize),
            }
        }
        rows
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: Collection, data: Map<String, Value>) -> Result<Document, DatabaseError> {
        let doc = Document::new(data);
        let mut state = self.state.write().await;
        state.collections.entry(collection).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.docs(collection).iter().find(|d| d.id == id).cloned())
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.doc_mut(collection, id).map(|doc| {
            doc.data.extend(strip_system_fields(patch));
            doc.updated_at = Utc::now();
            doc.clone()
        }))
    }

    async fn set_active(&self, collection: Collection, id: Uuid, active: bool) -> Result<Option<Document>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.doc_mut(collection, id).map(|doc| {
            doc.is_active = active;
            doc.updated_at = Utc::now();
            doc.clone()
        }))
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Value>, DatabaseError> {
        debug!("memory aggregate on {}: {}", collection, pipeline.describe());
        let state = self.state.read().await;
        Ok(Self::run(&state, collection, pipeline)
            .into_iter()
            .map(Value::Object)
            .collect())
    }

    async fn count(&self, collection: Collection, pipeline: &Pipeline) -> Result<u64, DatabaseError> {
        let state = self.state.read().await;
        Ok(Self::run(&state, collection, &pipeline.count_pipeline()).len() as u64)
    }

    async fn next_sequence(&self, sequence: &Sequence, count: u64) -> Result<i64, DatabaseError> {
        let mut state = self.state.write().await;
        let seed = state
            .docs(sequence.collection)
            .iter()
            .filter_map(|d| d.data.get(sequence.field).and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        let counter = state.counters.entry(sequence.key).or_insert(seed);
        let first = *counter + 1;
        *counter += count as i64;
        Ok(first)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

fn resolve_lookup(state: &MemoryState, lookup: &Lookup, row: &Row) -> Value {
    let Some(local) = row.get(&lookup.local_field).filter(|v| !v.is_null()) else {
        return Value::Null;
    };
    state
        .docs(lookup.from)
        .iter()
        .find(|d| {
            d.field(&lookup.foreign_field)
                .map(|f| compare_json(&f, local) == Ordering::Equal)
                .unwrap_or(false)
        })
        .and_then(|d| d.field(&lookup.label_field))
        .unwrap_or(Value::Null)
}

pub(crate) fn matches_predicate(row: &Row, predicate: &Predicate) -> bool {
    predicate.conditions.iter().all(|c| matches_condition(row, c))
}

fn matches_condition(row: &Row, condition: &Condition) -> bool {
    let operand = &condition.value;
    let Some(value) = row.get(&condition.field) else {
        return condition.op == FilterOp::Eq && operand.is_null();
    };
    match condition.op {
        FilterOp::Eq if operand.is_null() => value.is_null(),
        FilterOp::Eq => json_eq(value, operand),
        FilterOp::Ne if operand.is_null() => !value.is_null(),
        FilterOp::Ne => !json_eq(value, operand),
        FilterOp::Gt => compare_json(value, operand) == Ordering::Greater,
        FilterOp::Gte => compare_json(value, operand) != Ordering::Less,
        FilterOp::Lt => compare_json(value, operand) == Ordering::Less,
        FilterOp::Lte => compare_json(value, operand) != Ordering::Greater,
        FilterOp::In => operand
            .as_array()
            .map(|items| items.iter().any(|item| json_eq(value, item)))
            .unwrap_or(false),
        FilterOp::Nin => operand
            .as_array()
            .map(|items| !items.iter().any(|item| json_eq(value, item)))
            .unwrap_or(false),
        FilterOp::Between => match operand.as_array().map(Vec::as_slice) {
            Some([lo, hi]) => {
                compare_json(value, lo) != Ordering::Less && compare_json(value, hi) != Ordering::Greater
            }
            _ => false,
        },
        FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => {
            let (Some(text), Some(needle)) = (scalar_text(value), operand.as_str()) else {
                return false;
            };
            let text = text.to_lowercase();
            let needle = needle.to_lowercase();
            match condition.op {
                FilterOp::Contains => text.contains(&needle),
                FilterOp::StartsWith => text.starts_with(&needle),
                _ => text.ends_with(&needle),
            }
        }
        FilterOp::IEq => match (value.as_str(), operand.as_str()) {
            (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => false,
        },
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    compare_json(a, b) == Ordering::Equal
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// JSONB ordering: null < string < number < boolean < array < object.
pub(crate) fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y)
                .map(|(a, b)| compare_json(a, b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|a, b| a.0.cmp(b.0));
            ys.sort_by(|a, b| a.0.cmp(b.0));
            xs.iter()
                .zip(ys.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_json(va, vb)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Missing values sort last ascending and first descending; id breaks ties.
fn compare_rows(a: &Row, b: &Row, sort: &SortSpec) -> Ordering {
    let primary = match (a.get(&sort.field), b.get(&sort.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_json(x, y),
    };
    let primary = match sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| {
        let id = |row: &Row| row.get("id").and_then(Value::as_str).map(str::to_string);
        id(a).cmp(&id(b))
    })
}
