use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    /// Case-insensitive equality; only produced internally by the duplicate checker.
    IEq,
}

impl FilterOp {
    /// Parse a client operator name. Case-insensitive, optional leading `$`.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().trim_start_matches('$').to_ascii_lowercase();
        Some(match key.as_str() {
            "eq" | "equals" | "is" => FilterOp::Eq,
            "ne" | "neq" | "notequals" => FilterOp::Ne,
            "gt" | "greaterthan" => FilterOp::Gt,
            "gte" | "greaterthanorequal" => FilterOp::Gte,
            "lt" | "lessthan" => FilterOp::Lt,
            "lte" | "lessthanorequal" => FilterOp::Lte,
            "in" => FilterOp::In,
            "nin" | "notin" => FilterOp::Nin,
            "between" | "inrange" => FilterOp::Between,
            "contains" | "like" => FilterOp::Contains,
            "startswith" => FilterOp::StartsWith,
            "endswith" => FilterOp::EndsWith,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Ne => "$ne",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::In => "$in",
            FilterOp::Nin => "$nin",
            FilterOp::Between => "$between",
            FilterOp::Contains => "$contains",
            FilterOp::StartsWith => "$startsWith",
            FilterOp::EndsWith => "$endsWith",
            FilterOp::IEq => "$ieq",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

/// Conjunction of conditions. No conditions matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn with(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.push(Condition::new(field, op, value));
        self
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::all().with(field, FilterOp::Eq, value)
    }

    pub fn and(mut self, other: Predicate) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn active(self) -> Self {
        self.with("isActive", FilterOp::Eq, Value::Bool(true))
    }

    /// Mongo-style rendering for logs.
    pub fn to_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        for condition in &self.conditions {
            let entry = out
                .entry(condition.field.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(ops) = entry {
                ops.insert(condition.op.as_str().to_string(), condition.value.clone());
            }
        }
        Value::Object(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn sign(&self) -> i64 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// `{field: 1}` or `{field: -1}`
    pub fn to_value(&self) -> Value {
        json!({ self.field.clone(): self.direction.sign() })
    }
}

/// Body of every `POST .../get/all` request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub order: Option<String>,
    pub filter: Option<Value>,
    #[serde(default, deserialize_with = "loose_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "loose_int")]
    pub page_size: Option<i64>,
}

/// Paginated list result: the page plus the unpaginated match count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub records: Vec<T>,
    pub total_records: u64,
}

// Clients send page numbers and sort directions as either strings or numbers.
fn loose_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
