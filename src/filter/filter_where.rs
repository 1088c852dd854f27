use serde_json::{Map, Value};
use tracing::warn;

use super::error::FilterError;
use super::types::{Condition, FilterOp, Predicate};

/// Translates a client filter body into a [`Predicate`].
///
/// Keys are field names. Values are either literals (array → `in`, anything
/// else → `eq`) or operator objects such as `{"contains": "oak"}`. Stale or
/// malformed entries are skipped with a warning so list endpoints keep working
/// when a client sends filter definitions the server no longer understands.
pub struct FilterWhere;

impl FilterWhere {
    pub fn translate(filter: Option<&Value>) -> Result<Predicate, FilterError> {
        let obj = match filter {
            None | Some(Value::Null) => return Ok(Predicate::all()),
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                return Err(FilterError::InvalidFilter(format!(
                    "filter must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        let mut predicate = Predicate::all();
        for (field, value) in obj {
            if !is_valid_field(field) {
                warn!("Ignoring filter on invalid field name {:?}", field);
                continue;
            }
            Self::parse_field(&mut predicate, field, value);
        }
        Ok(predicate)
    }

    fn parse_field(predicate: &mut Predicate, field: &str, value: &Value) {
        match value {
            Value::Object(ops) => {
                for (op_key, operand) in ops {
                    let Some(op) = FilterOp::parse(op_key) else {
                        warn!("Ignoring unknown filter operator {:?} on {}", op_key, field);
                        continue;
                    };
                    match Self::build_condition(field, op, operand) {
                        Ok(Some(condition)) => predicate.push(condition),
                        Ok(None) => {}
                        Err(e) => warn!("Ignoring filter on {}: {}", field, e),
                    }
                }
            }
            Value::Array(_) => predicate.push(Condition::new(field, FilterOp::In, value.clone())),
            _ => predicate.push(Condition::new(field, FilterOp::Eq, value.clone())),
        }
    }

    fn build_condition(field: &str, op: FilterOp, operand: &Value) -> Result<Option<Condition>, FilterError> {
        match op {
            FilterOp::In | FilterOp::Nin => match operand {
                Value::Array(_) => Ok(Some(Condition::new(field, op, operand.clone()))),
                other => Err(FilterError::InvalidOperatorData(format!(
                    "{} requires an array, got {}",
                    op.as_str(),
                    type_name(other)
                ))),
            },
            FilterOp::Between => Self::build_between(field, operand),
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => match operand {
                Value::String(s) if s.is_empty() => Ok(None),
                Value::String(_) => Ok(Some(Condition::new(field, op, operand.clone()))),
                Value::Number(n) => Ok(Some(Condition::new(field, op, Value::String(n.to_string())))),
                other => Err(FilterError::InvalidOperatorData(format!(
                    "{} requires a string, got {}",
                    op.as_str(),
                    type_name(other)
                ))),
            },
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte if operand.is_null() => Err(
                FilterError::InvalidOperatorData(format!("{} cannot compare with null", op.as_str())),
            ),
            FilterOp::IEq => Err(FilterError::UnsupportedOperator(op.as_str().to_string())),
            _ => Ok(Some(Condition::new(field, op, operand.clone()))),
        }
    }

    // `[lo, hi]` or `{from, to}`; a half-open object degrades to gte/lte.
    fn build_between(field: &str, operand: &Value) -> Result<Option<Condition>, FilterError> {
        match operand {
            Value::Array(bounds) if bounds.len() == 2 => {
                Ok(Some(Condition::new(field, FilterOp::Between, operand.clone())))
            }
            Value::Object(range) => {
                let from = non_null(range, "from");
                let to = non_null(range, "to");
                Ok(match (from, to) {
                    (Some(from), Some(to)) => Some(Condition::new(
                        field,
                        FilterOp::Between,
                        Value::Array(vec![from.clone(), to.clone()]),
                    )),
                    (Some(from), None) => Some(Condition::new(field, FilterOp::Gte, from.clone())),
                    (None, Some(to)) => Some(Condition::new(field, FilterOp::Lte, to.clone())),
                    (None, None) => None,
                })
            }
            _ => Err(FilterError::InvalidOperatorData(
                "$between requires [from, to] or {from, to}".to_string(),
            )),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_field(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn non_null<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
