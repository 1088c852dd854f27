use serde_json::Value;
use sqlx::postgres::PgArguments;

use super::document::{is_system_field, Collection};
use super::DatabaseError;
use crate::filter::{Condition, FilterOp, Lookup, Pipeline, SortSpec, Stage};

const COLUMNS: &str = "d.id, d.data, d.is_active, d.created_at, d.updated_at";

/// Bind value for a compiled statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Json(Value),
    Text(String),
    BigInt(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl SqlResult {
    pub fn bind<'q>(
        &'q self,
        mut q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        for p in &self.params {
            q = match p {
                SqlParam::Json(v) => q.bind(sqlx::types::Json(v)),
                SqlParam::Text(s) => q.bind(s),
                SqlParam::BigInt(i) => q.bind(*i),
            };
        }
        q
    }

    pub fn bind_as<'q, O>(
        &'q self,
        mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
    where
        O: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        for p in &self.params {
            q = match p {
                SqlParam::Json(v) => q.bind(sqlx::types::Json(v)),
                SqlParam::Text(s) => q.bind(s),
                SqlParam::BigInt(i) => q.bind(*i),
            };
        }
        q
    }
}

/// One SELECT level. Stages that cannot extend the current level wrap it as a
/// subquery aliased `d`, so every level exposes the same five columns.
#[derive(Default)]
struct Level {
    from: String,
    projections: Vec<(usize, String)>,
    joins: Vec<String>,
    conditions: Vec<String>,
    order: Option<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl Level {
    fn is_paged(&self) -> bool {
        self.order.is_some() || self.offset.is_some() || self.limit.is_some()
    }

    fn render(&self) -> String {
        let select = if self.projections.is_empty() {
            COLUMNS.to_string()
        } else {
            let pairs: Vec<String> = self
                .projections
                .iter()
                .map(|(key, expr)| format!("${}::text, {}", key, expr))
                .collect();
            format!(
                "d.id, d.data || jsonb_build_object({}) AS data, d.is_active, d.created_at, d.updated_at",
                pairs.join(", ")
            )
        };
        let mut sql = format!("SELECT {} FROM {}", select, self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT ${}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET ${}", offset));
        }
        sql
    }
}

/// Compiles a [`Pipeline`] into parameterised PostgreSQL over the
/// `(id, data jsonb, is_active, created_at, updated_at)` table layout.
///
/// Field names and values are always bind parameters; only table names, which
/// come from [`Collection`], are interpolated.
pub struct QueryBuilder {
    params: Vec<SqlParam>,
    joins: usize,
}

impl QueryBuilder {
    pub fn select(collection: Collection, pipeline: &Pipeline) -> Result<SqlResult, DatabaseError> {
        let mut builder = Self { params: vec![], joins: 0 };
        let query = builder.compile(collection, pipeline)?;
        Ok(SqlResult { query, params: builder.params })
    }

    pub fn count(collection: Collection, pipeline: &Pipeline) -> Result<SqlResult, DatabaseError> {
        let mut builder = Self { params: vec![], joins: 0 };
        let inner = builder.compile(collection, &pipeline.count_pipeline())?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM ({}) c", inner),
            params: builder.params,
        })
    }

    fn compile(&mut self, collection: Collection, pipeline: &Pipeline) -> Result<String, DatabaseError> {
        let mut level = Level {
            from: format!("\"{}\" d", collection.table_name()),
            ..Default::default()
        };

        for stage in pipeline.stages() {
            match stage {
                Stage::Match(predicate) => {
                    if level.is_paged() || !level.joins.is_empty() {
                        level = Self::wrap(level);
                    }
                    for condition in &predicate.conditions {
                        let sql = self.condition(condition)?;
                        level.conditions.push(sql);
                    }
                }
                Stage::Lookup(lookup) => {
                    if level.is_paged() {
                        level = Self::wrap(level);
                    }
                    self.lookup(&mut level, lookup);
                }
                Stage::Sort(sort) => {
                    if level.is_paged() || !level.joins.is_empty() {
                        level = Self::wrap(level);
                    }
                    level.order = Some(self.order_by(sort));
                }
                Stage::Skip(n) => {
                    if level.offset.is_some() || level.limit.is_some() {
                        level = Self::wrap(level);
                    }
                    level.offset = Some(self.param(SqlParam::BigInt(i64::try_from(*n).unwrap_or(i64::MAX))));
                }
                Stage::Limit(n) => {
                    if level.limit.is_some() {
                        level = Self::wrap(level);
                    }
                    level.limit = Some(self.param(SqlParam::BigInt(i64::try_from(*n).unwrap_or(i64::MAX))));
                }
            }
        }
        Ok(level.render())
    }

    fn wrap(level: Level) -> Level {
        Level {
            from: format!("({}) d", level.render()),
            ..Default::default()
        }
    }

    fn lookup(&mut self, level: &mut Level, lookup: &Lookup) {
        self.joins += 1;
        let alias = format!("j{}", self.joins);
        let foreign = self.field_expr(&alias, &lookup.foreign_field);
        let local = self.field_expr("d", &lookup.local_field);
        level.joins.push(format!(
            "LEFT JOIN \"{}\" {} ON {} = {}",
            lookup.from.table_name(),
            alias,
            foreign,
            local
        ));
        let key = self.param(SqlParam::Text(lookup.as_field.clone()));
        let label = self.field_expr(&alias, &lookup.label_field);
        level.projections.push((key, label));
    }

    fn order_by(&mut self, sort: &SortSpec) -> String {
        let dir = sort.direction.to_sql();
        let expr = match sort.field.as_str() {
            "id" => "d.id".to_string(),
            "isActive" => "d.is_active".to_string(),
            "createdAt" => "d.created_at".to_string(),
            "updatedAt" => "d.updated_at".to_string(),
            field => {
                // JSONB would compare strings under the database collation;
                // rank by type, then compare strings bytewise.
                let n = self.param(SqlParam::Text(field.to_string()));
                let value = format!("(d.data -> ${}::text)", n);
                return format!(
                    "CASE jsonb_typeof({v}) WHEN 'null' THEN 0 WHEN 'string' THEN 1 WHEN 'number' THEN 2 \
                     WHEN 'boolean' THEN 3 WHEN 'array' THEN 4 WHEN 'object' THEN 5 END {d}, \
                     (CASE WHEN jsonb_typeof({v}) = 'string' THEN {v} #>> '{{}}' END) COLLATE \"C\" {d}, \
                     {v} {d}, d.id ASC",
                    v = value,
                    d = dir
                );
            }
        };
        format!("{} {}, d.id ASC", expr, dir)
    }

    /// JSONB expression for a field on `alias`.
    fn field_expr(&mut self, alias: &str, field: &str) -> String {
        if is_system_field(field) {
            let column = match field {
                "id" => "id",
                "isActive" => "is_active",
                "createdAt" => "created_at",
                _ => "updated_at",
            };
            format!("to_jsonb({}.{})", alias, column)
        } else {
            let n = self.param(SqlParam::Text(field.to_string()));
            format!("({}.data -> ${}::text)", alias, n)
        }
    }

    fn condition(&mut self, condition: &Condition) -> Result<String, DatabaseError> {
        let e = self.field_expr("d", &condition.field);
        let value = &condition.value;
        Ok(match condition.op {
            FilterOp::Eq if value.is_null() => format!("({e} IS NULL OR {e} = 'null'::jsonb)"),
            FilterOp::Ne if value.is_null() => format!("({e} IS NOT NULL AND {e} <> 'null'::jsonb)"),
            FilterOp::Eq => format!("{} = {}", e, self.json(value)),
            FilterOp::Ne => format!("{} <> {}", e, self.json(value)),
            FilterOp::Gt => format!("{} > {}", e, self.json(value)),
            FilterOp::Gte => format!("{} >= {}", e, self.json(value)),
            FilterOp::Lt => format!("{} < {}", e, self.json(value)),
            FilterOp::Lte => format!("{} <= {}", e, self.json(value)),
            FilterOp::In | FilterOp::Nin => {
                if !value.is_array() {
                    return Err(DatabaseError::QueryError(format!(
                        "{} on {} requires an array",
                        condition.op.as_str(),
                        condition.field
                    )));
                }
                let list = self.json(value);
                let not = if condition.op == FilterOp::Nin { "NOT " } else { "" };
                format!(
                    "({e} IS NOT NULL AND {e} {not}IN (SELECT value FROM jsonb_array_elements({list})))"
                )
            }
            FilterOp::Between => match value.as_array().map(Vec::as_slice) {
                Some([lo, hi]) => {
                    let lo = self.json(lo);
                    let hi = self.json(hi);
                    format!("({e} >= {lo} AND {e} <= {hi})")
                }
                _ => {
                    return Err(DatabaseError::QueryError(format!(
                        "$between on {} requires two bounds",
                        condition.field
                    )))
                }
            },
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => {
                let needle = escape_like(value.as_str().unwrap_or_default());
                let pattern = match condition.op {
                    FilterOp::Contains => format!("%{}%", needle),
                    FilterOp::StartsWith => format!("{}%", needle),
                    _ => format!("%{}", needle),
                };
                let n = self.param(SqlParam::Text(pattern));
                format!(
                    "(jsonb_typeof({e}) IN ('string', 'number', 'boolean') AND ({e} #>> '{{}}') ILIKE ${n})"
                )
            }
            FilterOp::IEq => {
                let n = self.param(SqlParam::Text(value.as_str().unwrap_or_default().to_string()));
                format!("(jsonb_typeof({e}) = 'string' AND lower({e} #>> '{{}}') = lower(${n}::text))")
            }
        })
    }

    fn json(&mut self, value: &Value) -> String {
        let n = self.param(SqlParam::Json(value.clone()));
        format!("${}::jsonb", n)
    }

    fn param(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.params.len()
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
