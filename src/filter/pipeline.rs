use serde_json::{json, Value};
use tracing::{debug, warn};

use super::error::FilterError;
use super::filter_order::{FilterOrder, DEFAULT_SORT_FIELD};
use super::filter_where::FilterWhere;
use super::types::{ListRequest, Predicate, SortSpec};
use crate::database::document::Collection;

/// Left join resolving a reference field into a display value.
///
/// The joined record's `label_field` is written into `as_field`; a dangling or
/// missing reference yields `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: Collection,
    pub local_field: String,
    pub foreign_field: String,
    pub label_field: String,
    pub as_field: String,
}

impl Lookup {
    /// Join `local_field` against the target's id.
    pub fn by_id(from: Collection, local_field: &str, label_field: &str, as_field: &str) -> Self {
        Self {
            from,
            local_field: local_field.to_string(),
            foreign_field: "id".to_string(),
            label_field: label_field.to_string(),
            as_field: as_field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Predicate),
    Lookup(Lookup),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
}

impl Stage {
    pub fn to_value(&self) -> Value {
        match self {
            Stage::Match(p) => json!({ "$match": p.to_value() }),
            Stage::Lookup(l) => json!({ "$lookup": {
                "from": l.from.table_name(),
                "localField": l.local_field,
                "foreignField": l.foreign_field,
                "labelField": l.label_field,
                "as": l.as_field,
            }}),
            Stage::Sort(s) => json!({ "$sort": s.to_value() }),
            Stage::Skip(n) => json!({ "$skip": n }),
            Stage::Limit(n) => json!({ "$limit": n }),
        }
    }
}

/// 1-based page with an optional size; no size means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: Option<u64>,
}

impl Page {
    pub fn new(page: Option<i64>, page_size: Option<i64>, max_page_size: Option<u64>) -> Self {
        let number = match page {
            Some(p) if p >= 1 => p as u64,
            _ => 1,
        };
        let size = match page_size {
            Some(s) if s >= 1 => {
                let requested = s as u64;
                match max_page_size {
                    Some(max) if requested > max => {
                        warn!("Requested page size {} exceeds maximum {}, capping", requested, max);
                        Some(max)
                    }
                    _ => Some(requested),
                }
            }
            _ => None,
        };
        Self { number, size }
    }

    pub fn unbounded() -> Self {
        Self { number: 1, size: None }
    }

    /// Records to skip, never beyond what a SQL `OFFSET` accepts.
    pub fn offset(&self) -> u64 {
        match self.size {
            Some(size) => (self.number - 1).saturating_mul(size).min(i64::MAX as u64),
            None => 0,
        }
    }
}

/// Ordered stage list shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// match → extra → sort → skip → limit
    pub fn assemble(predicate: Predicate, sort: SortSpec, page: Page, extra: Vec<Stage>) -> Self {
        let mut stages = Vec::with_capacity(extra.len() + 4);
        stages.push(Stage::Match(predicate));
        stages.extend(extra);
        stages.push(Stage::Sort(sort));
        if let Some(size) = page.size {
            let offset = page.offset();
            if offset > 0 {
                stages.push(Stage::Skip(offset));
            }
            stages.push(Stage::Limit(size));
        }
        Self { stages }
    }

    /// Matching records only, no ordering or pagination.
    pub fn matching(predicate: Predicate) -> Self {
        Self {
            stages: vec![Stage::Match(predicate)],
        }
    }

    pub fn push(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Same match and joins with sort and pagination removed, for the total count.
    pub fn count_pipeline(&self) -> Self {
        Self {
            stages: self
                .stages
                .iter()
                .filter(|s| matches!(s, Stage::Match(_) | Stage::Lookup(_)))
                .cloned()
                .collect(),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn describe(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::to_value).collect())
    }
}

/// A list request resolved against the active-records rule.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub predicate: Predicate,
    pub sort: SortSpec,
    pub page: Page,
}

impl ListQuery {
    pub fn from_request(req: &ListRequest, max_page_size: Option<u64>) -> Result<Self, FilterError> {
        let predicate = FilterWhere::translate(req.filter.as_ref())?.active();
        let sort = FilterOrder::resolve(req.sort_by.as_deref(), req.order.as_deref());
        let page = Page::new(req.page, req.page_size, max_page_size);
        debug!(
            filter = %predicate.to_value(),
            sort = %sort.to_value(),
            page = page.number,
            page_size = ?page.size,
            "Resolved list query"
        );
        Ok(Self { predicate, sort, page })
    }

    /// Drop conditions on `hidden` fields and fall back to creation order if
    /// the sort uses one.
    pub fn without_fields(mut self, hidden: &[&str]) -> Self {
        self.predicate.conditions.retain(|c| {
            let keep = !hidden.contains(&c.field.as_str());
            if !keep {
                warn!("Ignoring filter on hidden field {:?}", c.field);
            }
            keep
        });
        if hidden.contains(&self.sort.field.as_str()) {
            warn!("Ignoring sort on hidden field {:?}", self.sort.field);
            self.sort.field = DEFAULT_SORT_FIELD.to_string();
        }
        self
    }

    pub fn pipeline(&self, extra: Vec<Stage>) -> Pipeline {
        Pipeline::assemble(self.predicate.clone(), self.sort.clone(), self.page, extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{FilterOp, SortDirection};

    #[test]
    fn stage_order_is_match_extra_sort_skip_limit() {
        let lookup = Lookup::by_id(Collection::Categories, "categoryId", "name", "categoryName");
        let pipeline = Pipeline::assemble(
            Predicate::all().active(),
            SortSpec::new("name", SortDirection::Asc),
            Page::new(Some(3), Some(10), None),
            vec![Stage::Lookup(lookup.clone())],
        );
        assert_eq!(
            pipeline.stages(),
            &[
                Stage::Match(Predicate::all().active()),
                Stage::Lookup(lookup),
                Stage::Sort(SortSpec::new("name", SortDirection::Asc)),
                Stage::Skip(20),
                Stage::Limit(10),
            ]
        );
    }

    #[test]
    fn page_below_one_is_first_page() {
        let page = Page::new(Some(0), Some(5), None);
        assert_eq!(page.number, 1);
        assert_eq!(page.offset(), 0);
        let page = Page::new(Some(-4), Some(5), None);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn missing_page_size_is_unbounded() {
        let pipeline = Pipeline::assemble(
            Predicate::all(),
            SortSpec::new("createdAt", SortDirection::Asc),
            Page::new(Some(4), None, None),
            vec![],
        );
        assert_eq!(pipeline.stages().len(), 2);
        assert_eq!(Page::new(None, Some(0), None).size, None);
    }

    #[test]
    fn page_size_is_capped() {
        assert_eq!(Page::new(Some(1), Some(5000), Some(100)).size, Some(100));
        assert_eq!(Page::new(Some(1), Some(50), Some(100)).size, Some(50));
    }

    #[test]
    fn count_pipeline_drops_pagination() {
        let pipeline = Pipeline::assemble(
            Predicate::eq("name", json!("x")),
            SortSpec::new("name", SortDirection::Desc),
            Page::new(Some(2), Some(10), None),
            vec![],
        );
        assert_eq!(
            pipeline.count_pipeline().stages(),
            &[Stage::Match(Predicate::eq("name", json!("x")))]
        );
    }

    #[test]
    fn list_query_always_filters_active() {
        let req = ListRequest {
            filter: Some(json!({ "name": { "contains": "oak" } })),
            ..Default::default()
        };
        let query = ListQuery::from_request(&req, None).unwrap();
        assert_eq!(query.predicate.conditions.len(), 2);
        assert_eq!(query.predicate.conditions[1].field, "isActive");
        assert_eq!(query.predicate.conditions[1].op, FilterOp::Eq);
        assert_eq!(query.sort.field, "createdAt");
    }

    #[test]
    fn describe_renders_mongo_style_stages() {
        let pipeline = Pipeline::matching(Predicate::all()).push(Stage::Limit(1));
        assert_eq!(pipeline.describe(), json!([{ "$match": {} }, { "$limit": 1 }]));
    }

    #[test]
    fn lookup_rendering_names_label_field() {
        let lookup = Lookup::by_id(Collection::Categories, "categoryId", "name", "categoryName");
        assert_eq!(
            Stage::Lookup(lookup).to_value(),
            json!({ "$lookup": {
                "from": "categories",
                "localField": "categoryId",
                "foreignField": "id",
                "labelField": "name",
                "as": "categoryName",
            }})
        );
    }

    #[test]
    fn huge_page_offset_stays_in_sql_range() {
        let page = Page::new(Some(10_000_000_000_000_000), Some(1000), Some(1000));
        assert_eq!(page.offset(), i64::MAX as u64);
        let page = Page::new(Some(i64::MAX), Some(i64::MAX), None);
        assert_eq!(page.offset(), i64::MAX as u64);
    }

    #[test]
    fn hidden_fields_are_not_queryable() {
        let req = ListRequest {
            filter: Some(json!({ "password": { "startsWith": "$argon2" }, "email": "a@b.c" })),
            sort_by: Some("password".into()),
            order: Some("desc".into()),
            ..Default::default()
        };
        let query = ListQuery::from_request(&req, None).unwrap().without_fields(&["password"]);
        let fields: Vec<&str> = query.predicate.conditions.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "isActive"]);
        assert_eq!(query.sort, SortSpec::new("createdAt", SortDirection::Desc));
    }
}
