use super::filter_where::is_valid_field;
use super::types::{SortDirection, SortSpec};

pub const DEFAULT_SORT_FIELD: &str = "createdAt";

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve a client `sortBy`/`order` pair into a single-key sort.
    ///
    /// Missing or invalid fields fall back to creation order so pagination stays
    /// deterministic.
    pub fn resolve(field: Option<&str>, direction: Option<&str>) -> SortSpec {
        let field = match field.map(str::trim) {
            Some(f) if !f.is_empty() && is_valid_field(f) => f,
            Some(f) if !f.is_empty() => {
                tracing::warn!("Ignoring invalid sort field {:?}", f);
                DEFAULT_SORT_FIELD
            }
            _ => DEFAULT_SORT_FIELD,
        };
        SortSpec::new(field, Self::parse_direction(direction))
    }

    pub fn parse_direction(direction: Option<&str>) -> SortDirection {
        match direction.map(|d| d.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") | Some("descending") | Some("-1") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}
