pub mod error;
pub mod filter_order;
pub mod filter_where;
pub mod pipeline;
pub mod types;

pub use error::FilterError;
pub use filter_order::FilterOrder;
pub use filter_where::FilterWhere;
pub use pipeline::{ListQuery, Lookup, Page, Pipeline, Stage};
pub use types::*;
