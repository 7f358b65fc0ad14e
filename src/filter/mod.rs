pub mod types;
pub mod filter;
pub mod filter_where;
pub mod pagination;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use error::FilterError;
pub use pagination::{Page, PageQuery, PageRequest, PagedResponse};
