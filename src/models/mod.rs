pub mod facet;
pub mod paper;
pub mod query_state;
pub mod sort;

pub use facet::{FacetDimension, FacetOption, FacetOptionsByDimension, FacetSet};
pub use paper::{Pagination, Paper, PaperPage};
pub use query_state::{apply_action, QueryAction, QueryState, DEFAULT_PAGE_SIZE};
pub use sort::{SortKey, SortRegistry};
