pub mod metadata_provider;
pub mod query_builder;
pub mod results_controller;

pub use metadata_provider::MetadataProvider;
pub use query_builder::{build, RequestDescriptor};
pub use results_controller::{FetchStatus, ResultsController, ResultsSnapshot};
