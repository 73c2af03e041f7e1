pub mod catalog_client;
pub mod memory_catalog;

pub use catalog_client::{CatalogTransport, HttpCatalogClient};
pub use memory_catalog::InMemoryCatalog;
