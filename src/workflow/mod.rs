pub mod catalog_session;

pub use catalog_session::CatalogSession;
