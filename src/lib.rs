pub mod catalog;
pub mod config;
pub mod deep_link;
pub mod error;
pub mod merge;
pub mod models;
pub mod normalizer;
pub mod render;
pub mod repo_fetch;
pub mod search_index;
pub mod source_store;
pub mod version_cmp;

#[cfg(test)]
pub(crate) mod repo_fetch_tests;

pub use catalog::{Catalog, LoadReport};
pub use config::CatalogConfig;
pub use error::CatalogError;
pub use models::{App, SearchRecord, SortMode, Version};
