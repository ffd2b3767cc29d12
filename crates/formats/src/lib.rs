pub mod bounds;
pub mod facets;
pub mod feature;
pub mod geometry;
pub mod map_config;
pub mod target;

pub use bounds::*;
pub use facets::*;
pub use feature::*;
pub use geometry::*;
pub use map_config::*;
pub use target::*;

/// Failure to interpret a document returned by the record store.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a Feature document, got type {0:?}")]
    NotAFeature(String),
}
