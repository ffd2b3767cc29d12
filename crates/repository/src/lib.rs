pub mod memory;
pub mod repository;
pub mod transport;

#[cfg(not(target_arch = "wasm32"))]
pub mod http;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpTransport;
pub use memory::MemoryTransport;
pub use repository::*;
pub use transport::*;

use foundation::InvalidIdentifier;

/// Why a request to the record store produced no usable document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchCause {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed document: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetching {target}: {cause}")]
pub struct FetchError {
    pub target: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(target: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self {
            target: target.into(),
            cause: cause.into(),
        }
    }

    pub fn malformed(target: impl Into<String>, detail: impl ToString) -> Self {
        Self::new(target, FetchCause::Malformed(detail.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
