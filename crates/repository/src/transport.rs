use futures_util::future::LocalBoxFuture;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },
}

/// Text fetcher for record-store targets (`/id/1/geojson`, `/maps.json`, ...).
///
/// Targets are relative; implementations resolve them against their own root.
/// Futures are `!Send`: everything runs on one cooperative thread.
pub trait Transport {
    fn get_text(&self, target: &str) -> LocalBoxFuture<'_, Result<String, TransportError>>;
}
