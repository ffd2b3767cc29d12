use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use repository::{Transport, TransportError};

/// `fetch()` against the page's own origin (or an explicit root).
#[derive(Debug, Clone, Default)]
pub struct BrowserTransport {
    root_url: String,
}

impl BrowserTransport {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Transport for BrowserTransport {
    fn get_text(&self, target: &str) -> LocalBoxFuture<'_, Result<String, TransportError>> {
        let url = format!("{}{}", self.root_url, target);
        Box::pin(async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;
            if !resp.ok() {
                return Err(TransportError::Status {
                    status: resp.status(),
                });
            }
            resp.text()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))
        })
    }
}
