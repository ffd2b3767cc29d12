use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::transport::{Transport, TransportError};

/// HTTP transport against a record store root URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    root_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self::with_client(root_url, reqwest::Client::new())
    }

    pub fn with_client(root_url: impl Into<String>, client: reqwest::Client) -> Self {
        let root_url = root_url.into().trim_end_matches('/').to_string();
        Self { root_url, client }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn url_for(&self, target: &str) -> String {
        if target.starts_with('/') {
            format!("{}{}", self.root_url, target)
        } else {
            format!("{}/{}", self.root_url, target)
        }
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, target: &str) -> LocalBoxFuture<'_, Result<String, TransportError>> {
        let url = self.url_for(target);
        Box::pin(async move {
            debug!(%url, "GET");
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(TransportError::Status {
                    status: resp.status().as_u16(),
                });
            }

            resp.text()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HttpTransport;

    #[test]
    fn joins_root_and_target() {
        let t = HttpTransport::new("https://spelunker.example.com/");
        assert_eq!(t.root_url(), "https://spelunker.example.com");
        assert_eq!(
            t.url_for("/id/85922583/geojson"),
            "https://spelunker.example.com/id/85922583/geojson"
        );
        assert_eq!(t.url_for("maps.json"), "https://spelunker.example.com/maps.json");
    }
}
