//! Plain-HTTP page renderer.
//!
//! Cheaper than a browser but only useful for pages whose body is present in
//! the server response.

use super::PageRenderer;
use crate::api::NewsfilterClient;
use crate::error::Result;
use async_trait::async_trait;

/// Fetches article pages with a plain authenticated GET.
///
/// Pages are returned as served; any script-rendered content is missing.
#[derive(Clone)]
pub struct HttpRenderer {
    client: NewsfilterClient,
}

impl HttpRenderer {
    /// Render through `client`, reusing its bearer token.
    pub fn new(client: NewsfilterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        self.client.download_html(url).await
    }
}
