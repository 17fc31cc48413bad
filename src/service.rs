//! The search → date-filter → render pipeline behind both the CLI and the server.

use crate::api::NewsfilterClient;
use crate::error::Result;
use crate::filter::{filter_by_date_range, today_and_yesterday, MARKET_TZ};
use crate::models::{Article, ArticlesResponse};
use crate::scrapers::newsfilter::extract_article_text;
use crate::scrapers::PageRenderer;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Article pages rendered at once; each one is a full Chrome process.
pub const RENDER_CONCURRENCY: usize = 2;

/// Search, date filter and page rendering behind one handle.
///
/// Cheap to clone; the client and renderer are shared.
#[derive(Clone)]
pub struct NewsService {
    client: NewsfilterClient,
    renderer: Arc<dyn PageRenderer>,
    tz: Tz,
}

impl NewsService {
    /// Pair a search client with the renderer used for article pages.
    pub fn new(client: NewsfilterClient, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            client,
            renderer,
            tz: MARKET_TZ,
        }
    }

    /// Every search hit for `symbol`, without date filtering or page content.
    pub async fn get_articles_by_symbol(&self, symbol: &str) -> Result<ArticlesResponse> {
        self.client.search_articles(symbol).await
    }

    /// Search hits for `symbol` published today or yesterday (New York time), without body text.
    pub async fn articles_in_window(&self, symbol: &str) -> Result<ArticlesResponse> {
        self.articles_in_window_at(symbol, Utc::now()).await
    }

    /// [`Self::articles_in_window`] evaluated at instant `now`.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Ticker symbol to search for
    /// * `now` - Instant whose New York date counts as "today"
    ///
    /// # Returns
    ///
    /// Hits dated today or yesterday, in search order.
    pub async fn articles_in_window_at(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<ArticlesResponse> {
        let all = self.client.search_articles(symbol).await?;
        let total = all.articles.len();

        let (yesterday, today) = today_and_yesterday(now, self.tz);
        let articles = filter_by_date_range(all.articles, yesterday, today, self.tz);
        info!(
            total,
            in_window = articles.len(),
            %yesterday,
            %today,
            "Filtered articles to today and yesterday"
        );
        Ok(ArticlesResponse { articles })
    }

    /// Articles for `symbol` published today or yesterday (New York time), with body text.
    #[instrument(level = "info", skip(self))]
    pub async fn get_today_and_yesterday_articles(&self, symbol: &str) -> Result<ArticlesResponse> {
        let t0 = Instant::now();
        let in_window = self.articles_in_window(symbol).await?;
        let articles = self.fill_html_content(in_window.articles).await;
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Pipeline complete");
        Ok(ArticlesResponse { articles })
    }

    /// Render each article page and store its extracted text in `html_content`.
    ///
    /// Pages that fail to render keep `html_content = None`. Order is preserved.
    pub async fn fill_html_content(&self, articles: Vec<Article>) -> Vec<Article> {
        stream::iter(articles)
            .map(|mut article| {
                let renderer = Arc::clone(&self.renderer);
                async move {
                    match renderer.render(&article.url).await {
                        Ok(html) => {
                            let text = extract_article_text(&html);
                            debug!(url = %article.url, chars = text.len(), "Extracted article body");
                            article.html_content = Some(text);
                        }
                        Err(e) => {
                            warn!(url = %article.url, error = %e, "Article render failed; leaving content empty");
                        }
                    }
                    article
                }
            })
            .buffered(RENDER_CONCURRENCY)
            .collect()
            .await
    }
}
