//! Article page rendering and text extraction.
//!
//! Fetching an article's full text is a two-step process:
//!
//! 1. **Rendering**: A [`PageRenderer`] turns an article URL into HTML
//! 2. **Extraction**: [`newsfilter::extract_article_text`] pulls the story out of that HTML
//!
//! # Renderers
//!
//! | Renderer | Module | Notes |
//! |----------|--------|-------|
//! | [`BrowserRenderer`] | [`browser`] | Headless Chrome; runs the page's JavaScript |
//! | [`HttpRenderer`] | [`http`] | Authenticated GET; no JavaScript |
//! | [`RetryRender`] | here | Backoff decorator around either |
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay
//! - Token errors and permanent 4xx statuses are not retried

pub mod browser;
pub mod http;
pub mod newsfilter;

pub use browser::BrowserRenderer;
pub use http::HttpRenderer;

use crate::error::Result;
use async_trait::async_trait;
use rand::{rng, Rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Turns an article URL into page HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return its HTML.
    ///
    /// # Arguments
    ///
    /// * `url` - Article page on newsfilter.io
    ///
    /// # Returns
    ///
    /// The page HTML, or an error if the page could not be loaded.
    async fn render(&self, url: &str) -> Result<String>;
}

/// Wrapper that adds exponential backoff retry logic to any [`PageRenderer`].
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryRender<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryRender<T>
where
    T: PageRenderer,
{
    /// Wrap `inner`, retrying up to `max_retries` times after the first attempt.
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryRender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryRender")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl<T> PageRenderer for RetryRender<T>
where
    T: PageRenderer,
{
    #[instrument(level = "info", skip(self))]
    async fn render(&self, url: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.render(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries || !e.is_retryable() {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "render() giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "render() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
