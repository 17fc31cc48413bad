//! Headless Chrome plumbing shared by page rendering and login.
//!
//! `headless_chrome` is synchronous; every entry point here blocks and is meant
//! to run on `tokio::task::spawn_blocking`. A fresh browser is launched per
//! page and torn down when it is dropped.

use super::PageRenderer;
use crate::api::{site_headers, NewsfilterClient, USER_AGENT};
use crate::error::{NewsfilterError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Kill an idle browser after this long without CDP traffic.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(120);

/// Launch headless Chrome with a desktop user agent and automation markers hidden.
///
/// `profile_dir` selects the user data dir; `None` lets Chrome use a throwaway one.
pub(crate) fn launch(profile_dir: Option<PathBuf>) -> Result<Browser> {
    let user_agent = format!("--user-agent={}", USER_AGENT);
    let args: Vec<&OsStr> = vec![
        OsStr::new("--disable-gpu"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new(&user_agent),
    ];

    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .user_data_dir(profile_dir)
        .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
        .args(args)
        .build()
        .map_err(NewsfilterError::browser)?;

    Browser::new(options).map_err(NewsfilterError::browser)
}

/// Load `url` with the given extra headers, wait for scripts, and return the DOM as HTML.
fn render_blocking(url: &str, headers: &[(&'static str, String)], wait: Duration) -> Result<String> {
    let t0 = Instant::now();
    let browser = launch(None)?;
    let tab = browser.new_tab().map_err(NewsfilterError::browser)?;

    let extra: HashMap<&str, &str> = headers.iter().map(|(k, v)| (*k, v.as_str())).collect();
    tab.set_extra_http_headers(extra)
        .map_err(NewsfilterError::browser)?;

    tab.navigate_to(url).map_err(NewsfilterError::browser)?;
    tab.wait_until_navigated().map_err(NewsfilterError::browser)?;
    std::thread::sleep(wait);

    let html = tab.get_content().map_err(NewsfilterError::browser)?;
    debug!(
        bytes = html.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Rendered page"
    );
    Ok(html)
}

/// Renders article pages in headless Chrome with the API's bearer token attached.
#[derive(Clone)]
pub struct BrowserRenderer {
    client: NewsfilterClient,
    page_load_wait: Duration,
}

impl BrowserRenderer {
    /// Render with `client`'s token, letting each page run for `page_load_wait`.
    pub fn new(client: NewsfilterClient, page_load_wait: Duration) -> Self {
        Self {
            client,
            page_load_wait,
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    #[instrument(level = "info", skip(self))]
    async fn render(&self, url: &str) -> Result<String> {
        let token = self.client.tokens().access_token().await?;
        let headers = site_headers(&token);
        let url = url.to_string();
        let wait = self.page_load_wait;

        let html = tokio::task::spawn_blocking(move || render_blocking(&url, &headers, wait))
            .await
            .map_err(NewsfilterError::browser)??;
        info!(bytes = html.len(), "Rendered article page");
        Ok(html)
    }
}
