//! newsfilter.io search client with token-expiry retry.
//!
//! The site exposes an undocumented action endpoint: every call is a POST of a
//! JSON object whose `type` names the action. Searching uses `filterArticles`
//! with a Lucene-style query string and a bearer token.
//!
//! # Retry Strategy
//!
//! Expired tokens show up in two ways, and each gets exactly one retry after a
//! token refresh:
//! - `401 Unauthorized`
//! - `200 OK` with an empty `articles` list (the API answers this way for some
//!   stale sessions instead of rejecting them)
//!
//! Any other non-200 status is returned as [`NewsfilterError::Status`].

use crate::auth::TokenManager;
use crate::config::Settings;
use crate::error::{NewsfilterError, Result};
use crate::models::{ArticlesResponse, SearchRequest};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ORIGIN, REFERER};
use reqwest::{RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Desktop Chrome user agent; the API rejects obvious bot agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";
pub const SITE_ORIGIN: &str = "https://newsfilter.io";
pub const SITE_REFERER: &str = "https://newsfilter.io/";

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").unwrap());

/// Normalize a ticker symbol and reject anything that could break the query string.
pub fn validate_symbol(symbol: &str) -> Result<String> {
    let normalized = symbol.trim().to_uppercase();
    if SYMBOL_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(NewsfilterError::InvalidSymbol(symbol.to_string()))
    }
}

/// Query string matching the symbol in the title, the description, or the tagged symbols.
pub fn build_query(symbol: &str) -> String {
    format!(
        "title:\"{s}\" OR description:\"{s}\" OR symbols:\"{s}\"",
        s = symbol
    )
}

/// Headers the site's own frontend sends with authenticated requests.
pub fn site_headers(access_token: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Authorization", format!("Bearer {}", access_token)),
        ("Origin", SITE_ORIGIN.to_string()),
        ("Referer", SITE_REFERER.to_string()),
        ("User-Agent", USER_AGENT.to_string()),
    ]
}

/// Authenticated client for the newsfilter.io search API.
#[derive(Clone)]
pub struct NewsfilterClient {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    search_url: Url,
}

impl NewsfilterClient {
    /// Build the HTTP client and its token manager.
    ///
    /// # Arguments
    ///
    /// * `settings` - Endpoints and initial tokens
    ///
    /// # Returns
    ///
    /// The client, or an error if the TLS backend could not be initialised.
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        let tokens = Arc::new(TokenManager::new(http.clone(), settings));
        Ok(Self {
            http,
            tokens,
            search_url: settings.search_api_url.clone(),
        })
    }

    /// Token manager shared by every clone of this client.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    fn authorized(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .bearer_auth(access_token)
            .header(ORIGIN, SITE_ORIGIN)
            .header(REFERER, SITE_REFERER)
    }

    /// One search call; returns the token it was made with alongside the response.
    async fn call_search(&self, symbol: &str) -> Result<(String, reqwest::Response)> {
        let token = self.tokens.access_token().await?;
        let payload = SearchRequest::filter_articles(build_query(symbol));
        let response = self
            .authorized(self.http.post(self.search_url.clone()), &token)
            .json(&payload)
            .send()
            .await?;
        debug!(status = response.status().as_u16(), "Search API responded");
        Ok((token, response))
    }

    /// Search for articles mentioning `symbol`.
    ///
    /// Refreshes the token and retries once on 401 or on an empty 200. Articles
    /// sharing a `url` are collapsed, keeping the first.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Ticker symbol; normalized by [`validate_symbol`]
    ///
    /// # Returns
    ///
    /// Up to one page of hits, or [`NewsfilterError::Status`] for any non-200
    /// reply that survives the retry.
    #[instrument(level = "info", skip(self))]
    pub async fn search_articles(&self, symbol: &str) -> Result<ArticlesResponse> {
        let symbol = validate_symbol(symbol)?;
        let t0 = Instant::now();

        let (mut token, mut response) = self.call_search(&symbol).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Token expired; refreshing");
            self.tokens.refresh_rejected(&token).await?;
            (token, response) = self.call_search(&symbol).await?;
        }

        if response.status() != StatusCode::OK {
            return Err(status_error(response).await);
        }

        let mut data: ArticlesResponse = response.json().await?;
        if data.articles.is_empty() {
            warn!("200 OK but no articles; refreshing token and retrying");
            self.tokens.refresh_rejected(&token).await?;
            let (_, retry) = self.call_search(&symbol).await?;
            if retry.status() != StatusCode::OK {
                return Err(status_error(retry).await);
            }
            data = retry.json().await?;
        }

        let fetched = data.articles.len();
        data.articles = data
            .articles
            .into_iter()
            .unique_by(|a| a.url.clone())
            .collect();

        info!(
            symbol = %symbol,
            count = data.articles.len(),
            duplicates = fetched - data.articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched articles"
        );
        Ok(data)
    }

    /// Plain authenticated GET of an article page.
    #[instrument(level = "debug", skip(self))]
    pub async fn download_html(&self, url: &str) -> Result<String> {
        let token = self.tokens.access_token().await?;
        let response = self.authorized(self.http.get(url), &token).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.text().await?)
    }
}

async fn status_error(response: reqwest::Response) -> NewsfilterError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(status, body = %truncate_for_log(&body, 300), "Unexpected API status");
    NewsfilterError::Status { status, body }
}
