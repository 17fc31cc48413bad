//! # Ticker News
//!
//! Fetches today's and yesterday's newsfilter.io articles for a stock ticker,
//! renders each article page in headless Chrome to recover its body text, and
//! serves the result over a small HTTP API.
//!
//! ## Features
//!
//! - Authenticated search against the newsfilter.io private API, with token
//!   refresh on expiry and on the empty-result quirk
//! - Date filtering in New York market time
//! - Article body extraction from the JavaScript-rendered page
//! - Browser login that captures a fresh token pair from network traffic
//! - `/health` and `/api/news/{symbol}` endpoints with permissive CORS
//!
//! ## Usage
//!
//! ```sh
//! ticker_news serve --bind 0.0.0.0:8000
//! ticker_news fetch ALG -j ./json
//! ticker_news login --write-env
//! ```
//!
//! ## Architecture
//!
//! 1. **Search**: [`api::NewsfilterClient`] queries title, description and symbols
//! 2. **Filter**: [`filter`] keeps articles published today or yesterday
//! 3. **Render**: a [`scrapers::PageRenderer`] loads each page, two at a time
//! 4. **Output**: JSON over HTTP, or a console listing and dated JSON files

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod auth;
mod cli;
mod config;
mod error;
mod filter;
mod login;
mod models;
mod outputs;
mod routes;
mod scrapers;
mod service;
mod utils;

use api::{validate_symbol, NewsfilterClient};
use cli::{Cli, Command};
use config::{update_env_file, RenderMode, Settings};
use error::NewsfilterError;
use filter::{today_and_yesterday, MARKET_TZ};
use models::TokenPair;
use outputs::{console, json};
use routes::AppState;
use scrapers::{BrowserRenderer, HttpRenderer, PageRenderer, RetryRender};
use service::NewsService;
use utils::truncate_for_log;

const RENDER_RETRIES: usize = 2;
const RENDER_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_ENV_FILE: &str = ".env";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal; anything else is worth a warning once logging is up.
    let dotenv_result = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    if let Err(e) = dotenv_result {
        if !e.not_found() {
            warn!(error = %e, "Failed to load .env file");
        }
    }

    let start_time = std::time::Instant::now();
    info!("ticker_news starting up");

    let args = Cli::parse();
    let settings = Settings::from_cli(&args)?;
    debug!(?settings, "Resolved settings");

    let outcome = match args.command {
        Command::Serve { bind } => serve(&settings, &bind).await,
        Command::Fetch {
            symbol,
            all,
            no_content,
            json_output_dir,
        } => fetch(&settings, &symbol, all, no_content, json_output_dir.as_deref()).await,
        Command::Login { write_env } => capture_tokens(&settings, write_env).await,
        Command::Refresh => refresh(&settings).await,
    };

    if let Err(ref e) = outcome {
        error!(error = %e, "ticker_news failed");
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs(),
        elapsed_ms = elapsed.as_millis() as u64,
        "ticker_news finished"
    );
    outcome
}

/// Client plus renderer for `serve` and `fetch`.
///
/// With no token configured and credentials available, logs in first so the
/// client starts with a valid pair.
#[instrument(level = "info", skip_all, fields(render_mode = ?settings.render_mode))]
async fn build_service(settings: &Settings) -> Result<NewsService, Box<dyn Error>> {
    let client = NewsfilterClient::new(settings)?;

    if settings.access_token.is_none() && settings.refresh_token.is_none() {
        match &settings.credentials {
            Some(credentials) => {
                info!("No tokens configured; logging in to obtain a token pair");
                let pair =
                    login::browser_login(&settings.login_url, credentials.clone(), settings.page_load_wait)
                        .await?;
                client.tokens().install(pair).await;
            }
            None => warn!("No tokens or credentials configured; searches will fail"),
        }
    }

    let renderer: Arc<dyn PageRenderer> = match settings.render_mode {
        RenderMode::Browser => Arc::new(RetryRender::new(
            BrowserRenderer::new(client.clone(), settings.page_load_wait),
            RENDER_RETRIES,
            RENDER_RETRY_BASE_DELAY,
        )),
        RenderMode::Http => Arc::new(RetryRender::new(
            HttpRenderer::new(client.clone()),
            RENDER_RETRIES,
            RENDER_RETRY_BASE_DELAY,
        )),
    };

    Ok(NewsService::new(client, renderer))
}

async fn serve(settings: &Settings, bind: &str) -> Result<(), Box<dyn Error>> {
    let news_service = build_service(settings).await?;
    let app = routes::app(AppState {
        news_service: Arc::new(news_service),
    });

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        return;
    }
    info!("Shutdown signal received");
}

async fn fetch(
    settings: &Settings,
    symbol: &str,
    all: bool,
    no_content: bool,
    json_output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let symbol = validate_symbol(symbol)?;
    let news_service = build_service(settings).await?;

    let mut resp = if all {
        news_service.get_articles_by_symbol(&symbol).await?
    } else {
        news_service.articles_in_window(&symbol).await?
    };
    if !no_content {
        resp.articles = news_service.fill_html_content(resp.articles).await;
    }

    console::print_articles(&resp);

    if let Some(dir) = json_output_dir {
        let (_, today) = today_and_yesterday(Utc::now(), MARKET_TZ);
        let path = json::write_articles(&resp, dir, &symbol, today).await?;
        info!(path = %path.display(), "Saved JSON output");
    }
    Ok(())
}

async fn capture_tokens(settings: &Settings, write_env: bool) -> Result<(), Box<dyn Error>> {
    let credentials = settings.credentials.clone().ok_or_else(|| {
        NewsfilterError::Config("login needs NEWSFILTER_EMAIL and NEWSFILTER_PASSWORD".to_string())
    })?;

    let pair = login::browser_login(&settings.login_url, credentials, settings.page_load_wait).await?;
    print_tokens(&pair);

    if write_env {
        let path = settings
            .token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
        update_env_file(&path, "ACCESS_TOKEN", &pair.accessToken).await?;
        update_env_file(&path, "REFRESH_TOKEN", &pair.refreshToken).await?;
        info!(path = %path.display(), "Wrote tokens to env file");
    }
    Ok(())
}

async fn refresh(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let client = NewsfilterClient::new(settings)?;
    let tokens = client.tokens();
    tokens.refresh().await?;

    let pair = TokenPair {
        accessToken: tokens.access_token().await?,
        refreshToken: tokens
            .refresh_token()
            .await
            .ok_or(NewsfilterError::MissingToken("refresh"))?,
    };
    print_tokens(&pair);
    if settings.token_file.is_none() {
        info!("No --token-file set; new tokens were not persisted");
    }
    Ok(())
}

fn print_tokens(pair: &TokenPair) {
    println!("ACCESS_TOKEN={}", truncate_for_log(&pair.accessToken, 24));
    println!("REFRESH_TOKEN={}", truncate_for_log(&pair.refreshToken, 24));
}
