//! Command-line interface definitions for ticker_news.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every connection setting can be provided via a flag or an environment
//! variable; a `.env` file in the working directory is loaded before parsing.

use crate::config::{
    RenderMode, DEFAULT_LOGIN_URL, DEFAULT_SEARCH_API_URL, DEFAULT_TOKEN_REFRESH_URL,
};
use clap::{Parser, Subcommand};

/// Command-line arguments for ticker_news.
///
/// # Examples
///
/// ```sh
/// # Serve the HTTP endpoint
/// ticker_news serve --bind 127.0.0.1:8000
///
/// # Print today's and yesterday's articles for a ticker
/// ticker_news fetch ALG
///
/// # Capture fresh tokens via headless Chrome and write them to .env
/// ticker_news login --write-env
///
/// # Rotate the token pair stored in .env
/// ticker_news refresh --token-file .env
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// newsfilter.io search action endpoint
    #[arg(long, env = "SEARCH_API_URL", default_value = DEFAULT_SEARCH_API_URL, global = true)]
    pub search_api_url: String,

    /// newsfilter.io public action endpoint used for token refresh
    #[arg(long, env = "TOKEN_REFRESH_URL", default_value = DEFAULT_TOKEN_REFRESH_URL, global = true)]
    pub token_refresh_url: String,

    /// Login page driven by `login`
    #[arg(long, env = "NEWSFILTER_LOGIN_URL", default_value = DEFAULT_LOGIN_URL, global = true)]
    pub login_url: String,

    /// Bearer token for the search API
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Refresh token used when the access token expires
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true, global = true)]
    pub refresh_token: Option<String>,

    /// Env file that refreshed tokens are written back into
    #[arg(long, env = "TOKEN_FILE", global = true)]
    pub token_file: Option<String>,

    /// Refresh the access token proactively once it is this old
    #[arg(long, env = "TOKEN_MAX_AGE_SECS", default_value_t = 12 * 3600, global = true)]
    pub token_max_age_secs: u64,

    /// Seconds to let article pages run their JavaScript before reading the DOM
    #[arg(long, env = "PAGE_LOAD_WAIT_SECS", default_value_t = 5, global = true)]
    pub page_load_wait_secs: u64,

    /// newsfilter.io account email, used when tokens must be obtained by logging in
    #[arg(long, env = "NEWSFILTER_EMAIL", global = true)]
    pub email: Option<String>,

    /// newsfilter.io account password
    #[arg(long, env = "NEWSFILTER_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// How article pages are fetched
    #[arg(long, env = "RENDER_MODE", value_enum, default_value_t = RenderMode::Browser, global = true)]
    pub render_mode: RenderMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve `/health` and `/api/news/{symbol}` over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: String,
    },

    /// Fetch articles for one ticker and print them
    Fetch {
        /// Ticker symbol, e.g. ALG
        symbol: String,

        /// Skip the today/yesterday window and print every search hit
        #[arg(long)]
        all: bool,

        /// Do not render article pages
        #[arg(long)]
        no_content: bool,

        /// Also write the result as JSON under this directory
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },

    /// Log in through headless Chrome and capture a fresh token pair
    Login {
        /// Persist the captured tokens into the token file (default `.env`)
        #[arg(long)]
        write_env: bool,
    },

    /// Exchange the configured refresh token for a new token pair
    Refresh,
}
