//! JSON output of fetched articles.
//!
//! # Output Structure
//!
//! Files are organized by New York calendar date with one file per ticker:
//! ```text
//! json_output_dir/
//! └── 2025-06-12/
//!     ├── ALG.json
//!     └── AAPL.json
//! ```
//!
//! Re-running for the same ticker on the same day overwrites its file.

use crate::models::ArticlesResponse;
use crate::utils::ensure_writable_dir;
use chrono::NaiveDate;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Path an article list for `symbol` on `date` is written to.
pub fn output_path(json_output_dir: &str, symbol: &str, date: NaiveDate) -> PathBuf {
    PathBuf::from(json_output_dir)
        .join(date.to_string())
        .join(format!("{}.json", symbol))
}

/// Write an [`ArticlesResponse`] under `{json_output_dir}/{date}/{symbol}.json`.
///
/// Creates the dated directory first.
///
/// # Arguments
///
/// * `articles` - Articles to serialize
/// * `json_output_dir` - Root output directory
/// * `symbol` - Normalized ticker, used as the file name
/// * `date` - Directory date, normally today in New York
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, %symbol))]
pub async fn write_articles(
    articles: &ArticlesResponse,
    json_output_dir: &str,
    symbol: &str,
    date: NaiveDate,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;

    let path = output_path(json_output_dir, symbol, date);
    if let Some(dir) = path.parent().and_then(|p| p.to_str()) {
        ensure_writable_dir(dir).await?;
    }

    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), count = articles.articles.len(), "Wrote article JSON");

    Ok(path)
}
