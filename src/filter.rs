//! Publication-date parsing and the "today and yesterday" window.
//!
//! The window is evaluated in US market time (America/New_York), so an article
//! stamped `2025-06-13T02:00:00Z` belongs to June 12.

use crate::models::Article;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Calendar the date window is evaluated in.
pub const MARKET_TZ: Tz = chrono_tz::America::New_York;

/// Parse a `publishedAt` stamp.
///
/// Accepts RFC 3339 (`Z` or `+00:00`), the compact `+0000` offset, and, as a
/// last resort, a bare local timestamp which is taken to be UTC.
pub fn parse_published_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// Calendar date of an article's publication in `tz`.
pub fn published_date(article: &Article, tz: Tz) -> Option<NaiveDate> {
    parse_published_at(&article.publishedAt).map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Keep articles published between `start` and `end`, both inclusive.
///
/// Articles whose date cannot be parsed are dropped with a warning. Order is preserved.
///
/// # Arguments
///
/// * `articles` - Search hits to filter
/// * `start`, `end` - Calendar bounds, compared against dates in `tz`
/// * `tz` - Zone publication timestamps are converted into
pub fn filter_by_date_range(
    articles: Vec<Article>,
    start: NaiveDate,
    end: NaiveDate,
    tz: Tz,
) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|article| match published_date(article, tz) {
            Some(date) => start <= date && date <= end,
            None => {
                warn!(published_at = %article.publishedAt, url = %article.url, "Unparsable publication date");
                false
            }
        })
        .collect()
}

/// `(yesterday, today)` as seen in `tz` at instant `now`.
pub fn today_and_yesterday(now: DateTime<Utc>, tz: Tz) -> (NaiveDate, NaiveDate) {
    let today = now.with_timezone(&tz).date_naive();
    (today - Duration::days(1), today)
}
