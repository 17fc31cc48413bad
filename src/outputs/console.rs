//! Human-readable article listing for the `fetch` subcommand.

use crate::models::ArticlesResponse;
use crate::utils::preview;
use std::fmt::Write;

const CONTENT_PREVIEW_CHARS: usize = 100;

/// Render the listing printed by `fetch`.
pub fn format_articles(resp: &ArticlesResponse) -> String {
    let mut out = String::new();
    if resp.articles.is_empty() {
        out.push_str("No articles available for today and yesterday\n");
        return out;
    }

    for (i, article) in resp.articles.iter().enumerate() {
        let na = "N/A";
        // Writing to a String cannot fail.
        let _ = writeln!(out, "\nArticle {}", i + 1);
        let _ = writeln!(out, "Published At : {}", article.publishedAt);
        let _ = writeln!(out, "Title        : {}", article.title);
        let _ = writeln!(
            out,
            "Description  : {}",
            article.description.as_deref().unwrap_or(na)
        );
        let _ = writeln!(out, "Source       : {}", article.source_name().unwrap_or(na));
        let _ = writeln!(out, "Image URL    : {}", article.imageUrl.as_deref().unwrap_or(na));
        let _ = writeln!(out, "Source URL   : {}", article.sourceUrl.as_deref().unwrap_or(na));
        let _ = writeln!(out, "Newsfilter   : {}", article.url);
        match article.html_content.as_deref() {
            Some(content) => {
                let _ = writeln!(out, "Content      : {}...", preview(content, CONTENT_PREVIEW_CHARS));
            }
            None => {
                let _ = writeln!(out, "Content      : {}", na);
            }
        }
    }
    out
}

/// Print the listing to stdout.
pub fn print_articles(resp: &ArticlesResponse) {
    print!("{}", format_articles(resp));
}
