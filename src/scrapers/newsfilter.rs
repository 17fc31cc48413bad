//! Article body extraction for newsfilter.io article pages.
//!
//! Article pages are rendered client-side; once rendered, the story lives in a
//! single bootstrap column (`div.col-lg-10.col-lg-offset-1`) as a run of `<p>`
//! elements. Navigation, share widgets, and related links sit outside it.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static ARTICLE_COLUMN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.col-lg-10.col-lg-offset-1").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Extract the article text from a rendered page.
///
/// Paragraphs of the first article column are trimmed and joined with a blank
/// line; empty paragraphs are skipped.
///
/// # Returns
///
/// The article text, or an empty string for a page without the column.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Some(column) = document.select(&ARTICLE_COLUMN).next() else {
        debug!("No article column in page");
        return String::new();
    };

    let paragraphs: Vec<String> = column
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    debug!(paragraphs = paragraphs.len(), "Extracted article text");
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <nav><p>Home</p></nav>
          <div class="container">
            <div class="row">
              <div class="col-lg-10 col-lg-offset-1">
                <h1>Alamo Group Reports Results</h1>
                <p>  SEGUIN, Texas -- Alamo Group Inc. (NYSE: ALG) reported record sales.  </p>
                <p></p>
                <p>Net income rose <b>12%</b> year over year.</p>
                <div class="quote"><p>"We are pleased," said the CEO.</p></div>
              </div>
            </div>
          </div>
          <footer><p>Copyright</p></footer>
        </body></html>
    "#;

    #[test]
    fn test_extracts_paragraphs_in_order() {
        let text = extract_article_text(PAGE);
        assert_eq!(
            text,
            "SEGUIN, Texas -- Alamo Group Inc. (NYSE: ALG) reported record sales.\n\n\
             Net income rose 12% year over year.\n\n\
             \"We are pleased,\" said the CEO."
        );
    }

    #[test]
    fn test_ignores_text_outside_column() {
        let text = extract_article_text(PAGE);
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Alamo Group Reports Results"));
    }

    #[test]
    fn test_missing_column_yields_empty() {
        assert_eq!(extract_article_text("<html><body><p>Loading…</p></body></html>"), "");
    }

    #[test]
    fn test_uses_first_column_only() {
        let html = r#"
            <div class="col-lg-10 col-lg-offset-1"><p>first</p></div>
            <div class="col-lg-10 col-lg-offset-1"><p>second</p></div>
        "#;
        assert_eq!(extract_article_text(html), "first");
    }
}
