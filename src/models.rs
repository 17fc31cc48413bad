//! Data models for newsfilter.io articles and API payloads.
//!
//! This module defines the wire types exchanged with the newsfilter.io private API
//! and served back from the HTTP endpoint:
//! - [`Article`]: One search hit, optionally carrying the rendered article text
//! - [`ArticlesResponse`]: The list wrapper used by the search API and by `/api/news`
//! - [`SearchRequest`], [`RefreshRequest`]: Action payloads POSTed to the API
//! - [`TokenPair`]: Access/refresh tokens returned by login and refresh
//!
//! The API speaks camelCase, hence the `#[allow(non_snake_case)]` attributes.

use serde::{Deserialize, Serialize};

/// Number of hits requested per search.
pub const SEARCH_PAGE_SIZE: u32 = 50;

/// Publisher of an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single article as returned by the search API.
///
/// `html_content` is never sent by the API; it is filled in after the article
/// page has been rendered and its body text extracted.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Publication timestamp, RFC 3339-ish (`Z`, `+00:00` or `+0000` offsets).
    pub publishedAt: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<ArticleSource>,
    #[serde(default)]
    pub imageUrl: Option<String>,
    /// Link to the original publisher.
    #[serde(default)]
    pub sourceUrl: Option<String>,
    /// Link to the article page on newsfilter.io.
    pub url: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Extracted body text of the rendered article page.
    #[serde(default)]
    pub html_content: Option<String>,
}

impl Article {
    /// Name of the publisher, if the API sent one.
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }
}

/// List of articles, as returned by search and by the HTTP endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// `filterArticles` action payload.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub isPublic: bool,
    pub queryString: String,
    pub from: u32,
    pub size: u32,
}

impl SearchRequest {
    /// Build the first-page search for a query string.
    pub fn filter_articles(query_string: String) -> Self {
        Self {
            kind: "filterArticles",
            isPublic: false,
            queryString: query_string,
            from: 0,
            size: SEARCH_PAGE_SIZE,
        }
    }
}

/// `refreshTokens` action payload.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub refreshToken: &'a str,
}

impl<'a> RefreshRequest<'a> {
    pub fn new(refresh_token: &'a str) -> Self {
        Self {
            kind: "refreshTokens",
            refreshToken: refresh_token,
        }
    }
}

/// Access and refresh tokens issued by newsfilter.io.
#[allow(non_snake_case)]
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenPair {
    pub accessToken: String,
    pub refreshToken: String,
}

// Tokens are credentials; keep them out of debug logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("accessToken", &"<redacted>")
            .field("refreshToken", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserialization_from_api_shape() {
        let json = r#"{
            "id": "abc123",
            "publishedAt": "2025-06-12T13:05:00Z",
            "title": "Alamo Group Announces Quarterly Dividend",
            "description": "The board declared a dividend.",
            "source": {"id": "globe-newswire", "name": "GlobeNewswire"},
            "imageUrl": "https://example.com/img.png",
            "sourceUrl": "https://www.globenewswire.com/news-release/1",
            "url": "https://newsfilter.io/articles/alamo-dividend-1",
            "symbols": ["ALG"],
            "industries": ["Machinery"]
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.title, "Alamo Group Announces Quarterly Dividend");
        assert_eq!(article.source_name(), Some("GlobeNewswire"));
        assert_eq!(article.symbols, vec!["ALG".to_string()]);
        assert!(article.html_content.is_none());
    }

    #[test]
    fn test_article_minimal_fields() {
        let json = r#"{"publishedAt": "2025-06-12T13:05:00Z", "title": "T", "url": "https://newsfilter.io/a"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert!(article.description.is_none());
        assert!(article.source_name().is_none());
        assert!(article.symbols.is_empty());
    }

    #[test]
    fn test_articles_response_tolerates_missing_list() {
        let resp: ArticlesResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(resp.articles.is_empty());
    }

    #[test]
    fn test_html_content_serialized_snake_case() {
        let article = Article {
            publishedAt: "2025-06-12T13:05:00Z".to_string(),
            title: "T".to_string(),
            description: None,
            source: None,
            imageUrl: None,
            sourceUrl: None,
            url: "https://newsfilter.io/a".to_string(),
            symbols: vec![],
            html_content: Some("Body".to_string()),
        };
        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["html_content"], "Body");
        assert_eq!(value["publishedAt"], "2025-06-12T13:05:00Z");
    }

    #[test]
    fn test_search_request_payload() {
        let req = SearchRequest::filter_articles("symbols:\"AAPL\"".to_string());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "filterArticles",
                "isPublic": false,
                "queryString": "symbols:\"AAPL\"",
                "from": 0,
                "size": 50
            })
        );
    }

    #[test]
    fn test_refresh_request_payload() {
        let value = serde_json::to_value(RefreshRequest::new("r-token")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "refreshTokens", "refreshToken": "r-token"})
        );
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let pair = TokenPair {
            accessToken: "secret-a".to_string(),
            refreshToken: "secret-r".to_string(),
        };
        let dbg = format!("{:?}", pair);
        assert!(!dbg.contains("secret"));
    }
}
