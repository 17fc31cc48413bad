//! News endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{error, info};

use super::AppState;
use crate::error::NewsfilterError;
use crate::models::ArticlesResponse;

/// Error body: `{"detail": "..."}`.
pub struct ApiError(NewsfilterError);

impl From<NewsfilterError> for ApiError {
    fn from(e: NewsfilterError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            NewsfilterError::InvalidSymbol(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Create news routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/news/{symbol}", get(get_news))
}

/// GET /api/news/{symbol} - today's and yesterday's articles with body text
async fn get_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    match state
        .news_service
        .get_today_and_yesterday_articles(&symbol)
        .await
    {
        Ok(resp) => {
            info!(%symbol, count = resp.articles.len(), "Served news");
            Ok(Json(resp))
        }
        Err(e) => {
            error!(%symbol, error = %e, "News request failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{app, test_support};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_news_returns_articles_in_window() {
        let mut server = mockito::Server::new_async().await;
        let now = chrono::Utc::now().to_rfc3339();
        let page_url = format!("{}/articles/1", server.url());
        server
            .mock("POST", "/actions")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "articles": [
                        crate::api::tests::article_json(&page_url, &now),
                        crate::api::tests::article_json("https://newsfilter.io/old", "2001-01-01T00:00:00Z")
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/articles/1")
            .with_status(200)
            .with_body(r#"<div class="col-lg-10 col-lg-offset-1"><p>Full text</p></div>"#)
            .create_async()
            .await;

        let (status, body) =
            test_support::get(app(test_support::state_for(&server)), "/api/news/alg").await;
        assert_eq!(status, StatusCode::OK);
        let articles = body["articles"].as_array().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0]["url"], page_url);
        assert_eq!(articles[0]["html_content"], "Full text");
    }

    #[tokio::test]
    async fn test_news_upstream_failure_is_500_with_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/actions")
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let (status, body) =
            test_support::get(app(test_support::state_for(&server)), "/api/news/ALG").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Failed to fetch articles: 500 upstream down");
    }

    #[tokio::test]
    async fn test_news_invalid_symbol_is_400() {
        let server = mockito::Server::new_async().await;
        let (status, body) =
            test_support::get(app(test_support::state_for(&server)), "/api/news/A%22B").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("Invalid ticker symbol"));
    }
}
