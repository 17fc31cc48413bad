//! Bearer-token bookkeeping for the newsfilter.io private API.
//!
//! The API authenticates with a short-lived access token plus a refresh token.
//! [`TokenManager`] holds both behind an async lock, refreshes proactively once
//! the access token is older than the configured maximum age, and refreshes on
//! demand when the API rejects a token. Refreshed tokens can be written back to
//! an env file so a restart picks them up.

use crate::config::{update_env_file, Settings};
use crate::error::{NewsfilterError, Result};
use crate::models::{RefreshRequest, TokenPair};
use crate::utils::truncate_for_log;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use url::Url;

/// Current token pair and when it was obtained.
pub struct TokenStore {
    access: Option<String>,
    refresh: Option<String>,
    last_refresh: Instant,
}

impl TokenStore {
    /// Tokens supplied at startup are treated as freshly issued.
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self {
            access,
            refresh,
            last_refresh: Instant::now(),
        }
    }

    /// Whether the pair is older than `max_age` and should be rotated before use.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.last_refresh.elapsed() > max_age
    }

    fn needs_refresh(&self, max_age: Duration) -> bool {
        self.access.is_none() || self.is_stale(max_age)
    }

    fn install(&mut self, pair: TokenPair) {
        self.access = Some(pair.accessToken);
        self.refresh = Some(pair.refreshToken);
        self.last_refresh = Instant::now();
    }
}

/// Shared, self-refreshing token pair.
pub struct TokenManager {
    http: reqwest::Client,
    refresh_url: Url,
    max_age: Duration,
    token_file: Option<PathBuf>,
    store: RwLock<TokenStore>,
}

impl TokenManager {
    /// Seed the manager with the tokens from `settings`.
    ///
    /// # Arguments
    ///
    /// * `http` - Client used for refresh calls, shared with the search client
    /// * `settings` - Supplies the refresh URL, maximum token age, initial tokens
    ///   and optional token file
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            refresh_url: settings.token_refresh_url.clone(),
            max_age: settings.token_max_age,
            token_file: settings.token_file.clone(),
            store: RwLock::new(TokenStore::new(
                settings.access_token.clone(),
                settings.refresh_token.clone(),
            )),
        }
    }

    /// Current access token, refreshing first if it is missing or too old.
    ///
    /// If a proactive refresh of an aged token fails, the current token is
    /// returned anyway; the API's 401 decides whether it has really expired.
    ///
    /// # Returns
    ///
    /// The bearer token, or an error when no token exists and none could be obtained.
    pub async fn access_token(&self) -> Result<String> {
        {
            let store = self.store.read().await;
            if !store.needs_refresh(self.max_age) {
                if let Some(token) = &store.access {
                    return Ok(token.clone());
                }
            }
        }

        let mut store = self.store.write().await;
        // Another task may have refreshed while we waited for the lock.
        if store.needs_refresh(self.max_age) {
            warn!("Access token missing or possibly expired; refreshing");
            if let Err(e) = self.refresh_locked(&mut store).await {
                let Some(current) = &store.access else {
                    return Err(e);
                };
                warn!(error = %e, "Proactive refresh failed; using current access token");
                return Ok(current.clone());
            }
        }
        store.access.clone().ok_or(NewsfilterError::MissingToken("access"))
    }

    /// Current refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.store.read().await.refresh.clone()
    }

    /// Unconditionally exchange the refresh token for a new pair.
    pub async fn refresh(&self) -> Result<()> {
        let mut store = self.store.write().await;
        self.refresh_locked(&mut store).await
    }

    /// Refresh after the API rejected `rejected`.
    ///
    /// If the stored token no longer equals `rejected`, a concurrent caller has
    /// already refreshed and nothing is sent.
    pub async fn refresh_rejected(&self, rejected: &str) -> Result<()> {
        let mut store = self.store.write().await;
        if store.access.as_deref().is_some_and(|current| current != rejected) {
            info!("Token already refreshed by a concurrent request");
            return Ok(());
        }
        self.refresh_locked(&mut store).await
    }

    /// Replace both tokens, e.g. after a browser login.
    pub async fn install(&self, pair: TokenPair) {
        self.store.write().await.install(pair.clone());
        self.persist(&pair).await;
    }

    #[instrument(level = "info", skip_all, fields(url = %self.refresh_url))]
    async fn refresh_locked(&self, store: &mut TokenStore) -> Result<()> {
        let refresh_token = store
            .refresh
            .clone()
            .ok_or(NewsfilterError::MissingToken("refresh"))?;

        let response = self
            .http
            .post(self.refresh_url.clone())
            .json(&RefreshRequest::new(&refresh_token))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "Token refresh rejected"
            );
            return Err(NewsfilterError::TokenRefresh {
                status: status.as_u16(),
                body,
            });
        }

        let pair: TokenPair = serde_json::from_str(&response.text().await?)?;
        store.install(pair.clone());
        info!("Token refreshed successfully");
        self.persist(&pair).await;
        Ok(())
    }

    async fn persist(&self, pair: &TokenPair) {
        let Some(path) = &self.token_file else {
            return;
        };
        for (key, value) in [
            ("ACCESS_TOKEN", pair.accessToken.as_str()),
            ("REFRESH_TOKEN", pair.refreshToken.as_str()),
        ] {
            if let Err(e) = update_env_file(path, key, value).await {
                warn!(path = %path.display(), key, error = %e, "Failed to persist token");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(server: &mockito::Server) -> TokenManager {
        TokenManager::new(reqwest::Client::new(), &Settings::for_base_url(&server.url()))
    }

    #[test]
    fn test_token_store_staleness() {
        let store = TokenStore::new(Some("a".into()), Some("r".into()));
        assert!(!store.is_stale(Duration::from_secs(60)));
        assert!(!store.needs_refresh(Duration::from_secs(60)));

        std::thread::sleep(Duration::from_millis(5));
        assert!(store.is_stale(Duration::from_millis(1)));
        assert!(store.needs_refresh(Duration::from_millis(1)));

        let empty = TokenStore::new(None, Some("r".into()));
        assert!(empty.needs_refresh(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_access_token_fresh_does_not_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/actions")
            .expect(0)
            .create_async()
            .await;

        let tokens = manager(&server);
        assert_eq!(tokens.access_token().await.unwrap(), "access-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_stores_new_pair() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/actions")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "type": "refreshTokens",
                "refreshToken": "refresh-1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accessToken": "access-2", "refreshToken": "refresh-2", "expiresIn": 86400}"#)
            .create_async()
            .await;

        let tokens = manager(&server);
        tokens.refresh().await.unwrap();

        assert_eq!(tokens.access_token().await.unwrap(), "access-2");
        assert_eq!(tokens.refresh_token().await.as_deref(), Some("refresh-2"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/public/actions")
            .with_status(403)
            .with_body("invalid refresh token")
            .create_async()
            .await;

        let tokens = manager(&server);
        let err = tokens.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            NewsfilterError::TokenRefresh { status: 403, ref body } if body == "invalid refresh token"
        ));
        // The old token survives a failed refresh.
        assert_eq!(tokens.access_token().await.unwrap(), "access-1");
    }

    #[tokio::test]
    async fn test_stale_token_refreshes_before_use() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/actions")
            .with_status(200)
            .with_body(r#"{"accessToken": "access-2", "refreshToken": "refresh-2"}"#)
            .expect(1)
            .create_async()
            .await;

        let mut settings = Settings::for_base_url(&server.url());
        settings.token_max_age = Duration::from_millis(1);
        let tokens = TokenManager::new(reqwest::Client::new(), &settings);
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(tokens.access_token().await.unwrap(), "access-2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_proactive_refresh_keeps_current_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/actions")
            .with_status(503)
            .with_body("try later")
            .expect(1)
            .create_async()
            .await;

        let mut settings = Settings::for_base_url(&server.url());
        settings.token_max_age = Duration::from_millis(1);
        let tokens = TokenManager::new(reqwest::Client::new(), &settings);
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(tokens.access_token().await.unwrap(), "access-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_access_token_triggers_refresh() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/public/actions")
            .with_status(200)
            .with_body(r#"{"accessToken": "access-9", "refreshToken": "refresh-9"}"#)
            .create_async()
            .await;

        let mut settings = Settings::for_base_url(&server.url());
        settings.access_token = None;
        let tokens = TokenManager::new(reqwest::Client::new(), &settings);
        assert_eq!(tokens.access_token().await.unwrap(), "access-9");
    }

    #[tokio::test]
    async fn test_no_tokens_at_all() {
        let server = mockito::Server::new_async().await;
        let mut settings = Settings::for_base_url(&server.url());
        settings.access_token = None;
        settings.refresh_token = None;
        let tokens = TokenManager::new(reqwest::Client::new(), &settings);
        assert!(matches!(
            tokens.access_token().await.unwrap_err(),
            NewsfilterError::MissingToken("refresh")
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejected_skips_when_already_rotated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/actions")
            .expect(0)
            .create_async()
            .await;

        let tokens = manager(&server);
        tokens.refresh_rejected("some-older-token").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_persists_to_token_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/public/actions")
            .with_status(200)
            .with_body(r#"{"accessToken": "access-2", "refreshToken": "refresh-2"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut settings = Settings::for_base_url(&server.url());
        settings.token_file = Some(path.clone());

        let tokens = TokenManager::new(reqwest::Client::new(), &settings);
        tokens.refresh().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "ACCESS_TOKEN=access-2\nREFRESH_TOKEN=refresh-2\n");
    }
}
