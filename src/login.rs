//! Token capture by logging in through headless Chrome.
//!
//! newsfilter.io has no documented token endpoint. The web frontend logs in
//! through its own action API and receives the token pair in the response, so
//! we drive the real login form and read that response off the network.

use crate::error::{NewsfilterError, Result};
use crate::models::TokenPair;
use crate::scrapers::browser::launch;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use headless_chrome::protocol::cdp::Network::GetResponseBodyReturnObject;
use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Responses from this endpoint may carry the token pair.
const TOKEN_ENDPOINT_MARKER: &str = "api.newsfilter.io/public/actions";
const EMAIL_INPUT: &str = "#sign-up-email";
const PASSWORD_INPUT: &str = "#sign-up-password";
const SUBMIT_BUTTON_XPATH: &str = r#"//*[@id="root"]/div[2]/div/div/div[3]/div[3]/button"#;
/// Let the login page's scripts mount the form.
const FORM_SETTLE: Duration = Duration::from_secs(2);
const MIN_CAPTURE_WAIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Account used for browser login.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw bytes of a CDP response body.
fn response_bytes(body: &str, base64_encoded: bool) -> Option<Vec<u8>> {
    if base64_encoded {
        BASE64.decode(body).ok()
    } else {
        Some(body.as_bytes().to_vec())
    }
}

/// A token pair, if `body` is a JSON object holding both tokens.
pub fn token_pair_from_body(body: &[u8]) -> Option<TokenPair> {
    serde_json::from_slice::<TokenPair>(body)
        .ok()
        .filter(|pair| !pair.accessToken.is_empty() && !pair.refreshToken.is_empty())
}

/// Log in at `login_url` and return the token pair the site issues.
#[instrument(level = "info", skip(credentials), fields(email = %credentials.email))]
pub async fn browser_login(
    login_url: &Url,
    credentials: Credentials,
    capture_wait: Duration,
) -> Result<TokenPair> {
    let login_url = login_url.clone();
    let pair = tokio::task::spawn_blocking(move || {
        login_blocking(&login_url, &credentials, capture_wait.max(MIN_CAPTURE_WAIT))
    })
    .await
    .map_err(NewsfilterError::browser)??;
    info!("Captured token pair from login response");
    Ok(pair)
}

fn login_blocking(login_url: &Url, credentials: &Credentials, capture_wait: Duration) -> Result<TokenPair> {
    let profile = tempfile::tempdir()?;
    let browser = launch(Some(profile.path().to_path_buf()))?;
    let tab = browser.new_tab().map_err(NewsfilterError::browser)?;

    let captured: Arc<Mutex<Option<TokenPair>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    tab.register_response_handling(
        "token-capture",
        Box::new(
            move |params: ResponseReceivedEventParams,
                  fetch_body: &dyn Fn() -> anyhow::Result<GetResponseBodyReturnObject>| {
                if !params.response.url.contains(TOKEN_ENDPOINT_MARKER) {
                    return;
                }
                let body = match fetch_body() {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(url = %params.response.url, error = %e, "Could not read response body");
                        return;
                    }
                };
                let Some(pair) = response_bytes(&body.body, body.base_64_encoded)
                    .as_deref()
                    .and_then(token_pair_from_body)
                else {
                    debug!(url = %params.response.url, "Action response without tokens");
                    return;
                };
                if let Ok(mut slot) = sink.lock() {
                    *slot = Some(pair);
                }
            },
        ),
    )
    .map_err(NewsfilterError::browser)?;

    tab.navigate_to(login_url.as_str())
        .map_err(NewsfilterError::browser)?;
    tab.wait_until_navigated().map_err(NewsfilterError::browser)?;
    std::thread::sleep(FORM_SETTLE);

    tab.wait_for_element(EMAIL_INPUT)
        .map_err(NewsfilterError::browser)?
        .type_into(&credentials.email)
        .map_err(NewsfilterError::browser)?;
    tab.wait_for_element(PASSWORD_INPUT)
        .map_err(NewsfilterError::browser)?
        .type_into(&credentials.password)
        .map_err(NewsfilterError::browser)?;
    tab.wait_for_xpath(SUBMIT_BUTTON_XPATH)
        .map_err(NewsfilterError::browser)?
        .click()
        .map_err(NewsfilterError::browser)?;
    debug!("Submitted login form");

    let deadline = Instant::now() + capture_wait;
    loop {
        let pair = captured
            .lock()
            .map_err(|_| NewsfilterError::LoginFailed("token capture lock poisoned".to_string()))?
            .take();
        if let Some(pair) = pair {
            return Ok(pair);
        }
        if Instant::now() >= deadline {
            warn!(waited = ?capture_wait, "No token response observed");
            return Err(NewsfilterError::LoginFailed(format!(
                "no response from {} carried tokens within {:?}",
                TOKEN_ENDPOINT_MARKER, capture_wait
            )));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
