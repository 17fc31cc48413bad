//! Runtime settings resolved from the CLI and environment, plus env-file token write-back.

use crate::cli::Cli;
use crate::error::{NewsfilterError, Result};
use crate::login::Credentials;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_SEARCH_API_URL: &str = "https://api.newsfilter.io/actions";
pub const DEFAULT_TOKEN_REFRESH_URL: &str = "https://api.newsfilter.io/public/actions";
pub const DEFAULT_LOGIN_URL: &str = "https://newsfilter.io/login";

/// How article pages are turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    /// Headless Chrome; needed because article bodies are rendered client-side.
    Browser,
    /// Plain authenticated GET.
    Http,
}

/// Connection and rendering settings shared by every subcommand.
#[derive(Clone)]
pub struct Settings {
    pub search_api_url: Url,
    pub token_refresh_url: Url,
    pub login_url: Url,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub token_max_age: Duration,
    pub page_load_wait: Duration,
    pub render_mode: RenderMode,
    pub credentials: Option<Credentials>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("search_api_url", &self.search_api_url.as_str())
            .field("token_refresh_url", &self.token_refresh_url.as_str())
            .field("login_url", &self.login_url.as_str())
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_file", &self.token_file)
            .field("token_max_age", &self.token_max_age)
            .field("page_load_wait", &self.page_load_wait)
            .field("render_mode", &self.render_mode)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Settings {
    /// Validate CLI/env values into settings.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            search_api_url: parse_url("SEARCH_API_URL", &cli.search_api_url)?,
            token_refresh_url: parse_url("TOKEN_REFRESH_URL", &cli.token_refresh_url)?,
            login_url: parse_url("NEWSFILTER_LOGIN_URL", &cli.login_url)?,
            access_token: non_empty(cli.access_token.as_deref()),
            refresh_token: non_empty(cli.refresh_token.as_deref()),
            token_file: non_empty(cli.token_file.as_deref()).map(PathBuf::from),
            token_max_age: Duration::from_secs(cli.token_max_age_secs),
            page_load_wait: Duration::from_secs(cli.page_load_wait_secs),
            render_mode: cli.render_mode,
            credentials: match (non_empty(cli.email.as_deref()), cli.password.as_deref()) {
                (Some(email), Some(password)) if !password.is_empty() => Some(Credentials {
                    email,
                    password: password.to_string(),
                }),
                _ => None,
            },
        })
    }

    /// Settings pointing at a local base URL, for tests.
    #[cfg(test)]
    pub fn for_base_url(base: &str) -> Self {
        Self {
            search_api_url: Url::parse(&format!("{}/actions", base)).unwrap(),
            token_refresh_url: Url::parse(&format!("{}/public/actions", base)).unwrap(),
            login_url: Url::parse(&format!("{}/login", base)).unwrap(),
            access_token: Some("access-1".to_string()),
            refresh_token: Some("refresh-1".to_string()),
            token_file: None,
            token_max_age: Duration::from_secs(12 * 3600),
            page_load_wait: Duration::from_secs(0),
            render_mode: RenderMode::Http,
            credentials: None,
        }
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| NewsfilterError::Config(format!("{} is not a valid URL ({}): {}", name, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(NewsfilterError::Config(format!(
            "{} must be http(s), got scheme {:?}",
            name, other
        ))),
    }
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Whether `line` assigns `key`, in any of the forms dotenv files accept
/// (`KEY=v`, `KEY = v`, `export KEY=v`). Returns the `export ` prefix to keep.
fn assigns_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let body = line.trim_start();
    let (export, rest) = match body.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => ("export ", rest.trim_start()),
        _ => ("", body),
    };
    rest.strip_prefix(key)?
        .trim_start()
        .starts_with('=')
        .then_some(export)
}

/// Set `key=value` in a dotenv-style file.
///
/// An existing assignment of `key` is replaced in place (keeping an `export`
/// prefix); otherwise the line is appended. Other lines, comments included, are
/// kept verbatim. The file is created if it does not exist.
///
/// # Arguments
///
/// * `path` - Env file to edit
/// * `key` - Variable name, e.g. `ACCESS_TOKEN`
/// * `value` - New value, written unquoted
#[instrument(level = "debug", skip(value), fields(path = %path.display()))]
pub async fn update_env_file(path: &Path, key: &str, value: &str) -> Result<()> {
    let existing = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut updated = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| match assigns_key(line, key) {
            Some(export) => {
                updated = true;
                format!("{}{}={}", export, key, value)
            }
            None => line.to_string(),
        })
        .collect();
    if !updated {
        lines.push(format!("{}={}", key, value));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out).await?;
    debug!(key, replaced = updated, "Updated env file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_settings_from_cli() {
        let cli = Cli::parse_from([
            "ticker_news",
            "--search-api-url",
            "https://api.example.com/actions",
            "--access-token",
            "  ",
            "--refresh-token",
            "r",
            "--token-max-age-secs",
            "60",
            "fetch",
            "ALG",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.search_api_url.as_str(), "https://api.example.com/actions");
        assert!(settings.access_token.is_none());
        assert_eq!(settings.refresh_token.as_deref(), Some("r"));
        assert_eq!(settings.token_max_age, Duration::from_secs(60));
    }

    #[test]
    fn test_settings_credentials_need_both_parts() {
        let cli = Cli::parse_from(["ticker_news", "--email", "a@b.c", "--password", "", "serve"]);
        assert!(Settings::from_cli(&cli).unwrap().credentials.is_none());

        let cli = Cli::parse_from(["ticker_news", "--email", "a@b.c", "--password", "pw", "serve"]);
        let creds = Settings::from_cli(&cli).unwrap().credentials.unwrap();
        assert_eq!(creds.email, "a@b.c");
    }

    #[test]
    fn test_settings_rejects_bad_url() {
        let cli = Cli::parse_from([
            "ticker_news",
            "--token-refresh-url",
            "ftp://api.example.com",
            "serve",
        ]);
        let err = Settings::from_cli(&cli).unwrap_err();
        assert!(matches!(err, NewsfilterError::Config(ref m) if m.contains("TOKEN_REFRESH_URL")));
    }

    #[test]
    fn test_settings_debug_hides_tokens() {
        let settings = Settings::for_base_url("http://localhost:1");
        let dbg = format!("{:?}", settings);
        assert!(!dbg.contains("access-1"));
        assert!(dbg.contains("has_access_token: true"));
    }

    #[tokio::test]
    async fn test_update_env_file_replaces_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "# tokens\nACCESS_TOKEN=old\nSEARCH_API_URL=https://x\n")
            .await
            .unwrap();

        update_env_file(&path, "ACCESS_TOKEN", "new").await.unwrap();
        update_env_file(&path, "REFRESH_TOKEN", "r2").await.unwrap();

        let contents = fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            contents,
            "# tokens\nACCESS_TOKEN=new\nSEARCH_API_URL=https://x\nREFRESH_TOKEN=r2\n"
        );
    }

    #[tokio::test]
    async fn test_update_env_file_handles_export_and_spaced_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "export ACCESS_TOKEN=old\nREFRESH_TOKEN = old\n")
            .await
            .unwrap();

        update_env_file(&path, "ACCESS_TOKEN", "a2").await.unwrap();
        update_env_file(&path, "REFRESH_TOKEN", "r2").await.unwrap();

        assert_eq!(
            fs::read_to_string(&path).await.unwrap(),
            "export ACCESS_TOKEN=a2\nREFRESH_TOKEN=r2\n"
        );
    }

    #[test]
    fn test_assigns_key() {
        assert_eq!(assigns_key("ACCESS_TOKEN=x", "ACCESS_TOKEN"), Some(""));
        assert_eq!(assigns_key("  ACCESS_TOKEN = x", "ACCESS_TOKEN"), Some(""));
        assert_eq!(assigns_key("export ACCESS_TOKEN=x", "ACCESS_TOKEN"), Some("export "));
        assert_eq!(assigns_key("ACCESS_TOKEN_OLD=x", "ACCESS_TOKEN"), None);
        assert_eq!(assigns_key("exportACCESS_TOKEN=x", "ACCESS_TOKEN"), None);
        assert_eq!(assigns_key("# ACCESS_TOKEN=x", "ACCESS_TOKEN"), None);
    }

    #[tokio::test]
    async fn test_update_env_file_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.env");
        update_env_file(&path, "ACCESS_TOKEN", "a").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "ACCESS_TOKEN=a\n");
    }

    #[tokio::test]
    async fn test_update_env_file_does_not_touch_prefixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "ACCESS_TOKEN_OLD=keep\n").await.unwrap();
        update_env_file(&path, "ACCESS_TOKEN", "a").await.unwrap();
        assert_eq!(
            fs::read_to_string(&path).await.unwrap(),
            "ACCESS_TOKEN_OLD=keep\nACCESS_TOKEN=a\n"
        );
    }
}
