use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::link::next_page_url;
use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Media type that makes the star list include `starred_at`
const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("GitHub returned {status}, giving up: {body}")]
    Unavailable { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GitHubError {
    /// Failures that might go away if we ask again
    pub fn is_transient(&self) -> bool {
        match self {
            GitHubError::Unavailable { .. } | GitHubError::RateLimitExceeded => true,
            GitHubError::NetworkError(err) => {
                err.is_timeout() || err.is_connect() || err.is_request()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// One entry of the star list, as served with the star media type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarredRepo {
    /// `YYYY-MM-DDTHH:MM:SSZ`, kept as text so callers decide how strict to be
    pub starred_at: String,
    pub repo: GitHubRepo,
}

/// The slice of GitHub's repository object we actually use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One page of stars plus where to go next
#[derive(Debug, Clone)]
pub struct StarPage {
    pub stars: Vec<StarredRepo>,
    pub next: Option<String>,
}

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, GITHUB_API_BASE.to_string(), DEFAULT_TIMEOUT)
    }

    /// For GitHub Enterprise or testing with custom API URL
    pub fn with_base_url(
        token: Option<String>,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("bark/", env!("CARGO_PKG_VERSION"))),
        );

        // A stalled request must not hang the import forever
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Swap in a custom retry policy
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First page of a user's star list
    pub fn starred_url(&self, username: &str) -> String {
        format!(
            "{}/users/{}/starred",
            self.base_url,
            urlencoding::encode(username)
        )
    }

    /// Fetch one page of stars from `url`
    ///
    /// `url` is either [`starred_url`](Self::starred_url) or the `next`
    /// link of a previous page.
    pub async fn starred_page(&self, url: &str) -> Result<StarPage> {
        reqwest::Url::parse(url).map_err(|e| GitHubError::InvalidUrl(format!("{}: {}", url, e)))?;

        let page = with_retry(&self.retry_config, GitHubError::is_transient, || async {
            let mut request = self.client.get(url).header(ACCEPT, STAR_MEDIA_TYPE);

            if let Some(ref token) = self.token {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            }

            let response = request.send().await?;
            let status = response.status();

            if status == 404 {
                return Err(GitHubError::NotFound(url.to_string()));
            }

            if status == 401 {
                return Err(GitHubError::AuthRequired);
            }

            // GitHub signals an exhausted primary rate limit with a 403,
            // secondary limits with a 429
            if status == 429 || (status == 403 && rate_limit_exhausted(response.headers())) {
                return Err(GitHubError::RateLimitExceeded);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();

                if is_retryable_status(status) {
                    return Err(GitHubError::Unavailable {
                        status: status.as_u16(),
                        body,
                    });
                }

                return Err(GitHubError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page_url);

            let body = response.text().await?;
            let stars: Vec<StarredRepo> = serde_json::from_str(&body)?;

            Ok(StarPage { stars, next })
        })
        .await?;

        info!(
            url,
            count = page.stars.len(),
            has_next = page.next.is_some(),
            "Fetched page of stars"
        );
        debug!(next = ?page.next, "Next star page");

        Ok(page)
    }
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .map(|remaining| remaining.trim() == "0")
        .unwrap_or(false)
}
