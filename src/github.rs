use crate::error::{GitHubUsersError, Result};
use crate::models::{RateLimitState, User};
use crate::types::parse_users_page;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const API_BASE_URL: &str = "https://api.github.com";
pub const PER_PAGE: u32 = 30;
const LOW_RATE_LIMIT: u32 = 10;

/// A paginated, read-only source of GitHub users.
///
/// Pages are ordered by ascending `id` and hold at most `per_page` records;
/// an empty page means the sequence is exhausted. Implementations never retry.
pub trait UserSource: Send + Sync + 'static {
    fn fetch_page(&self, since: u64) -> impl Future<Output = Result<Vec<User>>> + Send;
}

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub base_url: String,
    pub per_page: u32,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            per_page: PER_PAGE,
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct GitHubClient {
    client: Client,
    users_url: Url,
    per_page: u32,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self> {
        if !(1..=100).contains(&config.per_page) {
            return Err(GitHubUsersError::ConfigError(format!(
                "per_page must be between 1 and 100, got {}",
                config.per_page
            )));
        }

        let client = Client::builder()
            .user_agent("GitHub Users Browser/0.1.0")
            .timeout(config.timeout)
            .build()?;

        let mut base_url = config.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let users_url = Url::parse(&base_url)?.join("users")?;

        Ok(GitHubClient {
            client,
            users_url,
            per_page: config.per_page,
            token: config.token,
        })
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// URL of the page that starts after `since`
    pub fn page_url(&self, since: u64, per_page: u32) -> Url {
        let mut url = self.users_url.clone();
        url.query_pairs_mut()
            .append_pair("since", &since.to_string())
            .append_pair("per_page", &per_page.to_string());
        url
    }

    async fn make_request(&self, url: Url) -> Result<Response> {
        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github.v3+json");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request.send().await.map_err(GitHubUsersError::from_request)?;

        let rate_limit = rate_limit_state(response.headers());
        if rate_limit.remaining < LOW_RATE_LIMIT {
            warn!(
                remaining = rate_limit.remaining,
                reset_time = %rate_limit.reset_time,
                "GitHub rate limit is low"
            );
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(GitHubUsersError::ApiError {
            status: status.as_u16(),
            message: if error_text.is_empty() {
                format!("request to {} failed", url)
            } else {
                error_text
            },
        })
    }

    /// Fetch one page of users with ids strictly greater than `since`
    pub async fn fetch_users_page(&self, since: u64, per_page: u32) -> Result<Vec<User>> {
        let url = self.page_url(since, per_page);
        debug!(%url, "Fetching users page");

        let response = self.make_request(url).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GitHubUsersError::MalformedResponse(e.to_string()))?;

        let users = parse_users_page(body)?;
        debug!(since, count = users.len(), "Fetched users page");

        Ok(users)
    }
}

/// Reads the rate limit headers of a GitHub response.
///
/// A missing `X-RateLimit-Remaining` counts as unlimited and a missing reset
/// time as one hour from now.
pub fn rate_limit_state(headers: &HeaderMap) -> RateLimitState {
    let remaining = headers
        .get("X-RateLimit-Remaining")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(u32::MAX);

    let reset_time = headers
        .get("X-RateLimit-Reset")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
        .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));

    RateLimitState {
        remaining,
        reset_time,
    }
}

impl UserSource for GitHubClient {
    async fn fetch_page(&self, since: u64) -> Result<Vec<User>> {
        self.fetch_users_page(since, self.per_page).await
    }
}
