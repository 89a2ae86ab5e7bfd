use crate::actors::UserListConfig;
use crate::connectivity::ProbeConfig;
use crate::error::{GitHubUsersError, Result};
use crate::github::GitHubClientConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "github-users-browser")]
#[command(about = "GitHub Users Browser - Pages through GitHub users with search and bookmarks")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Optional GitHub token, raises the rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Users per page (1-100)
    #[arg(long, env = "PER_PAGE", default_value_t = 30)]
    pub per_page: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Directory holding persisted bookmarks
    #[arg(long, env = "STORE_DIR", default_value = "./data")]
    pub store_dir: PathBuf,

    /// Keep bookmarks in memory only
    #[arg(long)]
    pub memory_store: bool,

    /// Port for the HTTP interface
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Quiet period before a search query is applied, in milliseconds
    #[arg(long, env = "SEARCH_DEBOUNCE_MS", default_value_t = 300)]
    pub search_debounce_ms: u64,

    /// Delay before retrying load-more after reconnecting, in milliseconds
    #[arg(long, env = "RECONNECT_SETTLE_MS", default_value_t = 1000)]
    pub reconnect_settle_ms: u64,

    /// host:port probed to decide whether we are online
    #[arg(long, env = "PROBE_ADDR", default_value = "api.github.com:443")]
    pub probe_addr: String,

    /// Seconds between connectivity probes
    #[arg(long, env = "PROBE_INTERVAL_SECS", default_value_t = 5)]
    pub probe_interval_secs: u64,
}

impl Cli {
    pub fn client_config(&self) -> Result<GitHubClientConfig> {
        if !(1..=100).contains(&self.per_page) {
            return Err(GitHubUsersError::ConfigError(format!(
                "--per-page must be between 1 and 100, got {}",
                self.per_page
            )));
        }

        Ok(GitHubClientConfig {
            base_url: self.api_url.clone(),
            per_page: self.per_page,
            token: self.github_token.clone().filter(|token| !token.is_empty()),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    pub fn user_list_config(&self) -> UserListConfig {
        UserListConfig {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            reconnect_settle: Duration::from_millis(self.reconnect_settle_ms),
            load_on_start: true,
        }
    }

    pub fn probe_config(&self) -> Result<ProbeConfig> {
        if self.probe_interval_secs == 0 {
            return Err(GitHubUsersError::ConfigError(
                "--probe-interval-secs must be at least 1".to_string(),
            ));
        }

        Ok(ProbeConfig {
            address: self.probe_addr.clone(),
            interval: Duration::from_secs(self.probe_interval_secs),
            ..Default::default()
        })
    }
}
