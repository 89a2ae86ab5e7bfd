use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub user as held by the working set and the bookmark set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
}

impl User {
    /// Placeholder avatar used when `avatar_url` cannot be loaded
    pub fn fallback_avatar_url(&self) -> String {
        let name: String = url::form_urlencoded::byte_serialize(self.login.as_bytes()).collect();
        format!("https://ui-avatars.com/api/?name={}&background=random", name)
    }
}

/// The three independently tracked asynchronous operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    InitialLoad,
    LoadMore,
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub in_progress: bool,
    pub last_error: Option<String>,
}

impl OperationStatus {
    pub fn start(&mut self) {
        self.in_progress = true;
        self.last_error = None;
    }

    pub fn succeed(&mut self) {
        self.in_progress = false;
        self.last_error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.in_progress = false;
        self.last_error = Some(message);
    }
}

/// Rate limit state reported by a GitHub response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitState {
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
}
