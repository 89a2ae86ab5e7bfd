use crate::error::{GitHubUsersError, Result};
use crate::models::User;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

// GitHub API response structures
#[derive(Debug, Deserialize)]
pub struct GitHubUserPayload {
    pub id: Option<u64>,
    pub login: Option<String>,
    pub avatar_url: Option<String>,
}

impl TryFrom<GitHubUserPayload> for User {
    type Error = String;

    fn try_from(payload: GitHubUserPayload) -> std::result::Result<Self, Self::Error> {
        let id = payload.id.ok_or("missing id")?;
        let login = payload
            .login
            .filter(|login| !login.is_empty())
            .ok_or("missing login")?;
        let avatar_url = payload.avatar_url.ok_or("missing avatar_url")?;

        Ok(User { id, login, avatar_url })
    }
}

/// Narrows a `/users` response body into user records.
///
/// Elements that do not carry a usable `id`, `login` and `avatar_url` are
/// logged and skipped. A body that is not a JSON array is rejected.
pub fn parse_users_page(body: Value) -> Result<Vec<User>> {
    let entries = match body {
        Value::Array(entries) => entries,
        other => {
            return Err(GitHubUsersError::MalformedResponse(format!(
                "expected a JSON array of users, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut users = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let narrowed = serde_json::from_value::<GitHubUserPayload>(entry)
            .map_err(|e| e.to_string())
            .and_then(User::try_from);

        match narrowed {
            Ok(user) => users.push(user),
            Err(reason) => warn!(index, %reason, "Skipping malformed user entry"),
        }
    }

    Ok(users)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
