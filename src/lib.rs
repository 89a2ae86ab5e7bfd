//! Pages through GitHub users with client-side search, refresh and
//! persisted bookmarks.
//!
//! The [`actors::UserListActor`] owns all mutable state and applies it
//! through the reducers in [`state`]; [`github::GitHubClient`] is the remote
//! source, [`bookmarks::BookmarkCoordinator`] keeps the bookmark set in a
//! [`storage::KeyValueStore`], and [`api`] exposes the intents over HTTP.

pub mod actors;
pub mod api;
pub mod bookmarks;
pub mod cli;
pub mod connectivity;
pub mod error;
pub mod github;
pub mod health;
pub mod models;
pub mod state;
pub mod storage;
pub mod types;
