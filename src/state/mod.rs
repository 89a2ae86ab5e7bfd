//! Explicit state containers and their reducers.
//!
//! Each concern owns one state struct and one `reduce` entry point that
//! applies an action in place. Reducers never perform I/O: fetching,
//! persisting and timers live in [`crate::actors::user_list`] and
//! [`crate::bookmarks`], which feed the outcomes back in as actions.

pub mod actions;
pub mod bookmarks;
pub mod filter;
pub mod users;

pub use actions::{BookmarkAction, UserListAction};
pub use bookmarks::BookmarkState;
pub use filter::{filter_users, is_blank_query};
pub use users::{SearchState, UserListState};
