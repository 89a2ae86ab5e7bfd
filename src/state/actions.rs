use crate::models::User;

/// State transitions of the user list concern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListAction {
    InitialLoadRequest,
    InitialLoadSuccess(Vec<User>),
    InitialLoadFailure(String),

    LoadMoreRequest,
    LoadMoreSuccess(Vec<User>),
    LoadMoreFailure(String),

    RefreshRequest,
    RefreshSuccess(Vec<User>),
    RefreshFailure(String),

    /// Raw keystroke input, not yet used for filtering
    SetSearchInput(String),
    /// Promote the settled input to the effective query
    ApplySearchQuery,
}

/// State transitions of the bookmark concern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkAction {
    Bookmark(User),
    Unbookmark(u64),
    /// Replace the whole set with what the store holds
    Load(Vec<User>),
}
