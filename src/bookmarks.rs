use crate::error::Result;
use crate::models::User;
use crate::state::{BookmarkAction, BookmarkState};
use crate::storage::KeyValueStore;
use tracing::{debug, error, warn};

pub const BOOKMARKED_USERS_KEY: &str = "github_bookmarked_users";

/// Keeps the in-memory bookmark set and the persisted copy in step.
///
/// Every mutation rewrites the whole collection under [`BOOKMARKED_USERS_KEY`].
/// Storage failures are logged and swallowed; callers always see success.
pub struct BookmarkCoordinator<S> {
    store: S,
    state: BookmarkState,
}

impl<S: KeyValueStore> BookmarkCoordinator<S> {
    /// Creates the coordinator and loads whatever the store already holds
    pub fn new(store: S) -> Self {
        let mut coordinator = Self {
            store,
            state: BookmarkState::default(),
        };
        coordinator.reload();
        coordinator
    }

    pub fn bookmarks(&self) -> &[User] {
        &self.state.users
    }

    pub fn is_bookmarked(&self, id: u64) -> bool {
        self.state.contains(id)
    }

    pub fn bookmark(&mut self, user: User) {
        let id = user.id;
        if self.state.reduce(BookmarkAction::Bookmark(user)) {
            debug!(user_id = id, "Bookmarked user");
            self.persist();
        } else {
            debug!(user_id = id, "User already bookmarked");
        }
    }

    pub fn unbookmark(&mut self, id: u64) {
        if self.state.reduce(BookmarkAction::Unbookmark(id)) {
            debug!(user_id = id, "Removed bookmark");
            self.persist();
        } else {
            debug!(user_id = id, "User was not bookmarked");
        }
    }

    /// Re-reads the persisted set, replacing the in-memory one.
    ///
    /// A missing or unparsable blob counts as an empty set. If the store
    /// itself cannot be read the in-memory set is kept.
    pub fn reload(&mut self) {
        match read_bookmarks(&self.store) {
            Ok(users) => {
                debug!(count = users.len(), "Loaded bookmarks from store");
                self.state.reduce(BookmarkAction::Load(users));
            }
            Err(e) => {
                error!(error = %e, "Error reading bookmarked users from store");
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = write_bookmarks(&self.store, &self.state.users) {
            error!(error = %e, "Error saving bookmarked users to store");
        }
    }
}

fn read_bookmarks<S: KeyValueStore>(store: &S) -> Result<Vec<User>> {
    let Some(bytes) = store.get(BOOKMARKED_USERS_KEY)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_slice::<Vec<User>>(&bytes) {
        Ok(users) => Ok(users),
        Err(e) => {
            warn!(error = %e, "Stored bookmarks are corrupt, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn write_bookmarks<S: KeyValueStore>(store: &S, users: &[User]) -> Result<()> {
    let bytes = serde_json::to_vec(users)?;
    store.set(BOOKMARKED_USERS_KEY, &bytes)
}
