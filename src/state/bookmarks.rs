use crate::models::User;
use crate::state::actions::BookmarkAction;

/// Bookmarked users in insertion order, unique by `id`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkState {
    pub users: Vec<User>,
}

impl BookmarkState {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Applies `action` and reports whether the set changed
    pub fn reduce(&mut self, action: BookmarkAction) -> bool {
        match action {
            BookmarkAction::Bookmark(user) => {
                if self.contains(user.id) {
                    return false;
                }
                self.users.push(user);
                true
            }
            BookmarkAction::Unbookmark(id) => {
                let before = self.users.len();
                self.users.retain(|user| user.id != id);
                self.users.len() != before
            }
            BookmarkAction::Load(users) => {
                let changed = self.users != users;
                self.users = users;
                changed
            }
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.users.iter().any(|user| user.id == id)
    }
}
