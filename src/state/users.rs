use crate::models::{OperationStatus, User};
use crate::state::actions::UserListAction;
use crate::state::filter::{filter_users, is_blank_query};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search input and the debounced query actually used for filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub input: String,
    pub effective: String,
    /// Number of times the effective query has been recomputed
    pub applied_count: u64,
}

/// Working set, pagination cursor and per-operation status
#[derive(Debug, Clone, Default)]
pub struct UserListState {
    pub users: Vec<User>,
    /// Id of the last record of the most recent page, `0` before any page
    pub last_user_id: u64,
    /// Set when a load-more page came back empty
    pub end_reached: bool,
    pub initial: OperationStatus,
    pub load_more: OperationStatus,
    pub refresh: OperationStatus,
    pub search: SearchState,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

impl UserListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&mut self, action: UserListAction) {
        match action {
            UserListAction::InitialLoadRequest => self.initial.start(),
            UserListAction::InitialLoadSuccess(page) => {
                self.initial.succeed();
                self.replace(page);
            }
            UserListAction::InitialLoadFailure(message) => self.initial.fail(message),

            UserListAction::LoadMoreRequest => self.load_more.start(),
            UserListAction::LoadMoreSuccess(page) => {
                self.load_more.succeed();
                match page.last() {
                    Some(last) => {
                        self.last_user_id = last.id;
                        self.users.extend(page);
                    }
                    // Empty page: end of sequence, the cursor stays put
                    None => self.end_reached = true,
                }
                self.last_loaded_at = Some(Utc::now());
            }
            UserListAction::LoadMoreFailure(message) => self.load_more.fail(message),

            UserListAction::RefreshRequest => {
                self.refresh.start();
                self.initial.last_error = None;
            }
            UserListAction::RefreshSuccess(page) => {
                self.refresh.succeed();
                self.initial.last_error = None;
                self.replace(page);
            }
            UserListAction::RefreshFailure(message) => self.refresh.fail(message),

            UserListAction::SetSearchInput(input) => self.search.input = input,
            UserListAction::ApplySearchQuery => {
                self.search.effective = self.search.input.clone();
                self.search.applied_count += 1;
            }
        }
    }

    fn replace(&mut self, page: Vec<User>) {
        self.last_user_id = page.last().map(|user| user.id).unwrap_or(0);
        self.users = page;
        self.end_reached = false;
        self.last_loaded_at = Some(Utc::now());
    }

    pub fn any_in_progress(&self) -> bool {
        self.initial.in_progress || self.load_more.in_progress || self.refresh.in_progress
    }

    /// InitialLoad only runs against an empty, idle list
    pub fn can_load_initial(&self) -> bool {
        self.users.is_empty() && !self.any_in_progress()
    }

    pub fn can_load_more_from(&self, cursor: u64) -> bool {
        cursor > 0 && !self.load_more.in_progress
    }

    /// Whether a scroll to the bottom of the list should fetch the next page
    pub fn should_load_on_scroll(&self) -> bool {
        !self.initial.in_progress
            && self.can_load_more_from(self.last_user_id)
            && is_blank_query(&self.search.effective)
            && !self.end_reached
    }

    /// The page-level error shown in place of content
    pub fn page_error(&self) -> Option<&str> {
        self.refresh
            .last_error
            .as_deref()
            .or(self.initial.last_error.as_deref())
    }

    pub fn visible_users(&self) -> Vec<&User> {
        filter_users(&self.users, &self.search.effective)
    }
}
