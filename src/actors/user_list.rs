use crate::bookmarks::BookmarkCoordinator;
use crate::connectivity::Connectivity;
use crate::error::{GitHubUsersError, Result};
use crate::github::UserSource;
use crate::models::{Operation, OperationStatus, User};
use crate::state::{filter_users, SearchState, UserListAction, UserListState};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your internet connection.";

/// Timing and startup behaviour of the user list
#[derive(Debug, Clone)]
pub struct UserListConfig {
    /// Quiet period after the last keystroke before the query is applied
    pub search_debounce: Duration,
    /// Delay between connectivity coming back and the load-more retry
    pub reconnect_settle: Duration,
    /// Dispatch an initial load as soon as the actor starts
    pub load_on_start: bool,
}

impl Default for UserListConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            reconnect_settle: Duration::from_secs(1),
            load_on_start: true,
        }
    }
}

/// Result of one page fetch, reported back to the actor
#[derive(Debug)]
pub enum FetchOutcome {
    Loaded(Vec<User>),
    Failed {
        message: String,
        network: bool,
        /// Subscribed when the request was issued
        connectivity: watch::Receiver<bool>,
    },
}

#[derive(Debug)]
pub enum UserListMessage {
    LoadInitial,
    LoadMore(u64),
    /// The list was scrolled close to its end
    ScrollNearBottom,
    /// Answered with the refresh status once the outstanding refresh settles
    Refresh(Option<RpcReplyPort<OperationStatus>>),
    SetSearchQuery(String),
    Bookmark(User),
    Unbookmark(u64),
    GetSnapshot(RpcReplyPort<UserListSnapshot>),

    // Internal completions
    PageLoaded {
        operation: Operation,
        outcome: FetchOutcome,
    },
    SearchSettled {
        generation: u64,
    },
    RetryLoadMore,
}

/// A user as shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub bookmarked: bool,
    /// Placeholder to show when `avatar_url` fails to load
    pub fallback_avatar_url: String,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListSnapshot {
    /// Size of the working set before filtering
    pub total_users: usize,
    /// Working set filtered by the effective query
    pub users: Vec<UserView>,
    pub bookmarks: Vec<User>,
    /// Bookmarks filtered by the effective query
    pub visible_bookmarks: Vec<User>,
    pub last_user_id: u64,
    pub end_reached: bool,
    pub initial: OperationStatus,
    pub load_more: OperationStatus,
    pub refresh: OperationStatus,
    pub page_error: Option<String>,
    pub search: SearchState,
    pub online: bool,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

/// Arguments for starting the user list actor
pub struct UserListArgs<S> {
    pub source: Arc<S>,
    pub store: Arc<dyn KeyValueStore>,
    pub connectivity: Connectivity,
    pub config: UserListConfig,
}

/// Owns the working set and bookmark set and serialises every intent
pub struct UserListActor<S> {
    _source: PhantomData<fn() -> S>,
}

impl<S> Default for UserListActor<S> {
    fn default() -> Self {
        Self { _source: PhantomData }
    }
}

pub struct UserListActorState<S> {
    source: Arc<S>,
    connectivity: Connectivity,
    config: UserListConfig,
    users: UserListState,
    bookmarks: BookmarkCoordinator<Arc<dyn KeyValueStore>>,
    search_generation: u64,
    search_timer: Option<JoinHandle<()>>,
    reconnect_listener: Option<JoinHandle<()>>,
    refresh_waiters: Vec<RpcReplyPort<OperationStatus>>,
}

impl<S: UserSource> UserListActor<S> {
    pub async fn spawn(
        name: Option<String>,
        args: UserListArgs<S>,
    ) -> std::result::Result<ActorRef<UserListMessage>, SpawnErr> {
        let (actor_ref, _handle) = Actor::spawn(name, UserListActor::default(), args).await?;
        info!("User list actor started");
        Ok(actor_ref)
    }
}

#[ractor::async_trait]
impl<S: UserSource> Actor for UserListActor<S> {
    type Msg = UserListMessage;
    type State = UserListActorState<S>;
    type Arguments = UserListArgs<S>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> std::result::Result<Self::State, ActorProcessingErr> {
        let bookmarks = BookmarkCoordinator::new(args.store);
        info!(bookmarks = bookmarks.bookmarks().len(), "Starting user list actor");

        if args.config.load_on_start {
            myself.send_message(UserListMessage::LoadInitial).map_err(|e| {
                ActorProcessingErr::from(format!("Failed to queue initial load: {:?}", e))
            })?;
        }

        Ok(UserListActorState {
            source: args.source,
            connectivity: args.connectivity,
            config: args.config,
            users: UserListState::new(),
            bookmarks,
            search_generation: 0,
            search_timer: None,
            reconnect_listener: None,
            refresh_waiters: Vec::new(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        match message {
            UserListMessage::LoadInitial => {
                if !state.users.can_load_initial() {
                    debug!("Skipping initial load, list is not empty or busy");
                    return Ok(());
                }
                state.users.reduce(UserListAction::InitialLoadRequest);
                spawn_fetch(&myself, state, Operation::InitialLoad, 0);
            }

            UserListMessage::LoadMore(cursor) => {
                if !state.users.can_load_more_from(cursor) {
                    debug!(cursor, "Skipping load more");
                    return Ok(());
                }
                start_load_more(&myself, state, cursor);
            }

            UserListMessage::ScrollNearBottom => {
                if state.users.should_load_on_scroll() {
                    let cursor = state.users.last_user_id;
                    start_load_more(&myself, state, cursor);
                }
            }

            UserListMessage::Refresh(reply) => {
                if let Some(reply) = reply {
                    state.refresh_waiters.push(reply);
                }
                if state.users.refresh.in_progress {
                    debug!("Refresh already running, joining it");
                    return Ok(());
                }
                state.users.reduce(UserListAction::RefreshRequest);
                spawn_fetch(&myself, state, Operation::Refresh, 0);
            }

            UserListMessage::SetSearchQuery(query) => {
                state.users.reduce(UserListAction::SetSearchInput(query));
                state.search_generation += 1;

                if let Some(timer) = state.search_timer.take() {
                    timer.abort();
                }
                let generation = state.search_generation;
                let delay = state.config.search_debounce;
                let myself = myself.clone();
                state.search_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = myself.send_message(UserListMessage::SearchSettled { generation });
                }));
            }

            UserListMessage::SearchSettled { generation } => {
                if generation != state.search_generation {
                    return Ok(());
                }
                state.search_timer = None;
                state.users.reduce(UserListAction::ApplySearchQuery);
                debug!(
                    query = %state.users.search.effective,
                    visible = state.users.visible_users().len(),
                    "Search query applied"
                );
            }

            UserListMessage::Bookmark(user) => state.bookmarks.bookmark(user),

            UserListMessage::Unbookmark(id) => state.bookmarks.unbookmark(id),

            UserListMessage::GetSnapshot(reply) => {
                if !reply.is_closed() {
                    let _ = reply.send(snapshot(state));
                }
            }

            UserListMessage::PageLoaded { operation, outcome } => {
                apply_page(&myself, state, operation, outcome);
            }

            UserListMessage::RetryLoadMore => {
                state.reconnect_listener = None;

                let users = &state.users;
                if users.load_more.in_progress
                    || users.load_more.last_error.is_none()
                    || !state.connectivity.is_online()
                    || users.last_user_id == 0
                {
                    debug!("Reconnect retry no longer needed");
                    return Ok(());
                }

                let cursor = users.last_user_id;
                info!(cursor, "Connectivity restored, retrying load more");
                start_load_more(&myself, state, cursor);
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        if let Some(timer) = state.search_timer.take() {
            timer.abort();
        }
        if let Some(listener) = state.reconnect_listener.take() {
            listener.abort();
        }
        info!(
            users = state.users.users.len(),
            bookmarks = state.bookmarks.bookmarks().len(),
            "User list actor stopped"
        );
        Ok(())
    }
}

fn start_load_more<S: UserSource>(
    myself: &ActorRef<UserListMessage>,
    state: &mut UserListActorState<S>,
    cursor: u64,
) {
    // A new attempt clears the error the listener was waiting on
    if let Some(listener) = state.reconnect_listener.take() {
        listener.abort();
    }
    state.users.reduce(UserListAction::LoadMoreRequest);
    spawn_fetch(myself, state, Operation::LoadMore, cursor);
}

fn spawn_fetch<S: UserSource>(
    myself: &ActorRef<UserListMessage>,
    state: &UserListActorState<S>,
    operation: Operation,
    since: u64,
) {
    let source = state.source.clone();
    let connectivity = state.connectivity.clone();
    let transitions = connectivity.subscribe();
    let myself = myself.clone();

    debug!(?operation, since, "Fetching users");
    tokio::spawn(async move {
        let outcome = match source.fetch_page(since).await {
            Ok(users) => FetchOutcome::Loaded(users),
            Err(e) => {
                let network = e.is_transport() || !connectivity.is_online();
                FetchOutcome::Failed {
                    message: e.to_string(),
                    network,
                    connectivity: transitions,
                }
            }
        };

        if let Err(e) = myself.send_message(UserListMessage::PageLoaded { operation, outcome }) {
            debug!(?operation, "Dropping late fetch result: {}", e);
        }
    });
}

fn apply_page<S: UserSource>(
    myself: &ActorRef<UserListMessage>,
    state: &mut UserListActorState<S>,
    operation: Operation,
    outcome: FetchOutcome,
) {
    match (operation, outcome) {
        (Operation::InitialLoad, FetchOutcome::Loaded(users)) => {
            info!(count = users.len(), "Initial users loaded");
            state.users.reduce(UserListAction::InitialLoadSuccess(users));
            state.bookmarks.reload();
        }
        (Operation::InitialLoad, FetchOutcome::Failed { message, .. }) => {
            error!(%message, "Initial load failed");
            state.users.reduce(UserListAction::InitialLoadFailure(message));
        }

        (Operation::LoadMore, FetchOutcome::Loaded(users)) => {
            if users.is_empty() {
                info!(cursor = state.users.last_user_id, "No more users to load");
            } else {
                debug!(count = users.len(), "More users loaded");
            }
            state.users.reduce(UserListAction::LoadMoreSuccess(users));
        }
        (
            Operation::LoadMore,
            FetchOutcome::Failed {
                message,
                network,
                connectivity,
            },
        ) => {
            warn!(%message, network, "Load more failed");
            let shown = if network {
                NETWORK_ERROR_MESSAGE.to_string()
            } else {
                message
            };
            state.users.reduce(UserListAction::LoadMoreFailure(shown));
            if network {
                arm_reconnect_listener(myself, state, connectivity);
            }
        }

        (Operation::Refresh, outcome) => {
            match outcome {
                FetchOutcome::Loaded(users) => {
                    info!(count = users.len(), "Users refreshed");
                    state.users.reduce(UserListAction::RefreshSuccess(users));
                }
                FetchOutcome::Failed { message, .. } => {
                    error!(%message, "Refresh failed");
                    state.users.reduce(UserListAction::RefreshFailure(message));
                }
            }
            for waiter in state.refresh_waiters.drain(..) {
                if !waiter.is_closed() {
                    let _ = waiter.send(state.users.refresh.clone());
                }
            }
        }
    }
}

/// One-shot: retries load-more after the next offline-to-online transition
/// seen by `rx` since the failed request was issued
fn arm_reconnect_listener<S: UserSource>(
    myself: &ActorRef<UserListMessage>,
    state: &mut UserListActorState<S>,
    rx: watch::Receiver<bool>,
) {
    if state.reconnect_listener.is_some() {
        return;
    }

    let settle = state.config.reconnect_settle;
    let myself = myself.clone();

    debug!("Waiting for connectivity to retry load more");
    state.reconnect_listener = Some(tokio::spawn(async move {
        if !Connectivity::wait_until_restored(rx).await {
            return;
        }
        tokio::time::sleep(settle).await;
        let _ = myself.send_message(UserListMessage::RetryLoadMore);
    }));
}

fn snapshot<S>(state: &UserListActorState<S>) -> UserListSnapshot {
    let users = &state.users;
    let query = users.search.effective.as_str();

    UserListSnapshot {
        total_users: users.users.len(),
        users: users
            .visible_users()
            .into_iter()
            .map(|user| UserView {
                user: user.clone(),
                bookmarked: state.bookmarks.is_bookmarked(user.id),
                fallback_avatar_url: user.fallback_avatar_url(),
            })
            .collect(),
        bookmarks: state.bookmarks.bookmarks().to_vec(),
        visible_bookmarks: filter_users(state.bookmarks.bookmarks(), query)
            .into_iter()
            .cloned()
            .collect(),
        last_user_id: users.last_user_id,
        end_reached: users.end_reached,
        initial: users.initial.clone(),
        load_more: users.load_more.clone(),
        refresh: users.refresh.clone(),
        page_error: users.page_error().map(str::to_string),
        search: users.search.clone(),
        online: state.connectivity.is_online(),
        last_loaded_at: users.last_loaded_at,
    }
}

/// Asks the actor for its current snapshot
pub async fn fetch_snapshot(
    actor: &ActorRef<UserListMessage>,
    timeout: Duration,
) -> Result<UserListSnapshot> {
    match actor
        .call(UserListMessage::GetSnapshot, Some(timeout))
        .await
        .map_err(|e| GitHubUsersError::ActorError(format!("Failed to contact user list: {}", e)))?
    {
        ractor::rpc::CallResult::Success(snapshot) => Ok(snapshot),
        ractor::rpc::CallResult::Timeout => Err(GitHubUsersError::ActorError(
            "Timeout getting user list snapshot".to_string(),
        )),
        ractor::rpc::CallResult::SenderError => Err(GitHubUsersError::ActorError(
            "User list dropped the snapshot request".to_string(),
        )),
    }
}

/// Requests a refresh and waits for it to settle
pub async fn refresh_and_wait(
    actor: &ActorRef<UserListMessage>,
    timeout: Duration,
) -> Result<OperationStatus> {
    match actor
        .call(|reply| UserListMessage::Refresh(Some(reply)), Some(timeout))
        .await
        .map_err(|e| GitHubUsersError::ActorError(format!("Failed to contact user list: {}", e)))?
    {
        ractor::rpc::CallResult::Success(status) => Ok(status),
        ractor::rpc::CallResult::Timeout => Err(GitHubUsersError::ActorError(
            "Timeout waiting for refresh".to_string(),
        )),
        ractor::rpc::CallResult::SenderError => Err(GitHubUsersError::ActorError(
            "User list dropped the refresh request".to_string(),
        )),
    }
}
