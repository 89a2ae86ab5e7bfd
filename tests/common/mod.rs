#![allow(dead_code)]

use github_users_browser::actors::{
    fetch_snapshot, UserListActor, UserListArgs, UserListConfig, UserListMessage, UserListSnapshot,
};
use github_users_browser::connectivity::Connectivity;
use github_users_browser::error::{GitHubUsersError, Result};
use github_users_browser::github::UserSource;
use github_users_browser::models::User;
use github_users_browser::storage::{KeyValueStore, MemoryStore};
use ractor::ActorRef;
use std::collections::{HashMap, VecDeque};
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn user(id: u64) -> User {
    User {
        id,
        login: format!("user{id}"),
        avatar_url: format!("https://avatars.githubusercontent.com/u/{id}?v=4"),
    }
}

pub fn named(id: u64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
        avatar_url: format!("https://avatars.githubusercontent.com/u/{id}?v=4"),
    }
}

pub fn page(ids: RangeInclusive<u64>) -> Vec<User> {
    ids.map(user).collect()
}

enum Reply {
    Page(Vec<User>),
    Transport,
    Api(u16),
}

struct Scripted {
    reply: Reply,
    delay: Duration,
}

/// `UserSource` answering from per-cursor queues; unscripted cursors get an empty page
#[derive(Default)]
pub struct FakeUserSource {
    replies: Mutex<HashMap<u64, VecDeque<Scripted>>>,
    calls: Mutex<Vec<u64>>,
}

impl FakeUserSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, since: u64, reply: Reply, delay: Duration) {
        self.replies
            .lock()
            .unwrap()
            .entry(since)
            .or_default()
            .push_back(Scripted { reply, delay });
    }

    pub fn push_page(&self, since: u64, users: Vec<User>) {
        self.push(since, Reply::Page(users), Duration::ZERO);
    }

    pub fn push_page_after(&self, since: u64, users: Vec<User>, delay: Duration) {
        self.push(since, Reply::Page(users), delay);
    }

    pub fn push_transport_error(&self, since: u64) {
        self.push(since, Reply::Transport, Duration::ZERO);
    }

    pub fn push_transport_error_after(&self, since: u64, delay: Duration) {
        self.push(since, Reply::Transport, delay);
    }

    pub fn push_api_error(&self, since: u64, status: u16) {
        self.push(since, Reply::Api(status), Duration::ZERO);
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, since: u64) -> usize {
        self.calls().iter().filter(|&&c| c == since).count()
    }
}

impl UserSource for FakeUserSource {
    async fn fetch_page(&self, since: u64) -> Result<Vec<User>> {
        let scripted = {
            self.calls.lock().unwrap().push(since);
            self.replies
                .lock()
                .unwrap()
                .get_mut(&since)
                .and_then(|queue| queue.pop_front())
        };

        let Some(scripted) = scripted else {
            return Ok(Vec::new());
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        match scripted.reply {
            Reply::Page(users) => Ok(users),
            Reply::Transport => Err(GitHubUsersError::TransportError(
                "error sending request: connection refused".to_string(),
            )),
            Reply::Api(status) => Err(GitHubUsersError::ApiError {
                status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

pub struct TestContext {
    pub source: Arc<FakeUserSource>,
    pub store: MemoryStore,
    pub connectivity: Connectivity,
    pub actor: ActorRef<UserListMessage>,
}

impl TestContext {
    pub async fn start(source: Arc<FakeUserSource>, config: UserListConfig) -> Self {
        Self::start_with_store(source, MemoryStore::new(), config).await
    }

    pub async fn start_with_store(
        source: Arc<FakeUserSource>,
        store: MemoryStore,
        config: UserListConfig,
    ) -> Self {
        let connectivity = Connectivity::new(true);
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());

        let actor = UserListActor::spawn(
            None,
            UserListArgs {
                source: source.clone(),
                store: shared,
                connectivity: connectivity.clone(),
                config,
            },
        )
        .await
        .expect("Failed to spawn user list actor");

        TestContext {
            source,
            store,
            connectivity,
            actor,
        }
    }

    pub async fn snapshot(&self) -> UserListSnapshot {
        fetch_snapshot(&self.actor, Duration::from_secs(5))
            .await
            .expect("Failed to get snapshot")
    }

    /// Polls the snapshot until `condition` holds, panicking after two seconds
    pub async fn wait_until<F>(&self, what: &str, condition: F) -> UserListSnapshot
    where
        F: Fn(&UserListSnapshot) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = self.snapshot().await;
            if condition(&snapshot) {
                return snapshot;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("Timed out waiting for {what}; last snapshot: {snapshot:?}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn send(&self, message: UserListMessage) {
        self.actor
            .send_message(message)
            .expect("Failed to send message to user list");
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

/// Config with short timers and no automatic initial load
pub fn quick_config() -> UserListConfig {
    UserListConfig {
        search_debounce: Duration::from_millis(100),
        reconnect_settle: Duration::from_millis(20),
        load_on_start: false,
    }
}
