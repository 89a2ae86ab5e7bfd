mod common;

use common::{named, page, quick_config, user, FakeUserSource, TestContext};
use github_users_browser::actors::user_list::NETWORK_ERROR_MESSAGE;
use github_users_browser::actors::{refresh_and_wait, UserListConfig, UserListMessage};
use github_users_browser::bookmarks::BOOKMARKED_USERS_KEY;
use github_users_browser::models::User;
use github_users_browser::storage::{KeyValueStore, MemoryStore};
use std::time::Duration;

async fn loaded_context(source: std::sync::Arc<FakeUserSource>) -> TestContext {
    source.push_page(0, page(1001..=1030));
    let ctx = TestContext::start(source, quick_config()).await;
    ctx.send(UserListMessage::LoadInitial);
    ctx.wait_until("initial load", |s| s.total_users == 30).await;
    ctx
}

fn persisted_bookmarks(store: &MemoryStore) -> Vec<User> {
    let bytes = store
        .get(BOOKMARKED_USERS_KEY)
        .unwrap()
        .expect("No bookmarks persisted");
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_initial_load_on_start() {
    let source = FakeUserSource::new();
    source.push_page(0, page(1001..=1030));

    let ctx = TestContext::start(
        source.clone(),
        UserListConfig {
            load_on_start: true,
            ..quick_config()
        },
    )
    .await;

    let snapshot = ctx
        .wait_until("initial load", |s| s.total_users == 30 && !s.initial.in_progress)
        .await;

    assert_eq!(snapshot.last_user_id, 1030);
    assert_eq!(snapshot.initial.last_error, None);
    assert_eq!(snapshot.page_error, None);
    assert_eq!(source.calls(), vec![0]);
    ctx.stop();
}

#[tokio::test]
async fn test_initial_load_only_runs_on_empty_list() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadInitial);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(source.calls_for(0), 1);
    ctx.stop();
}

#[tokio::test]
async fn test_initial_load_failure_keeps_list_empty() {
    let source = FakeUserSource::new();
    source.push_api_error(0, 503);
    let ctx = TestContext::start(source.clone(), quick_config()).await;

    ctx.send(UserListMessage::LoadInitial);
    let snapshot = ctx
        .wait_until("initial failure", |s| s.initial.last_error.is_some())
        .await;

    assert_eq!(snapshot.total_users, 0);
    assert!(snapshot.page_error.unwrap().contains("503"));

    // Re-invoking is the only recourse, and it works
    source.push_page(0, page(1..=3));
    ctx.send(UserListMessage::LoadInitial);
    let snapshot = ctx.wait_until("retry", |s| s.total_users == 3).await;
    assert_eq!(snapshot.page_error, None);
    ctx.stop();
}

#[tokio::test]
async fn test_load_more_appends_pages() {
    let source = FakeUserSource::new();
    source.push_page(1030, page(1031..=1060));
    source.push_page(1060, page(1061..=1075));
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    ctx.wait_until("second page", |s| s.total_users == 60).await;
    ctx.send(UserListMessage::LoadMore(1060));
    let snapshot = ctx.wait_until("third page", |s| s.total_users == 75).await;

    assert_eq!(snapshot.last_user_id, 1075);
    let ids: Vec<u64> = snapshot.users.iter().map(|u| u.user.id).collect();
    assert_eq!(ids, (1001..=1075).collect::<Vec<_>>());
    ctx.stop();
}

#[tokio::test]
async fn test_empty_load_more_keeps_cursor() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    let snapshot = ctx
        .wait_until("end of sequence", |s| s.end_reached && !s.load_more.in_progress)
        .await;

    assert_eq!(snapshot.total_users, 30);
    assert_eq!(snapshot.last_user_id, 1030);
    assert_eq!(snapshot.load_more.last_error, None);

    // Scrolling past the end no longer hits the API
    ctx.send(UserListMessage::ScrollNearBottom);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls_for(1030), 1);
    ctx.stop();
}

#[tokio::test]
async fn test_load_more_ignored_while_running() {
    let source = FakeUserSource::new();
    source.push_page_after(1030, page(1031..=1060), Duration::from_millis(150));
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    ctx.send(UserListMessage::LoadMore(1030));
    ctx.send(UserListMessage::ScrollNearBottom);
    ctx.send(UserListMessage::LoadMore(0));

    ctx.wait_until("slow page", |s| s.total_users == 60).await;
    assert_eq!(source.calls_for(1030), 1);
    assert_eq!(source.calls_for(0), 1);
    ctx.stop();
}

#[tokio::test]
async fn test_load_more_failure_keeps_cursor_and_users() {
    let source = FakeUserSource::new();
    source.push_api_error(1030, 500);
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    let snapshot = ctx
        .wait_until("load more failure", |s| s.load_more.last_error.is_some())
        .await;

    assert_eq!(snapshot.last_user_id, 1030);
    assert_eq!(snapshot.total_users, 30);
    let message = snapshot.load_more.last_error.unwrap();
    assert!(message.contains("500"), "unexpected message: {message}");
    assert_ne!(message, NETWORK_ERROR_MESSAGE);
    // Existing content stays visible, no page-level error
    assert_eq!(snapshot.page_error, None);

    // Manual retry from the same cursor
    source.push_page(1030, page(1031..=1040));
    ctx.send(UserListMessage::LoadMore(1030));
    let snapshot = ctx.wait_until("manual retry", |s| s.total_users == 40).await;
    assert_eq!(snapshot.load_more.last_error, None);
    ctx.stop();
}

#[tokio::test]
async fn test_network_failure_retries_once_on_reconnect() {
    let source = FakeUserSource::new();
    source.push_transport_error(1030);
    source.push_page(1030, page(1031..=1060));
    let ctx = loaded_context(source.clone()).await;

    ctx.connectivity.set_online(false);
    ctx.send(UserListMessage::LoadMore(1030));

    let snapshot = ctx
        .wait_until("network failure", |s| s.load_more.last_error.is_some())
        .await;
    assert_eq!(
        snapshot.load_more.last_error.as_deref(),
        Some(NETWORK_ERROR_MESSAGE)
    );
    assert_eq!(snapshot.last_user_id, 1030);
    assert!(!snapshot.online);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls_for(1030), 1);

    ctx.connectivity.set_online(true);
    let snapshot = ctx.wait_until("automatic retry", |s| s.total_users == 60).await;
    assert_eq!(snapshot.last_user_id, 1060);
    assert_eq!(snapshot.load_more.last_error, None);

    // Further transitions do not trigger more retries
    ctx.connectivity.set_online(false);
    ctx.connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls_for(1030), 2);
    assert_eq!(source.calls_for(1060), 0);
    ctx.stop();
}

#[tokio::test]
async fn test_reconnect_during_failed_fetch_still_retries() {
    let source = FakeUserSource::new();
    source.push_transport_error_after(1030, Duration::from_millis(150));
    source.push_page(1030, page(1031..=1060));
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    tokio::time::sleep(Duration::from_millis(30)).await;
    ctx.connectivity.set_online(false);
    tokio::time::sleep(Duration::from_millis(30)).await;
    ctx.connectivity.set_online(true);

    // The connection dropped and came back before the failure was reported;
    // no further transition happens, the retry must still run
    let snapshot = ctx.wait_until("automatic retry", |s| s.total_users == 60).await;
    assert_eq!(snapshot.load_more.last_error, None);
    assert_eq!(source.calls_for(1030), 2);
    ctx.stop();
}

#[tokio::test]
async fn test_offline_at_failure_time_counts_as_network_error() {
    let source = FakeUserSource::new();
    source.push_api_error(1030, 502);
    source.push_page(1030, page(1031..=1035));
    let ctx = loaded_context(source.clone()).await;

    ctx.connectivity.set_online(false);
    ctx.send(UserListMessage::LoadMore(1030));
    let snapshot = ctx
        .wait_until("failure", |s| s.load_more.last_error.is_some())
        .await;
    assert_eq!(
        snapshot.load_more.last_error.as_deref(),
        Some(NETWORK_ERROR_MESSAGE)
    );

    ctx.connectivity.set_online(true);
    ctx.wait_until("automatic retry", |s| s.total_users == 35).await;
    ctx.stop();
}

#[tokio::test]
async fn test_remote_failure_is_not_retried_on_reconnect() {
    let source = FakeUserSource::new();
    source.push_api_error(1030, 500);
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    ctx.wait_until("failure", |s| s.load_more.last_error.is_some())
        .await;

    ctx.connectivity.set_online(false);
    ctx.connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(source.calls_for(1030), 1);
    ctx.stop();
}

#[tokio::test]
async fn test_manual_retry_cancels_reconnect_listener() {
    let source = FakeUserSource::new();
    source.push_transport_error(1030);
    source.push_page(1030, page(1031..=1060));
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    ctx.wait_until("failure", |s| s.load_more.last_error.is_some())
        .await;

    ctx.send(UserListMessage::LoadMore(1030));
    ctx.wait_until("manual retry", |s| s.total_users == 60).await;

    ctx.connectivity.set_online(false);
    ctx.connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(source.calls_for(1030), 2);
    assert_eq!(source.calls_for(1060), 0);
    ctx.stop();
}

#[tokio::test]
async fn test_refresh_replaces_working_set() {
    let source = FakeUserSource::new();
    source.push_page(1030, page(1031..=1060));
    let ctx = loaded_context(source.clone()).await;
    ctx.send(UserListMessage::LoadMore(1030));
    ctx.wait_until("second page", |s| s.total_users == 60).await;

    source.push_page(0, page(2001..=2010));
    let status = refresh_and_wait(&ctx.actor, Duration::from_secs(2))
        .await
        .unwrap();

    assert!(!status.in_progress);
    assert_eq!(status.last_error, None);

    let snapshot = ctx.snapshot().await;
    assert_eq!(snapshot.total_users, 10);
    assert_eq!(snapshot.last_user_id, 2010);
    assert_eq!(snapshot.users[0].user.id, 2001);
    ctx.stop();
}

#[tokio::test]
async fn test_refresh_failure_reports_error_and_keeps_users() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;

    source.push_transport_error(0);
    let status = refresh_and_wait(&ctx.actor, Duration::from_secs(2))
        .await
        .unwrap();

    assert!(status.last_error.is_some());
    let snapshot = ctx.snapshot().await;
    assert_eq!(snapshot.total_users, 30);
    assert_eq!(snapshot.last_user_id, 1030);
    assert!(snapshot.page_error.is_some());
    ctx.stop();
}

#[tokio::test]
async fn test_concurrent_refresh_requests_share_one_fetch() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;
    source.push_page_after(0, page(1..=5), Duration::from_millis(100));

    let (first, second) = tokio::join!(
        refresh_and_wait(&ctx.actor, Duration::from_secs(2)),
        refresh_and_wait(&ctx.actor, Duration::from_secs(2)),
    );

    assert_eq!(first.unwrap().last_error, None);
    assert_eq!(second.unwrap().last_error, None);
    // One fetch for the initial load, one for the shared refresh
    assert_eq!(source.calls_for(0), 2);
    ctx.stop();
}

#[tokio::test]
async fn test_late_load_more_lands_after_refresh() {
    let source = FakeUserSource::new();
    source.push_page_after(1030, page(1031..=1040), Duration::from_millis(150));
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::LoadMore(1030));
    source.push_page(0, page(1001..=1030));
    refresh_and_wait(&ctx.actor, Duration::from_secs(2))
        .await
        .unwrap();

    // Results apply in arrival order: the slow page appends to the refreshed set
    let snapshot = ctx.wait_until("slow page", |s| s.total_users == 40).await;
    assert_eq!(snapshot.last_user_id, 1040);
    ctx.stop();
}

#[tokio::test]
async fn test_search_is_debounced() {
    let source = FakeUserSource::new();
    source.push_page(
        0,
        vec![
            named(1, "alice"),
            named(2, "Alice-Cooper"),
            named(3, "alistair"),
            named(4, "bob"),
        ],
    );
    let ctx = TestContext::start(source, quick_config()).await;
    ctx.send(UserListMessage::LoadInitial);
    ctx.wait_until("initial load", |s| s.total_users == 4).await;

    ctx.send(UserListMessage::SetSearchQuery("ali".to_string()));
    tokio::time::sleep(Duration::from_millis(30)).await;
    ctx.send(UserListMessage::SetSearchQuery("alice".to_string()));

    let snapshot = ctx.snapshot().await;
    assert_eq!(snapshot.search.input, "alice");
    assert_eq!(snapshot.search.effective, "");
    assert_eq!(snapshot.users.len(), 4);

    let snapshot = ctx
        .wait_until("query applied", |s| s.search.applied_count > 0)
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = ctx.snapshot().await;

    assert_eq!(settled.search.applied_count, 1);
    assert_eq!(snapshot.search.effective, "alice");
    let logins: Vec<&str> = settled.users.iter().map(|u| u.user.login.as_str()).collect();
    assert_eq!(logins, vec!["alice", "Alice-Cooper"]);
    assert_eq!(settled.total_users, 4);
    ctx.stop();
}

#[tokio::test]
async fn test_scroll_does_not_load_while_searching() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;

    ctx.send(UserListMessage::SetSearchQuery("user10".to_string()));
    ctx.wait_until("query applied", |s| s.search.applied_count == 1)
        .await;
    ctx.send(UserListMessage::ScrollNearBottom);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls_for(1030), 0);

    ctx.send(UserListMessage::SetSearchQuery(String::new()));
    ctx.wait_until("query cleared", |s| s.search.applied_count == 2)
        .await;
    ctx.send(UserListMessage::ScrollNearBottom);
    ctx.wait_until("scroll load", |s| s.end_reached).await;
    assert_eq!(source.calls_for(1030), 1);
    ctx.stop();
}

#[tokio::test]
async fn test_bookmarks_are_persisted_and_flagged() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source).await;

    ctx.send(UserListMessage::Bookmark(user(1005)));
    ctx.send(UserListMessage::Bookmark(user(1005)));
    // Not in the working set, still bookmarkable
    ctx.send(UserListMessage::Bookmark(user(42)));

    let snapshot = ctx
        .wait_until("bookmarks", |s| s.bookmarks.len() == 2)
        .await;
    assert_eq!(persisted_bookmarks(&ctx.store), vec![user(1005), user(42)]);

    let flagged: Vec<u64> = snapshot
        .users
        .iter()
        .filter(|u| u.bookmarked)
        .map(|u| u.user.id)
        .collect();
    assert_eq!(flagged, vec![1005]);

    ctx.send(UserListMessage::Unbookmark(1005));
    ctx.wait_until("unbookmark", |s| s.bookmarks.len() == 1).await;
    assert_eq!(persisted_bookmarks(&ctx.store), vec![user(42)]);
    ctx.stop();
}

#[tokio::test]
async fn test_bookmarks_survive_refresh_and_filter_with_query() {
    let source = FakeUserSource::new();
    let ctx = loaded_context(source.clone()).await;
    ctx.send(UserListMessage::Bookmark(user(1001)));
    ctx.send(UserListMessage::Bookmark(named(7, "octocat")));

    source.push_page(0, page(5001..=5002));
    refresh_and_wait(&ctx.actor, Duration::from_secs(2))
        .await
        .unwrap();

    ctx.send(UserListMessage::SetSearchQuery("OCTO".to_string()));
    let snapshot = ctx
        .wait_until("query applied", |s| s.search.applied_count == 1)
        .await;

    assert_eq!(snapshot.bookmarks.len(), 2);
    assert_eq!(snapshot.visible_bookmarks, vec![named(7, "octocat")]);
    ctx.stop();
}

#[tokio::test]
async fn test_initial_load_resyncs_bookmarks_from_store() {
    let source = FakeUserSource::new();
    source.push_page(0, page(1..=2));
    let store = MemoryStore::new();
    let ctx = TestContext::start_with_store(source, store.clone(), quick_config()).await;

    store
        .set(
            BOOKMARKED_USERS_KEY,
            &serde_json::to_vec(&vec![user(77)]).unwrap(),
        )
        .unwrap();
    assert!(ctx.snapshot().await.bookmarks.is_empty());

    ctx.send(UserListMessage::LoadInitial);
    let snapshot = ctx.wait_until("initial load", |s| s.total_users == 2).await;

    assert_eq!(snapshot.bookmarks, vec![user(77)]);
    ctx.stop();
}

#[tokio::test]
async fn test_stopping_with_fetch_in_flight_drops_result() {
    let source = FakeUserSource::new();
    source.push_page_after(0, page(1..=3), Duration::from_millis(100));
    let ctx = TestContext::start(source.clone(), quick_config()).await;

    ctx.send(UserListMessage::LoadInitial);
    tokio::time::sleep(Duration::from_millis(20)).await;
    ctx.stop();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(source.calls(), vec![0]);
    assert!(ctx.actor.send_message(UserListMessage::LoadInitial).is_err());
}
