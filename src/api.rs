use crate::actors::{fetch_snapshot, refresh_and_wait, UserListMessage};
use crate::health::{health_routes, AppState};
use crate::models::User;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);
const REFRESH_TIMEOUT: Duration = Duration::from_secs(60);

/// Response for accepted intents
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Response for errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadMoreRequest {
    /// Defaults to the current cursor
    pub cursor: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarksResponse {
    pub bookmarks: Vec<User>,
    pub visible_bookmarks: Vec<User>,
}

/// Routes for every presentation intent plus the health probes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/load", post(load_initial))
        .route("/users/load-more", post(load_more))
        .route("/users/scroll", post(scroll_near_bottom))
        .route("/users/refresh", post(refresh))
        .route("/search", put(set_search_query))
        .route("/bookmarks", get(get_bookmarks).post(bookmark_user))
        .route("/bookmarks/:id", delete(unbookmark_user))
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router until the listener fails
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, create_router(state)).await
}

fn dispatch(state: &AppState, message: UserListMessage, accepted: &str) -> Response {
    match state.user_list.send_message(message) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(SuccessResponse {
                success: true,
                message: accepted.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to reach user list: {}", e);
            unavailable(format!("Failed to reach user list: {}", e))
        }
    }
}

fn unavailable(error: String) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error })).into_response()
}

async fn get_users(State(state): State<AppState>) -> Response {
    match fetch_snapshot(&state.user_list, SNAPSHOT_TIMEOUT).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => unavailable(e.to_string()),
    }
}

async fn load_initial(State(state): State<AppState>) -> Response {
    dispatch(&state, UserListMessage::LoadInitial, "Initial load requested")
}

async fn load_more(
    State(state): State<AppState>,
    request: Option<Json<LoadMoreRequest>>,
) -> Response {
    let request = request.map(|Json(request)| request).unwrap_or_default();

    let cursor = match request.cursor {
        Some(cursor) => cursor,
        None => match fetch_snapshot(&state.user_list, SNAPSHOT_TIMEOUT).await {
            Ok(snapshot) => snapshot.last_user_id,
            Err(e) => return unavailable(e.to_string()),
        },
    };

    if cursor == 0 {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Nothing loaded yet, cannot load more".to_string(),
            }),
        )
            .into_response();
    }

    dispatch(
        &state,
        UserListMessage::LoadMore(cursor),
        &format!("Load more requested from cursor {}", cursor),
    )
}

async fn scroll_near_bottom(State(state): State<AppState>) -> Response {
    dispatch(&state, UserListMessage::ScrollNearBottom, "Scroll position noted")
}

/// Waits for the refresh to settle so the caller can hold its spinner
async fn refresh(State(state): State<AppState>) -> Response {
    match refresh_and_wait(&state.user_list, REFRESH_TIMEOUT).await {
        Ok(status) => match status.last_error {
            None => (StatusCode::OK, Json(status)).into_response(),
            Some(error) => (StatusCode::BAD_GATEWAY, Json(ErrorResponse { error })).into_response(),
        },
        Err(e) => unavailable(e.to_string()),
    }
}

async fn set_search_query(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    dispatch(
        &state,
        UserListMessage::SetSearchQuery(request.query),
        "Search query updated",
    )
}

async fn get_bookmarks(State(state): State<AppState>) -> Response {
    match fetch_snapshot(&state.user_list, SNAPSHOT_TIMEOUT).await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(BookmarksResponse {
                bookmarks: snapshot.bookmarks,
                visible_bookmarks: snapshot.visible_bookmarks,
            }),
        )
            .into_response(),
        Err(e) => unavailable(e.to_string()),
    }
}

async fn bookmark_user(State(state): State<AppState>, Json(user): Json<User>) -> Response {
    let message = format!("Bookmarked {}", user.login);
    dispatch(&state, UserListMessage::Bookmark(user), &message)
}

async fn unbookmark_user(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    dispatch(
        &state,
        UserListMessage::Unbookmark(id),
        &format!("Removed bookmark {}", id),
    )
}
