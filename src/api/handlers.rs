use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::models::{Show, ShowId};
use crate::services::session::SessionState;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: ShowId,
    pub member: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Current authentication state
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.snapshot())
}

/// Get all favorites in insertion order
pub async fn get_favorites(State(state): State<AppState>) -> Json<Vec<Show>> {
    let library = state.library.read().await;
    Json(library.favorites().to_vec())
}

/// Add a show to favorites; re-adding a known id keeps the stored show
pub async fn add_favorite(
    State(state): State<AppState>,
    Json(show): Json<Show>,
) -> Json<MembershipResponse> {
    let id = show.id;
    state.library.write().await.add_favorite(show);
    Json(MembershipResponse { id, member: true })
}

pub async fn remove_favorite(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    state.library.write().await.remove_favorite(ShowId(id));
    StatusCode::NO_CONTENT
}

pub async fn favorite_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<MembershipResponse> {
    let id = ShowId(id);
    let member = state.library.read().await.is_favorite(id);
    Json(MembershipResponse { id, member })
}

/// Get the watchlist in insertion order
pub async fn get_watchlist(State(state): State<AppState>) -> Json<Vec<Show>> {
    let library = state.library.read().await;
    Json(library.watchlist().to_vec())
}

pub async fn add_watchlist(
    State(state): State<AppState>,
    Json(show): Json<Show>,
) -> Json<MembershipResponse> {
    let id = show.id;
    state.library.write().await.add_watchlist(show);
    Json(MembershipResponse { id, member: true })
}

pub async fn remove_watchlist(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    state.library.write().await.remove_watchlist(ShowId(id));
    StatusCode::NO_CONTENT
}

pub async fn watchlist_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<MembershipResponse> {
    let id = ShowId(id);
    let member = state.library.read().await.is_in_watchlist(id);
    Json(MembershipResponse { id, member })
}

/// Get the viewing history, most recent first
pub async fn get_recently_viewed(State(state): State<AppState>) -> Json<Vec<Show>> {
    let library = state.library.read().await;
    Json(library.recently_viewed().to_vec())
}

/// Record that a show's detail view was opened
pub async fn add_recently_viewed(
    State(state): State<AppState>,
    Json(show): Json<Show>,
) -> Json<Vec<Show>> {
    let mut library = state.library.write().await;
    library.add_recently_viewed(show);
    Json(library.recently_viewed().to_vec())
}

/// Clear the viewing history
pub async fn clear_recently_viewed(State(state): State<AppState>) -> StatusCode {
    state.library.write().await.clear_recently_viewed();
    StatusCode::NO_CONTENT
}
