use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{AccountUpdate, Credentials, OAuthCredential, ProfileStats, User, UserProfile},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    filename: Option<String>,
}

/// Signed-in user plus the bearer token for protected views
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
}

/// Create an account with email and password
pub async fn sign_up(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    tracing::info!(request_id = %request_id, "Processing sign-up");
    let user = state
        .identity
        .sign_up(&credentials.email, &credentials.password)
        .await?;
    Ok((StatusCode::CREATED, Json(with_token(&state, user).await?)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    tracing::info!(request_id = %request_id, "Processing sign-in");
    let user = state
        .identity
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(with_token(&state, user).await?))
}

/// Sign in with a token issued by an external OAuth provider
pub async fn sign_in_with_oauth(
    State(state): State<AppState>,
    Json(credential): Json<OAuthCredential>,
) -> AppResult<Json<AuthResponse>> {
    let user = state.identity.sign_in_with_oauth(&credential).await?;
    Ok(Json(with_token(&state, user).await?))
}

async fn with_token(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let id_token = state
        .identity
        .id_token()
        .await
        .ok_or_else(|| AppError::Internal("Signed in without a session token".to_string()))?;
    Ok(AuthResponse { user, id_token })
}

pub async fn sign_out(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.identity.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Find users whose display name starts with `q`
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let profiles = state.profiles.search_users(&params.q).await?;
    Ok(Json(profiles))
}

/// Stored profile document, `null` if none was saved yet
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Option<UserProfile>>> {
    let profile = state.profiles.get_profile(&user).await?;
    Ok(Json(profile))
}

pub async fn save_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(update): Json<UserProfile>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.profiles.save_profile(&user, update).await?;
    Ok(Json(profile))
}

pub async fn update_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(stats): Json<ProfileStats>,
) -> AppResult<StatusCode> {
    state.profiles.update_stats(&user, stats).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlock_achievement(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(achievement_id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .profiles
        .unlock_achievement(&user, &achievement_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the raw request body as the new profile image
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ImageQuery>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ImageResponse>)> {
    let file_name = params.filename.unwrap_or_default();
    let url = state
        .profiles
        .upload_profile_image(&user, &file_name, body.to_vec())
        .await?;
    Ok((StatusCode::CREATED, Json(ImageResponse { url })))
}

/// Change display name and/or photo URL of the account
pub async fn update_account(
    State(state): State<AppState>,
    Json(update): Json<AccountUpdate>,
) -> AppResult<Json<User>> {
    let user = state.profiles.update_account(update).await?;
    Ok(Json(user))
}
