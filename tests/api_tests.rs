use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use pandrama::api::{create_router, AppState};
use pandrama::config::Config;
use pandrama::error::{AppError, AppResult};
use pandrama::models::{AccountUpdate, OAuthCredential, User};
use pandrama::services::library::Library;
use pandrama::services::providers::local::{LocalImageStore, LocalProfileStore};
use pandrama::services::providers::{AuthListener, AuthSubscription, IdentityProvider};

async fn create_test_server() -> (TestServer, AppState) {
    let state = AppState::local(&Config::default());
    state.session.wait_until_resolved().await;
    let app = create_router(state.clone());
    (TestServer::new(app).unwrap(), state)
}

fn show(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "imageUrl": format!("https://img.example/{}.jpg", id),
        "rating": 8.4
    })
}

fn ids(shows: &[Value]) -> Vec<u64> {
    shows.iter().map(|s| s["id"].as_u64().unwrap()).collect()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Signs up and returns the session's bearer token
async fn sign_up(server: &TestServer, state: &AppState) -> String {
    let response = server
        .post("/api/v1/auth/sign-up")
        .json(&json!({ "email": "mina@example.com", "password": "secret1" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "mina@example.com");

    let mut rx = state.session.watch();
    rx.wait_for(|s| s.user.is_some()).await.unwrap();
    body["idToken"].as_str().unwrap().to_string()
}

/// Identity provider that never reports, leaving the session unresolved
struct SilentIdentity;

#[async_trait]
impl IdentityProvider for SilentIdentity {
    fn subscribe(&self, _listener: AuthListener) -> AuthSubscription {
        AuthSubscription::noop()
    }

    fn current_user(&self) -> Option<User> {
        None
    }

    async fn id_token(&self) -> Option<String> {
        None
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> AppResult<User> {
        Err(AppError::Internal("unavailable".to_string()))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AppResult<User> {
        Err(AppError::Internal("unavailable".to_string()))
    }

    async fn sign_in_with_oauth(&self, _credential: &OAuthCredential) -> AppResult<User> {
        Err(AppError::Internal("unavailable".to_string()))
    }

    async fn sign_out(&self) -> AppResult<()> {
        Ok(())
    }

    async fn update_account(&self, _update: &AccountUpdate) -> AppResult<User> {
        Err(AppError::Internal("unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(response.header("x-request-id").to_str().is_ok());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (server, _) = create_test_server().await;
    let id = "3f0c6a4e-8a53-4c1e-9a7f-2d4b1b8f5a10";
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;
    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_favorite_added_once() {
    let (server, _) = create_test_server().await;

    server.post("/api/v1/favorites").json(&show(1, "Move to Heaven")).await.assert_status_ok();
    server.post("/api/v1/favorites").json(&show(1, "Other title")).await.assert_status_ok();

    let favorites: Vec<Value> = server.get("/api/v1/favorites").await.json();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["title"], "Move to Heaven");

    let status: Value = server.get("/api/v1/favorites/1").await.json();
    assert_eq!(status["member"], true);
}

#[tokio::test]
async fn test_remove_favorite() {
    let (server, _) = create_test_server().await;
    server.post("/api/v1/favorites").json(&show(2, "Kingdom")).await;

    server
        .delete("/api/v1/favorites/2")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete("/api/v1/favorites/2")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let status: Value = server.get("/api/v1/favorites/2").await.json();
    assert_eq!(status["member"], false);
}

#[tokio::test]
async fn test_watchlist_independent_of_favorites() {
    let (server, _) = create_test_server().await;
    server.post("/api/v1/favorites").json(&show(3, "Signal")).await;

    let status: Value = server.get("/api/v1/watchlist/3").await.json();
    assert_eq!(status["member"], false);

    server.post("/api/v1/watchlist").json(&show(3, "Signal")).await;
    let watchlist: Vec<Value> = server.get("/api/v1/watchlist").await.json();
    assert_eq!(ids(&watchlist), vec![3]);
}

#[tokio::test]
async fn test_recently_viewed_order_and_cap() {
    let (server, _) = create_test_server().await;

    for id in 1..=11 {
        server
            .post("/api/v1/recently-viewed")
            .json(&show(id, "Show"))
            .await
            .assert_status_ok();
    }
    let history: Vec<Value> = server.get("/api/v1/recently-viewed").await.json();
    assert_eq!(ids(&history), vec![11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);

    let history: Vec<Value> = server
        .post("/api/v1/recently-viewed")
        .json(&show(5, "Show"))
        .await
        .json();
    assert_eq!(ids(&history), vec![5, 11, 10, 9, 8, 7, 6, 4, 3, 2]);
}

#[tokio::test]
async fn test_clear_recently_viewed() {
    let (server, _) = create_test_server().await;
    server.post("/api/v1/recently-viewed").json(&show(1, "Show")).await;

    server
        .delete("/api/v1/recently-viewed")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let history: Vec<Value> = server.get("/api/v1/recently-viewed").await.json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_malformed_show_is_rejected_by_extractor() {
    let (server, _) = create_test_server().await;
    let response = server
        .post("/api/v1/favorites")
        .json(&json!({ "title": "no id" }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_protected_view_redirects_to_login() {
    let (server, _) = create_test_server().await;
    let response = server.get("/api/v1/profile").await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn test_session_reports_signed_in_user() {
    let (server, state) = create_test_server().await;

    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["resolving"], false);
    assert!(session["user"].is_null());

    sign_up(&server, &state).await;

    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["user"]["email"], "mina@example.com");
}

#[tokio::test]
async fn test_sign_in_errors_are_displayable() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/v1/auth/sign-in")
        .json(&json!({ "email": "nobody@example.com", "password": "secret1" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "No user found with this email address.");

    let response = server
        .post("/api/v1/auth/sign-up")
        .json(&json!({ "email": "mina@example.com", "password": "123" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_flow() {
    let (server, state) = create_test_server().await;
    let token = sign_up(&server, &state).await;

    let profile: Value = server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert!(profile.is_null());

    let response = server
        .put("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "displayName": "Mina", "bio": "K-drama fan" }))
        .await;
    response.assert_status_ok();
    let saved: Value = response.json();
    assert_eq!(saved["displayName"], "Mina");
    assert_eq!(saved["stats"]["showsWatched"], 0);

    server
        .patch("/api/v1/profile/stats")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "showsWatched": 4 }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let profile: Value = server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(profile["stats"]["showsWatched"], 4);
    assert_eq!(profile["stats"]["totalWatchTime"], 0);
    assert_eq!(profile["bio"], "K-drama fan");

    let found: Vec<Value> = server
        .get("/api/v1/users/search")
        .add_query_param("q", "Mi")
        .await
        .json();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_profile_image_upload_sets_photo() {
    let (server, state) = create_test_server().await;
    let token = sign_up(&server, &state).await;

    let response = server
        .post("/api/v1/profile/image")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .add_query_param("filename", "avatar.png")
        .bytes(vec![137u8, 80, 78, 71].into())
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost:9199/profile_images/profile_"));
    assert!(url.ends_with(".png"));

    let mut rx = state.session.watch();
    rx.wait_for(|s| s.user.as_ref().and_then(|u| u.photo_url.as_deref()) == Some(url.as_str()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sign_out_closes_protected_views() {
    let (server, state) = create_test_server().await;
    let token = sign_up(&server, &state).await;
    server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    server
        .post("/api/v1/auth/sign-out")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let mut rx = state.session.watch();
    rx.wait_for(|s| s.user.is_none()).await.unwrap();

    server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_protected_view_requires_session_token() {
    let (server, state) = create_test_server().await;
    let token = sign_up(&server, &state).await;
    server
        .put("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "bio": "private" }))
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/profile").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body.get("bio").is_none());

    server
        .put("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer("forged"))
        .json(&json!({ "bio": "changed" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let profile: Value = server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(profile["bio"], "private");
}

#[tokio::test]
async fn test_unlocked_achievement_is_stored() {
    let (server, state) = create_test_server().await;
    let token = sign_up(&server, &state).await;
    server
        .put("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "displayName": "Mina" }))
        .await
        .assert_status_ok();

    server
        .post("/api/v1/profile/achievements/first_favorite")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let profile: Value = server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    let achievements = profile["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0]["id"], "first_favorite");
    assert_eq!(achievements[0]["icon"], "heart");
}

#[tokio::test]
async fn test_protected_view_waits_while_session_resolves() {
    let config = Config::default();
    let state = AppState::new(
        Library::new(),
        Arc::new(SilentIdentity),
        Arc::new(LocalProfileStore::new()),
        Arc::new(LocalImageStore::new(config.local_storage_url.clone())),
    );
    assert!(state.session.is_resolving());
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/api/v1/profile").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.header("retry-after"), "1");

    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["resolving"], true);
}
