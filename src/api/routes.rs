use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    request_id::{make_span_with_request_id, request_id_middleware},
    session_guard::require_session,
};

use super::{account, handlers, AppState};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Collections
        .route(
            "/favorites",
            get(handlers::get_favorites).post(handlers::add_favorite),
        )
        .route(
            "/favorites/:id",
            get(handlers::favorite_status).delete(handlers::remove_favorite),
        )
        .route(
            "/watchlist",
            get(handlers::get_watchlist).post(handlers::add_watchlist),
        )
        .route(
            "/watchlist/:id",
            get(handlers::watchlist_status).delete(handlers::remove_watchlist),
        )
        .route(
            "/recently-viewed",
            get(handlers::get_recently_viewed)
                .post(handlers::add_recently_viewed)
                .delete(handlers::clear_recently_viewed),
        )
        // Session
        .route("/session", get(handlers::get_session))
        .route("/auth/sign-up", post(account::sign_up))
        .route("/auth/sign-in", post(account::sign_in))
        .route("/auth/oauth", post(account::sign_in_with_oauth))
        .route("/auth/sign-out", post(account::sign_out))
        .route("/users/search", get(account::search_users))
        .merge(protected_routes(state))
}

/// Views that require a signed-in user
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::get_profile).put(account::save_profile),
        )
        .route("/profile/stats", patch(account::update_stats))
        .route(
            "/profile/achievements/:id",
            post(account::unlock_achievement),
        )
        .route("/profile/image", post(account::upload_profile_image))
        .route("/account", put(account::update_account))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
