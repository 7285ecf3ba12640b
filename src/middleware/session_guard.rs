use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::{
    api::AppState, error::AppError, middleware::request_id::record_viewer,
    services::session::RouteAccess,
};

/// Where unauthenticated visitors of protected views are sent
pub const LOGIN_PATH: &str = "/login";

/// Seconds a client should wait while the session is still resolving
const RESOLVING_RETRY_AFTER: &str = "1";

/// Lets the request through only for the signed-in user.
///
/// The caller must present the session's id token as a bearer token. The user is added
/// to the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match state.session.access() {
        RouteAccess::Granted(user) => user,
        RouteAccess::Resolving => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, RESOLVING_RETRY_AFTER)],
                Json(json!({ "error": "Session is still resolving" })),
            )
                .into_response()
        }
        RouteAccess::RedirectToLogin => {
            tracing::debug!(uri = %request.uri(), "Unauthenticated access to protected view");
            return Redirect::temporary(LOGIN_PATH).into_response();
        }
    };

    let session_token = state.identity.id_token().await;
    let authorized = matches!(
        (bearer_token(request.headers()), session_token.as_deref()),
        (Some(presented), Some(expected)) if presented == expected
    );
    if !authorized {
        tracing::warn!(uri = %request.uri(), "Protected view requested without the session token");
        return AppError::Unauthorized("Missing or invalid bearer token".to_string())
            .into_response();
    }

    record_viewer(&user.uid);
    request.extensions_mut().insert(user);
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
