use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Authentication failures, worded for display to the user
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication configuration not found. Please check the identity provider setup.")]
    ConfigurationNotFound,

    #[error("This email is already in use. Please try another email or sign in.")]
    EmailAlreadyInUse,

    #[error("Invalid email address format.")]
    InvalidEmail,

    #[error("This user account has been disabled.")]
    UserDisabled,

    #[error("No user found with this email address.")]
    UserNotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Password is too weak. Please use a stronger password.")]
    WeakPassword,

    #[error("Network error. Please check your internet connection.")]
    NetworkRequestFailed,

    #[error("Too many unsuccessful login attempts. Please try again later.")]
    TooManyRequests,

    #[error("Sign-in with the external provider was cancelled. Please try again.")]
    OAuthCancelled,

    #[error("An account already exists with the same email address but different sign-in credentials.")]
    AccountExistsWithDifferentCredential,

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Maps an identity provider error code to a displayable error.
    ///
    /// Codes may carry a detail suffix (`WEAK_PASSWORD : Password should be...`);
    /// only the leading code is significant.
    pub fn from_provider_code(raw: &str) -> Self {
        let code = raw.split(" : ").next().unwrap_or(raw).trim();
        match code {
            "CONFIGURATION_NOT_FOUND" => AuthError::ConfigurationNotFound,
            "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "USER_DISABLED" => AuthError::UserDisabled,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthError::UserNotFound,
            "INVALID_PASSWORD" | "MISSING_PASSWORD" => AuthError::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyRequests,
            "USER_CANCELLED" => AuthError::OAuthCancelled,
            "FEDERATED_USER_ID_ALREADY_LINKED" | "EMAIL_EXISTS_WITH_DIFFERENT_CREDENTIAL" => {
                AuthError::AccountExistsWithDifferentCredential
            }
            _ => AuthError::Other(raw.to_string()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound
            | AuthError::WrongPassword
            | AuthError::InvalidCredentials
            | AuthError::UserDisabled => StatusCode::UNAUTHORIZED,
            AuthError::EmailAlreadyInUse | AuthError::AccountExistsWithDifferentCredential => {
                StatusCode::CONFLICT
            }
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::NetworkRequestFailed => StatusCode::BAD_GATEWAY,
            AuthError::ConfigurationNotFound => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidEmail
            | AuthError::WeakPassword
            | AuthError::OAuthCancelled
            | AuthError::Other(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(err) => (err.status(), err.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
