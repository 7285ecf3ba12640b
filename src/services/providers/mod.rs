//! External collaborator abstraction
//!
//! The identity provider, the profile document store and the image store are reached
//! through these traits. Each has a remote implementation and a local in-process one
//! used for development and tests.

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{AccountUpdate, AchievementDefinition, OAuthCredential, User, UserProfile},
};

pub mod auth_state;
pub mod firebase_storage;
pub mod identity_toolkit;
pub mod local;

pub use auth_state::{AuthListener, AuthState, AuthSubscription};

/// Trait for identity providers
///
/// Implementations own the signed-in session and broadcast every transition to
/// subscribers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a listener for auth-state changes
    ///
    /// The listener receives the current identity right after registration and again on
    /// every transition until the returned subscription is released.
    fn subscribe(&self, listener: AuthListener) -> AuthSubscription;

    /// Identity of the signed-in user, if any
    fn current_user(&self) -> Option<User>;

    /// Bearer token of the current session, used by the image store
    async fn id_token(&self) -> Option<String>;

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<User>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<User>;

    /// Exchanges a token issued by an external OAuth provider for a session
    async fn sign_in_with_oauth(&self, credential: &OAuthCredential) -> AppResult<User>;

    async fn sign_out(&self) -> AppResult<()>;

    /// Updates display name and/or photo URL of the signed-in account
    async fn update_account(&self, update: &AccountUpdate) -> AppResult<User>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for the profile document store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, uid: &str) -> AppResult<Option<UserProfile>>;

    /// Writes the whole document, creating it if needed
    async fn store(&self, uid: &str, profile: &UserProfile) -> AppResult<()>;

    /// Looks up an entry of the achievement catalog
    async fn achievement(&self, id: &str) -> AppResult<Option<AchievementDefinition>>;

    /// Profiles whose display name starts with `prefix`
    async fn search_by_display_name(&self, prefix: &str) -> AppResult<Vec<UserProfile>>;
}

/// Trait for blob storage of user images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Uploads `bytes` at `path` and returns a download URL
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
        auth_token: Option<String>,
    ) -> AppResult<String>;
}
