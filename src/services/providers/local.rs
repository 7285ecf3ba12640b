//! In-process providers for development and tests.
//!
//! Accounts, profile documents and images live in memory and vanish with the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, AuthError},
    models::{AccountUpdate, AchievementDefinition, OAuthCredential, User, UserProfile},
    services::providers::{
        AuthListener, AuthState, AuthSubscription, IdentityProvider, ImageStore, ProfileStore,
    },
};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: Option<String>,
    user: User,
}

/// Identity provider backed by an in-memory account table
#[derive(Default)]
pub struct LocalIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<String>>,
    auth: AuthState,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    async fn establish(&self, user: User) -> User {
        *self.session.write().await = Some(Uuid::new_v4().to_string());
        self.auth.set(Some(user.clone()));
        tracing::info!(uid = %user.uid, "Signed in");
        user
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail.into()),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn subscribe(&self, listener: AuthListener) -> AuthSubscription {
        self.auth.subscribe(listener)
    }

    fn current_user(&self) -> Option<User> {
        self.auth.current()
    }

    async fn id_token(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }

        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailAlreadyInUse.into());
            }
            let user = User {
                uid: Uuid::new_v4().simple().to_string(),
                email: Some(email.clone()),
                display_name: None,
                photo_url: None,
            };
            accounts.insert(
                email,
                Account {
                    password: Some(password.to_string()),
                    user: user.clone(),
                },
            );
            user
        };

        Ok(self.establish(user).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email)?;
        let user = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&email).ok_or(AuthError::UserNotFound)?;
            if account.password.as_deref() != Some(password) {
                return Err(AuthError::WrongPassword.into());
            }
            account.user.clone()
        };

        Ok(self.establish(user).await)
    }

    async fn sign_in_with_oauth(&self, credential: &OAuthCredential) -> AppResult<User> {
        if credential.id_token.is_empty() {
            return Err(AuthError::OAuthCancelled.into());
        }

        // The local backend treats the OAuth token as the account's email.
        let email = normalize_email(&credential.id_token)?;
        let user = {
            let mut accounts = self.accounts.write().await;
            if let Some(account) = accounts.get(&email) {
                if account.password.is_some() {
                    return Err(AuthError::AccountExistsWithDifferentCredential.into());
                }
                account.user.clone()
            } else {
                let user = User {
                    uid: format!("{}:{}", credential.provider_id, Uuid::new_v4().simple()),
                    email: Some(email.clone()),
                    display_name: email.split('@').next().map(str::to_string),
                    photo_url: None,
                };
                accounts.insert(
                    email,
                    Account {
                        password: None,
                        user: user.clone(),
                    },
                );
                user
            }
        };

        Ok(self.establish(user).await)
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.session.write().await.take();
        self.auth.set(None);
        Ok(())
    }

    async fn update_account(&self, update: &AccountUpdate) -> AppResult<User> {
        let current = self
            .auth
            .current()
            .ok_or_else(|| AppError::Unauthorized("No authenticated user".to_string()))?;

        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|account| account.user.uid == current.uid)
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = &update.display_name {
            account.user.display_name = Some(name.clone());
        }
        if let Some(url) = &update.photo_url {
            account.user.photo_url = Some(url.clone());
        }

        let user = account.user.clone();
        self.auth.set(Some(user.clone()));
        Ok(user)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Achievements offered by the local backend, matching the rows seeded by the migrations
pub fn achievement_catalog() -> Vec<AchievementDefinition> {
    [
        ("first_favorite", "First favorite", "Added a show to favorites", "heart"),
        ("binge_watcher", "Binge watcher", "Watched ten episodes in one day", "tv"),
        ("explorer", "Explorer", "Opened twenty different shows", "compass"),
    ]
    .into_iter()
    .map(|(id, name, description, icon)| AchievementDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

/// Profile documents and achievement catalog held in memory
#[derive(Default)]
pub struct LocalProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    achievements: HashMap<String, AchievementDefinition>,
}

impl LocalProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose catalog contains `achievements`
    pub fn with_achievements(achievements: impl IntoIterator<Item = AchievementDefinition>) -> Self {
        Self {
            profiles: RwLock::default(),
            achievements: achievements
                .into_iter()
                .map(|achievement| (achievement.id.clone(), achievement))
                .collect(),
        }
    }
}

#[async_trait]
impl ProfileStore for LocalProfileStore {
    async fn load(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(uid).cloned())
    }

    async fn store(&self, uid: &str, profile: &UserProfile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn achievement(&self, id: &str) -> AppResult<Option<AchievementDefinition>> {
        Ok(self.achievements.get(id).cloned())
    }

    async fn search_by_display_name(&self, prefix: &str) -> AppResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let mut matches: Vec<UserProfile> = profiles
            .values()
            .filter(|profile| {
                profile
                    .display_name
                    .as_deref()
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(matches)
    }
}

/// Image store that keeps uploads in memory and serves them under `base_url`
pub struct LocalImageStore {
    base_url: String,
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl LocalImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::default(),
        }
    }

    /// Content type and bytes stored at `path`
    pub async fn get(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(path).cloned()
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
        _auth_token: Option<String>,
    ) -> AppResult<String> {
        if path.is_empty() {
            return Err(AppError::Storage("Empty object path".to_string()));
        }
        self.objects
            .write()
            .await
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
    }
}
