use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{AccountUpdate, ProfileStats, User, UserProfile},
    services::providers::{IdentityProvider, ImageStore, ProfileStore},
};

const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Extended-profile operations for the signed-in user
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    images: Arc<dyn ImageStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        images: Arc<dyn ImageStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            images,
            identity,
        }
    }

    pub async fn get_profile(&self, user: &User) -> AppResult<Option<UserProfile>> {
        self.store.load(&user.uid).await
    }

    /// Merges `update` into the stored document, creating a seeded one on first save
    pub async fn save_profile(&self, user: &User, update: UserProfile) -> AppResult<UserProfile> {
        let now = Utc::now();
        let mut profile = match self.store.load(&user.uid).await? {
            Some(existing) => existing,
            None => {
                tracing::info!(uid = %user.uid, "Creating profile document");
                let mut seeded = UserProfile::seeded(user, now);
                if seeded.display_name.is_none() {
                    seeded.display_name = update.display_name.clone();
                }
                seeded
            }
        };

        profile.merge(update);
        profile.updated_at = Some(now);

        self.store.store(&user.uid, &profile).await?;
        Ok(profile)
    }

    /// Merges `stats` into the stored statistics; users without a document are skipped
    pub async fn update_stats(&self, user: &User, stats: ProfileStats) -> AppResult<()> {
        let Some(mut profile) = self.store.load(&user.uid).await? else {
            tracing::debug!(uid = %user.uid, "No profile document, stats update skipped");
            return Ok(());
        };

        profile.stats.get_or_insert_with(ProfileStats::default).merge(stats);
        self.store.store(&user.uid, &profile).await
    }

    /// Appends a catalog achievement unless it is already unlocked or unknown
    pub async fn unlock_achievement(&self, user: &User, achievement_id: &str) -> AppResult<()> {
        let Some(mut profile) = self.store.load(&user.uid).await? else {
            return Ok(());
        };

        if profile.has_achievement(achievement_id) {
            tracing::debug!(uid = %user.uid, achievement = %achievement_id, "Achievement already unlocked");
            return Ok(());
        }

        let Some(definition) = self.store.achievement(achievement_id).await? else {
            tracing::warn!(achievement = %achievement_id, "Unknown achievement");
            return Ok(());
        };

        profile
            .achievements
            .get_or_insert_with(Vec::new)
            .push(definition.unlock(Utc::now()));
        self.store.store(&user.uid, &profile).await?;

        tracing::info!(uid = %user.uid, achievement = %achievement_id, "Achievement unlocked");
        Ok(())
    }

    /// Uploads a new profile image and points the account photo at it
    pub async fn upload_profile_image(
        &self,
        user: &User,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Image is empty".to_string()));
        }

        let extension = image_extension(file_name);
        let path = format!(
            "profile_images/profile_{}_{}.{}",
            user.uid,
            Utc::now().timestamp_millis(),
            extension
        );

        let token = self.identity.id_token().await;
        let url = self
            .images
            .upload(&path, content_type_for(&extension), bytes, token)
            .await?;

        self.identity
            .update_account(&AccountUpdate {
                display_name: None,
                photo_url: Some(url.clone()),
            })
            .await?;

        Ok(url)
    }

    pub async fn update_account(&self, update: AccountUpdate) -> AppResult<User> {
        if update.display_name.is_none() && update.photo_url.is_none() {
            return Err(AppError::InvalidInput("Nothing to update".to_string()));
        }
        self.identity.update_account(&update).await
    }

    pub async fn search_users(&self, prefix: &str) -> AppResult<Vec<UserProfile>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_by_display_name(prefix).await
    }
}

fn image_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
