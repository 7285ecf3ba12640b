use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Extended profile document stored alongside the identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<ProfilePreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProfileStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<Achievement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

/// Interface language chosen in the profile settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceLanguage {
    Es,
    En,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<InterfaceLanguage>,
}

/// Viewing statistics; every field is optional so partial updates can be merged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shows_watched: Option<u32>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_watch_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_since: Option<DateTime<Utc>>,
}

impl ProfileStats {
    /// Overwrites every field that is set in `update`
    pub fn merge(&mut self, update: ProfileStats) {
        if update.shows_watched.is_some() {
            self.shows_watched = update.shows_watched;
        }
        if update.total_watch_time.is_some() {
            self.total_watch_time = update.total_watch_time;
        }
        if update.favorite_genre.is_some() {
            self.favorite_genre = update.favorite_genre;
        }
        if update.member_since.is_some() {
            self.member_since = update.member_since;
        }
    }
}

/// Achievement unlocked by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Catalog entry describing an achievement that can be unlocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl AchievementDefinition {
    pub fn unlock(&self, at: DateTime<Utc>) -> Achievement {
        Achievement {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            unlocked_at: at,
        }
    }
}

impl UserProfile {
    /// Fresh document for a user who has never saved a profile
    pub fn seeded(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            uid: Some(user.uid.clone()),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            stats: Some(ProfileStats {
                shows_watched: Some(0),
                total_watch_time: Some(0),
                favorite_genre: None,
                member_since: Some(now),
            }),
            achievements: Some(Vec::new()),
            created_at: Some(now),
            ..Self::default()
        }
    }

    /// Shallow merge: each top-level field set in `update` replaces the stored one
    pub fn merge(&mut self, update: UserProfile) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if update.$field.is_some() { self.$field = update.$field; })*
            };
        }
        take!(
            uid,
            email,
            display_name,
            photo_url,
            bio,
            location,
            favorite_genres,
            social_links,
            preferences,
            stats,
            achievements,
            created_at,
            updated_at
        );
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements
            .as_deref()
            .is_some_and(|unlocked| unlocked.iter().any(|a| a.id == id))
    }
}
