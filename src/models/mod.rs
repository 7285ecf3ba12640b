mod profile;
mod show;
mod user;

pub use profile::{
    Achievement, AchievementDefinition, InterfaceLanguage, ProfilePreferences, ProfileStats,
    SocialLinks, UserProfile,
};
pub use show::{AirStatus, Language, Show, ShowId};
pub use user::{AccountUpdate, Credentials, OAuthCredential, User};
