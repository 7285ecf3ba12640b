use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::{
    error::AppResult,
    models::{AchievementDefinition, UserProfile},
    services::providers::ProfileStore,
};

const SEARCH_LIMIT: i64 = 50;

/// Profile documents stored as JSONB, one row per user
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        let document: Option<Json<UserProfile>> =
            sqlx::query_scalar("SELECT document FROM user_profiles WHERE uid = $1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;

        Ok(document.map(|Json(profile)| profile))
    }

    async fn store(&self, uid: &str, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (uid, document, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (uid) DO UPDATE
            SET document = EXCLUDED.document, updated_at = now()
            "#,
        )
        .bind(uid)
        .bind(Json(profile))
        .execute(&self.pool)
        .await?;

        tracing::debug!(uid = %uid, "Stored profile document");
        Ok(())
    }

    async fn achievement(&self, id: &str) -> AppResult<Option<AchievementDefinition>> {
        let achievement = sqlx::query_as::<_, AchievementDefinition>(
            "SELECT id, name, description, icon FROM achievements WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(achievement)
    }

    async fn search_by_display_name(&self, prefix: &str) -> AppResult<Vec<UserProfile>> {
        let documents: Vec<Json<UserProfile>> = sqlx::query_scalar(
            r#"
            SELECT document FROM user_profiles
            WHERE starts_with(document->>'displayName', $1)
            ORDER BY document->>'displayName'
            LIMIT $2
            "#,
        )
        .bind(prefix)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents.into_iter().map(|Json(profile)| profile).collect())
    }
}
