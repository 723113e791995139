use uuid::Uuid;

use ladle_types::api::UserSearchResult;
use ladle_types::models::PrivacyPreferences;

use crate::ports::{FollowStore, PrivacyStore};
use crate::{Database, StoreError};

impl PrivacyStore for Database {
    async fn privacy_for(&self, user_id: Uuid) -> Result<Option<PrivacyPreferences>, StoreError> {
        let row = sqlx::query_as::<_, PrivacyPreferences>(
            "SELECT user_id, profile_visibility, show_email, show_full_name,
                    allow_follows, allow_messages, updated_at
             FROM privacy_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}

impl FollowStore for Database {
    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2
             )",
        )
        .bind(follower)
        .bind(followed)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn create_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower)
            .bind(followed)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn following_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        let rows = sqlx::query_as::<_, UserSearchResult>(
            "SELECT u.id, u.username,
                    CASE WHEN p.show_full_name THEN u.full_name END AS full_name,
                    u.created_at
             FROM follows f
             JOIN users u ON u.id = f.followed_id
             JOIN privacy_preferences p ON p.user_id = u.id
             WHERE f.follower_id = $1 AND u.is_active
             ORDER BY f.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn following_count(&self, user: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM follows f JOIN users u ON u.id = f.followed_id
             WHERE f.follower_id = $1 AND u.is_active",
        )
        .bind(user)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn followers_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        let rows = sqlx::query_as::<_, UserSearchResult>(
            "SELECT u.id, u.username,
                    CASE WHEN p.show_full_name THEN u.full_name END AS full_name,
                    u.created_at
             FROM follows f
             JOIN users u ON u.id = f.follower_id
             JOIN privacy_preferences p ON p.user_id = u.id
             WHERE f.followed_id = $1 AND u.is_active
             ORDER BY f.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn followers_count(&self, user: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM follows f JOIN users u ON u.id = f.follower_id
             WHERE f.followed_id = $1 AND u.is_active",
        )
        .bind(user)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
