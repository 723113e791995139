use uuid::Uuid;

use ladle_types::api::{UpdateProfileRequest, UserSearchResult};
use ladle_types::models::User;

use crate::ports::UserStore;
use crate::{Database, StoreError};

const USER_COLUMNS: &str = "id, username, email, full_name, bio, is_active, created_at, updated_at";

impl UserStore for Database {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: &UpdateProfileRequest,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                 username = COALESCE($2, username),
                 email = COALESCE($3, email),
                 full_name = COALESCE($4, full_name),
                 bio = COALESCE($5, bio),
                 updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.username.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.full_name.as_deref())
        .bind(patch.bio.as_deref())
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn public_profile(&self, id: Uuid) -> Result<Option<UserSearchResult>, StoreError> {
        let row = sqlx::query_as::<_, UserSearchResult>(
            "SELECT u.id, u.username,
                    CASE WHEN p.show_full_name THEN u.full_name END AS full_name,
                    u.created_at
             FROM users u
             JOIN privacy_preferences p ON p.user_id = u.id
             WHERE u.id = $1 AND u.is_active AND p.profile_visibility = 'public'",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        let pattern = like_pattern(query);
        let rows = sqlx::query_as::<_, UserSearchResult>(
            "SELECT u.id, u.username,
                    CASE WHEN p.show_full_name THEN u.full_name END AS full_name,
                    u.created_at
             FROM users u
             JOIN privacy_preferences p ON p.user_id = u.id
             WHERE u.is_active AND p.profile_visibility = 'public'
               AND (u.username ILIKE $1 OR u.full_name ILIKE $1)
             ORDER BY u.username
             LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn search_count(&self, query: &str) -> Result<i64, StoreError> {
        let pattern = like_pattern(query);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM users u
             JOIN privacy_preferences p ON p.user_id = u.id
             WHERE u.is_active AND p.profile_visibility = 'public'
               AND (u.username ILIKE $1 OR u.full_name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = false, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE metacharacters so a query like `50%` matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
