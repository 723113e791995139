use uuid::Uuid;

use ladle_types::models::{FavoriteSummary, FollowSummary, RecipeSummary, ReviewSummary};

use crate::ports::ActivityStore;
use crate::{Database, StoreError};

// Read-only views into recipe-domain tables; the recipe service owns the
// write side.

impl ActivityStore for Database {
    async fn recent_recipes(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<RecipeSummary>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeSummary>(
            "SELECT id, title, created_at FROM recipes
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn recent_follows(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<FollowSummary>, StoreError> {
        let rows = sqlx::query_as::<_, FollowSummary>(
            "SELECT u.id AS user_id, u.username, f.created_at
             FROM follows f JOIN users u ON u.id = f.followed_id
             WHERE f.follower_id = $1 AND u.is_active
             ORDER BY f.created_at DESC
             LIMIT $2",
        )
        .bind(user)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn recent_reviews(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewSummary>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewSummary>(
            "SELECT id, recipe_id, rating, created_at FROM recipe_reviews
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn recent_favorites(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<FavoriteSummary>, StoreError> {
        let rows = sqlx::query_as::<_, FavoriteSummary>(
            "SELECT fav.recipe_id, r.title, fav.created_at
             FROM recipe_favorites fav JOIN recipes r ON r.id = fav.recipe_id
             WHERE fav.user_id = $1
             ORDER BY fav.created_at DESC
             LIMIT $2",
        )
        .bind(user)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
