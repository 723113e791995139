use chrono::{DateTime, Utc};
use uuid::Uuid;

use ladle_types::preferences::PreferenceCategory;

use crate::ports::PreferenceStore;
use crate::{Database, StoreError};

impl PreferenceStore for Database {
    async fn category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
    ) -> Result<Option<(serde_json::Value, DateTime<Utc>)>, StoreError> {
        let row = sqlx::query_as::<_, (serde_json::Value, DateTime<Utc>)>(
            "SELECT data, updated_at FROM user_preferences
             WHERE user_id = $1 AND category = $2",
        )
        .bind(user)
        .bind(category.as_str())
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn put_category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
        document: &serde_json::Value,
    ) -> Result<DateTime<Utc>, StoreError> {
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO user_preferences (user_id, category, data, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (user_id, category)
             DO UPDATE SET data = EXCLUDED.data, updated_at = now()
             RETURNING updated_at",
        )
        .bind(user)
        .bind(category.as_str())
        .bind(document)
        .fetch_one(self.pool())
        .await?;
        Ok(updated_at)
    }
}
