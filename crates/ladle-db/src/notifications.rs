use uuid::Uuid;

use ladle_types::models::Notification;

use crate::ports::NotificationStore;
use crate::{Database, StoreError};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, is_deleted, created_at, updated_at";

impl NotificationStore for Database {
    async fn list(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = $1 AND NOT is_deleted
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn count(&self, user: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_deleted",
        )
        .bind(user)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, user: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true, updated_at = now()
             WHERE id = $1 AND user_id = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(user)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "UPDATE notifications SET is_read = true, updated_at = now()
             WHERE user_id = $1 AND NOT is_read AND NOT is_deleted
             RETURNING id",
        )
        .bind(user)
        .fetch_all(self.pool())
        .await?;
        Ok(ids)
    }

    async fn delete_batch(&self, user: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, StoreError> {
        let deleted = sqlx::query_scalar::<_, Uuid>(
            "UPDATE notifications SET is_deleted = true, updated_at = now()
             WHERE user_id = $1 AND id = ANY($2) AND NOT is_deleted
             RETURNING id",
        )
        .bind(user)
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(deleted)
    }
}
