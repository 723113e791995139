//! The in-app notifications inbox.
//!
//! Batch deletion has three outcomes: everything deleted (200), a strict
//! subset deleted (206), nothing deleted (404). The classification is pure;
//! the repository performs the delete as one atomic statement.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use ladle_db::ports::NotificationStore;
use ladle_types::api::{
    BatchDeleteRequest, BatchDeleteResponse, MarkAllReadResponse, MarkReadResponse,
    NotificationListResponse,
};

use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 100;

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub count_only: bool,
}

// -- Service --

/// Classify a batch outcome from the requested ids and the actually-deleted
/// subset.
pub fn classify(requested: Vec<String>, deleted: Vec<Uuid>) -> BatchDeleteResponse {
    let all_not_found = deleted.is_empty();
    let partial = !deleted.is_empty() && deleted.len() < requested.len();
    BatchDeleteResponse {
        deleted,
        requested,
        partial,
        all_not_found,
    }
}

pub fn batch_status(response: &BatchDeleteResponse) -> StatusCode {
    if response.all_not_found {
        StatusCode::NOT_FOUND
    } else if response.partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    }
}

pub async fn list_inbox<S: NotificationStore>(
    store: &S,
    user: Uuid,
    limit: u32,
    offset: u32,
    count_only: bool,
) -> Result<NotificationListResponse, ApiError> {
    let total_count = store.count(user).await?;
    if count_only {
        return Ok(NotificationListResponse {
            total_count,
            notifications: None,
            limit: None,
            offset: None,
        });
    }
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let notifications = store.list(user, limit as i64, offset as i64).await?;
    Ok(NotificationListResponse {
        total_count,
        notifications: Some(notifications),
        limit: Some(limit),
        offset: Some(offset),
    })
}

/// Mark one notification read. A syntactically invalid id is simply not
/// found; no error is raised for it.
pub async fn mark_one_read<S: NotificationStore>(
    store: &S,
    user: Uuid,
    raw_id: &str,
) -> Result<bool, ApiError> {
    let Ok(id) = raw_id.parse::<Uuid>() else {
        return Ok(false);
    };
    Ok(store.mark_read(user, id).await?)
}

pub async fn mark_all_read<S: NotificationStore>(
    store: &S,
    user: Uuid,
) -> Result<MarkAllReadResponse, ApiError> {
    let updated_ids = store.mark_all_read(user).await?;
    Ok(MarkAllReadResponse { updated_ids })
}

/// Soft-delete a batch. Syntactically invalid ids are filtered before the
/// repository call; if none survive, the outcome is all-not-found without
/// touching storage.
pub async fn delete_batch<S: NotificationStore>(
    store: &S,
    user: Uuid,
    requested: Vec<String>,
) -> Result<BatchDeleteResponse, ApiError> {
    let valid: Vec<Uuid> = requested.iter().filter_map(|s| s.parse().ok()).collect();
    if valid.is_empty() {
        return Ok(classify(requested, Vec::new()));
    }
    let deleted = store.delete_batch(user, &valid).await?;
    Ok(classify(requested, deleted))
}

// -- Handlers --

pub async fn get_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<InboxQuery>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    if !principal.can_manage(id) {
        return Err(ApiError::AccessDenied);
    }
    let response = list_inbox(&state.db, id, params.limit, params.offset, params.count_only).await?;
    Ok(Json(response))
}

pub async fn patch_notification_read(
    State(state): State<AppState>,
    Path((id, notification_id)): Path<(Uuid, String)>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    if !principal.can_manage(id) {
        return Err(ApiError::AccessDenied);
    }
    if mark_one_read(&state.db, id, &notification_id).await? {
        Ok(Json(MarkReadResponse {
            message: "notification marked as read".to_string(),
        }))
    } else {
        Err(ApiError::NotFound("notification"))
    }
}

pub async fn patch_notifications_read_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    if !principal.can_manage(id) {
        return Err(ApiError::AccessDenied);
    }
    Ok(Json(mark_all_read(&state.db, id).await?))
}

pub async fn delete_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<BatchDeleteRequest>,
) -> Result<Response, ApiError> {
    if !principal.can_manage(id) {
        return Err(ApiError::AccessDenied);
    }
    let response = delete_batch(&state.db, id, body.notification_ids).await?;
    let status = batch_status(&response);
    Ok((status, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{notification_row, user_row, MemStore};

    #[test]
    fn classification_covers_all_three_outcomes() {
        let ids = |n: usize| -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() };
        let texts = |v: &[Uuid]| -> Vec<String> { v.iter().map(|u| u.to_string()).collect() };

        let requested = ids(3);
        let full = classify(texts(&requested), requested.clone());
        assert!(!full.partial && !full.all_not_found);
        assert_eq!(batch_status(&full), StatusCode::OK);

        let partial = classify(texts(&requested), requested[..1].to_vec());
        assert!(partial.partial && !partial.all_not_found);
        assert_eq!(partial.deleted.len(), 1);
        assert_eq!(batch_status(&partial), StatusCode::PARTIAL_CONTENT);

        let empty = classify(texts(&requested), Vec::new());
        assert!(!empty.partial && empty.all_not_found);
        assert_eq!(batch_status(&empty), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_ids_are_filtered_before_the_repository() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        let requested = vec!["not-a-uuid".to_string(), "also-bad".to_string()];
        let response = delete_batch(&store, uid, requested.clone()).await.unwrap();
        assert!(response.all_not_found);
        assert!(!response.partial);
        assert_eq!(response.requested, requested);
        assert!(response.deleted.is_empty());
    }

    #[tokio::test]
    async fn partial_delete_reports_the_deleted_subset() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        let kept = notification_row(uid, "welcome", false);
        store.insert_notification(kept.clone());

        let requested = vec![
            kept.id.to_string(),
            Uuid::new_v4().to_string(),
            Uuid::new_v4().to_string(),
        ];
        let response = delete_batch(&store, uid, requested).await.unwrap();
        assert!(response.partial);
        assert!(!response.all_not_found);
        assert_eq!(response.deleted, vec![kept.id]);
        assert_eq!(batch_status(&response), StatusCode::PARTIAL_CONTENT);
    }

    #[tokio::test]
    async fn deleted_notifications_vanish_from_lists_and_counts() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        let n = notification_row(uid, "old news", false);
        store.insert_notification(n.clone());
        store.insert_notification(notification_row(uid, "fresh", false));

        delete_batch(&store, uid, vec![n.id.to_string()]).await.unwrap();

        let listed = list_inbox(&store, uid, 20, 0, false).await.unwrap();
        assert_eq!(listed.total_count, 1);
        let items = listed.notifications.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "fresh");

        // deleting again finds nothing
        let again = delete_batch(&store, uid, vec![n.id.to_string()]).await.unwrap();
        assert!(again.all_not_found);
    }

    #[tokio::test]
    async fn mark_one_read_treats_bad_ids_as_missing() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        assert!(!mark_one_read(&store, uid, "garbage").await.unwrap());
        assert!(!mark_one_read(&store, uid, &Uuid::new_v4().to_string()).await.unwrap());

        let n = notification_row(uid, "ping", false);
        store.insert_notification(n.clone());
        assert!(mark_one_read(&store, uid, &n.id.to_string()).await.unwrap());
        // idempotent: marking an already-read row is still found
        assert!(mark_one_read(&store, uid, &n.id.to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn mark_all_returns_only_transitioned_ids() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        let unread = notification_row(uid, "unread", false);
        store.insert_notification(unread.clone());
        store.insert_notification(notification_row(uid, "seen", true));

        let response = mark_all_read(&store, uid).await.unwrap();
        assert_eq!(response.updated_ids, vec![unread.id]);

        // second pass has nothing left to transition
        let response = mark_all_read(&store, uid).await.unwrap();
        assert!(response.updated_ids.is_empty());
    }

    #[tokio::test]
    async fn empty_inbox_lists_as_an_empty_sequence() {
        let store = MemStore::default();
        let user = user_row("reader", true);
        let uid = user.id;
        store.insert_user(user);

        let listed = list_inbox(&store, uid, 20, 0, false).await.unwrap();
        assert_eq!(listed.total_count, 0);
        assert!(listed.notifications.unwrap().is_empty());

        let counted = list_inbox(&store, uid, 20, 0, true).await.unwrap();
        assert!(counted.notifications.is_none());
    }
}
