//! Repository ports.
//!
//! The services in `ladle-api` are generic over these traits; [`Database`]
//! (and the Redis-backed token cache in `ladle-cache`) provide the production
//! implementations, while tests substitute in-memory fakes.

#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ladle_types::api::{UpdateProfileRequest, UserSearchResult};
use ladle_types::models::{
    FavoriteSummary, FollowSummary, Notification, PrivacyPreferences, RecipeSummary,
    ReviewSummary, User,
};
use ladle_types::preferences::PreferenceCategory;

use crate::StoreError;

pub trait UserStore {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Single-row atomic patch; absent fields keep their current value.
    /// Returns `None` when the user does not exist and `StoreError::Duplicate`
    /// when the new username is taken.
    async fn update_profile(
        &self,
        id: Uuid,
        patch: &UpdateProfileRequest,
    ) -> Result<Option<User>, StoreError>;

    /// Reduced public row (active, `public` visibility only).
    async fn public_profile(&self, id: Uuid) -> Result<Option<UserSearchResult>, StoreError>;

    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError>;

    async fn search_count(&self, query: &str) -> Result<i64, StoreError>;

    /// Returns whether a row was actually deactivated.
    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub trait PrivacyStore {
    async fn privacy_for(&self, user_id: Uuid) -> Result<Option<PrivacyPreferences>, StoreError>;
}

pub trait FollowStore {
    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, StoreError>;

    /// Idempotent: inserting an existing edge is a success.
    async fn create_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError>;

    /// Idempotent: deleting a missing edge is a success.
    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError>;

    async fn following_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError>;

    async fn following_count(&self, user: Uuid) -> Result<i64, StoreError>;

    async fn followers_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError>;

    async fn followers_count(&self, user: Uuid) -> Result<i64, StoreError>;
}

pub trait NotificationStore {
    async fn list(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn count(&self, user: Uuid) -> Result<i64, StoreError>;

    /// Returns whether the notification existed (marking an already-read row
    /// again still counts as found).
    async fn mark_read(&self, user: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Returns the IDs that transitioned from unread to read.
    async fn mark_all_read(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// One atomic statement over the requested IDs; returns the subset that
    /// was actually soft-deleted.
    async fn delete_batch(&self, user: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, StoreError>;
}

pub trait PreferenceStore {
    /// The stored document for one category, if a row exists.
    async fn category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
    ) -> Result<Option<(serde_json::Value, DateTime<Utc>)>, StoreError>;

    /// Upsert the full category document; returns the new `updated_at`.
    async fn put_category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
        document: &serde_json::Value,
    ) -> Result<DateTime<Utc>, StoreError>;
}

pub trait ActivityStore {
    async fn recent_recipes(&self, user: Uuid, limit: i64)
        -> Result<Vec<RecipeSummary>, StoreError>;

    async fn recent_follows(&self, user: Uuid, limit: i64)
        -> Result<Vec<FollowSummary>, StoreError>;

    async fn recent_reviews(&self, user: Uuid, limit: i64)
        -> Result<Vec<ReviewSummary>, StoreError>;

    async fn recent_favorites(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<FavoriteSummary>, StoreError>;
}
