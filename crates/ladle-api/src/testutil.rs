//! In-memory implementations of the repository and cache ports, used by the
//! service-level tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ladle_cache::TokenCache;
use ladle_db::StoreError;
use ladle_db::ports::{
    ActivityStore, FollowStore, NotificationStore, PreferenceStore, PrivacyStore, UserStore,
};
use ladle_types::api::{UpdateProfileRequest, UserSearchResult};
use ladle_types::models::{
    FavoriteSummary, FollowSummary, Notification, PrivacyPreferences, RecipeSummary,
    ReviewSummary, User,
};
use ladle_types::preferences::PreferenceCategory;

pub fn user_row(username: &str, active: bool) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: Some(format!("{username} surname")),
        bio: Some("home cook".to_string()),
        is_active: active,
        created_at: now,
        updated_at: now,
    }
}

pub fn privacy_row(user_id: Uuid, visibility: &str) -> PrivacyPreferences {
    PrivacyPreferences {
        user_id,
        profile_visibility: visibility.to_string(),
        show_email: false,
        show_full_name: true,
        allow_follows: true,
        allow_messages: true,
        updated_at: Utc::now(),
    }
}

pub fn notification_row(user_id: Uuid, title: &str, read: bool) -> Notification {
    let now = Utc::now();
    Notification {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        message: format!("{title} body"),
        notification_type: "system".to_string(),
        is_read: read,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MemStore {
    users: Mutex<HashMap<Uuid, User>>,
    privacy: Mutex<HashMap<Uuid, PrivacyPreferences>>,
    follows: Mutex<HashSet<(Uuid, Uuid)>>,
    notifications: Mutex<Vec<Notification>>,
    prefs: Mutex<HashMap<(Uuid, PreferenceCategory), (serde_json::Value, DateTime<Utc>)>>,
    recipes: Mutex<HashMap<Uuid, Vec<RecipeSummary>>>,
    reviews: Mutex<HashMap<Uuid, Vec<ReviewSummary>>>,
    favorites: Mutex<HashMap<Uuid, Vec<FavoriteSummary>>>,
    /// Number of times `update_profile` reached the store.
    pub profile_updates: AtomicUsize,
    /// When set, preference reads/writes for this category fail, to exercise
    /// partial-failure paths.
    pub fail_category: Mutex<Option<PreferenceCategory>>,
}

impl MemStore {
    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn insert_privacy(&self, privacy: PrivacyPreferences) {
        self.privacy.lock().unwrap().insert(privacy.user_id, privacy);
    }

    pub fn insert_follow(&self, follower: Uuid, followed: Uuid) {
        self.follows.lock().unwrap().insert((follower, followed));
    }

    pub fn insert_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    pub fn insert_recipe(&self, user: Uuid, title: &str) {
        self.recipes.lock().unwrap().entry(user).or_default().push(RecipeSummary {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: Utc::now(),
        });
    }

    pub fn notification_by_id(&self, id: Uuid) -> Option<Notification> {
        self.notifications.lock().unwrap().iter().find(|n| n.id == id).cloned()
    }

    pub fn follow_count(&self) -> usize {
        self.follows.lock().unwrap().len()
    }

    fn reduced(&self, user: &User) -> UserSearchResult {
        let show_full_name = self
            .privacy
            .lock()
            .unwrap()
            .get(&user.id)
            .map(|p| p.show_full_name)
            .unwrap_or(false);
        UserSearchResult {
            id: user.id,
            username: user.username.clone(),
            full_name: if show_full_name { user.full_name.clone() } else { None },
            created_at: user.created_at,
        }
    }

    fn is_public(&self, user_id: Uuid) -> bool {
        self.privacy
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|p| p.profile_visibility == "public")
            .unwrap_or(false)
    }

    fn search_matches(&self, query: &str) -> Vec<UserSearchResult> {
        let users = self.users.lock().unwrap();
        let mut matches: Vec<&User> = users
            .values()
            .filter(|u| u.is_active && self.is_public(u.id))
            .filter(|u| u.username.contains(query))
            .collect();
        matches.sort_by(|a, b| a.username.cmp(&b.username));
        matches.into_iter().map(|u| self.reduced(u)).collect()
    }

    fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
        items
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

impl UserStore for MemStore {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: &UpdateProfileRequest,
    ) -> Result<Option<User>, StoreError> {
        self.profile_updates.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if let Some(new_username) = &patch.username {
            let taken = users
                .values()
                .any(|u| u.id != id && &u.username == new_username);
            if taken {
                return Err(StoreError::Duplicate);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &patch.username {
            user.username = v.clone();
        }
        if let Some(v) = &patch.email {
            user.email = v.clone();
        }
        if let Some(v) = &patch.full_name {
            user.full_name = Some(v.clone());
        }
        if let Some(v) = &patch.bio {
            user.bio = Some(v.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn public_profile(&self, id: Uuid) -> Result<Option<UserSearchResult>, StoreError> {
        let users = self.users.lock().unwrap();
        let Some(user) = users.get(&id) else {
            return Ok(None);
        };
        if !user.is_active || !self.is_public(id) {
            return Ok(None);
        }
        Ok(Some(self.reduced(user)))
    }

    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        Ok(Self::page(&self.search_matches(query), limit, offset))
    }

    async fn search_count(&self, query: &str) -> Result<i64, StoreError> {
        Ok(self.search_matches(query).len() as i64)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) if user.is_active => {
                user.is_active = false;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl PrivacyStore for MemStore {
    async fn privacy_for(&self, user_id: Uuid) -> Result<Option<PrivacyPreferences>, StoreError> {
        Ok(self.privacy.lock().unwrap().get(&user_id).cloned())
    }
}

impl FollowStore for MemStore {
    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, StoreError> {
        Ok(self.follows.lock().unwrap().contains(&(follower, followed)))
    }

    async fn create_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError> {
        self.follows.lock().unwrap().insert((follower, followed));
        Ok(())
    }

    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<(), StoreError> {
        self.follows.lock().unwrap().remove(&(follower, followed));
        Ok(())
    }

    async fn following_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        let edges: Vec<Uuid> = self
            .follows
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| *f == user)
            .map(|(_, t)| *t)
            .collect();
        let users = self.users.lock().unwrap();
        let mut rows: Vec<UserSearchResult> = edges
            .iter()
            .filter_map(|id| users.get(id))
            .filter(|u| u.is_active)
            .map(|u| self.reduced(u))
            .collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(Self::page(&rows, limit, offset))
    }

    async fn following_count(&self, user: Uuid) -> Result<i64, StoreError> {
        Ok(self.following_of(user, i64::MAX, 0).await?.len() as i64)
    }

    async fn followers_of(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>, StoreError> {
        let edges: Vec<Uuid> = self
            .follows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == user)
            .map(|(f, _)| *f)
            .collect();
        let users = self.users.lock().unwrap();
        let mut rows: Vec<UserSearchResult> = edges
            .iter()
            .filter_map(|id| users.get(id))
            .filter(|u| u.is_active)
            .map(|u| self.reduced(u))
            .collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(Self::page(&rows, limit, offset))
    }

    async fn followers_count(&self, user: Uuid) -> Result<i64, StoreError> {
        Ok(self.followers_of(user, i64::MAX, 0).await?.len() as i64)
    }
}

impl NotificationStore for MemStore {
    async fn list(
        &self,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut rows: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user && !n.is_deleted)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Self::page(&rows, limit, offset))
    }

    async fn count(&self, user: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user && !n.is_deleted)
            .count() as i64)
    }

    async fn mark_read(&self, user: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        match rows
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user && !n.is_deleted)
        {
            Some(n) => {
                n.is_read = true;
                n.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        let mut updated = Vec::new();
        for n in rows
            .iter_mut()
            .filter(|n| n.user_id == user && !n.is_read && !n.is_deleted)
        {
            n.is_read = true;
            n.updated_at = Utc::now();
            updated.push(n.id);
        }
        Ok(updated)
    }

    async fn delete_batch(&self, user: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, StoreError> {
        let mut rows = self.notifications.lock().unwrap();
        let mut deleted = Vec::new();
        for n in rows
            .iter_mut()
            .filter(|n| n.user_id == user && !n.is_deleted && ids.contains(&n.id))
        {
            n.is_deleted = true;
            n.updated_at = Utc::now();
            deleted.push(n.id);
        }
        Ok(deleted)
    }
}

impl PreferenceStore for MemStore {
    async fn category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
    ) -> Result<Option<(serde_json::Value, DateTime<Utc>)>, StoreError> {
        if *self.fail_category.lock().unwrap() == Some(category) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self.prefs.lock().unwrap().get(&(user, category)).cloned())
    }

    async fn put_category_document(
        &self,
        user: Uuid,
        category: PreferenceCategory,
        document: &serde_json::Value,
    ) -> Result<DateTime<Utc>, StoreError> {
        if *self.fail_category.lock().unwrap() == Some(category) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let now = Utc::now();
        self.prefs
            .lock()
            .unwrap()
            .insert((user, category), (document.clone(), now));
        Ok(now)
    }
}

impl ActivityStore for MemStore {
    async fn recent_recipes(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<RecipeSummary>, StoreError> {
        let rows = self.recipes.lock().unwrap();
        Ok(Self::page(rows.get(&user).map(Vec::as_slice).unwrap_or(&[]), limit, 0))
    }

    async fn recent_follows(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<FollowSummary>, StoreError> {
        let edges: Vec<Uuid> = self
            .follows
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| *f == user)
            .map(|(_, t)| *t)
            .collect();
        let users = self.users.lock().unwrap();
        let rows: Vec<FollowSummary> = edges
            .iter()
            .filter_map(|id| users.get(id))
            .filter(|u| u.is_active)
            .map(|u| FollowSummary {
                user_id: u.id,
                username: u.username.clone(),
                created_at: Utc::now(),
            })
            .collect();
        Ok(Self::page(&rows, limit, 0))
    }

    async fn recent_reviews(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewSummary>, StoreError> {
        let rows = self.reviews.lock().unwrap();
        Ok(Self::page(rows.get(&user).map(Vec::as_slice).unwrap_or(&[]), limit, 0))
    }

    async fn recent_favorites(
        &self,
        user: Uuid,
        limit: i64,
    ) -> Result<Vec<FavoriteSummary>, StoreError> {
        let rows = self.favorites.lock().unwrap();
        Ok(Self::page(rows.get(&user).map(Vec::as_slice).unwrap_or(&[]), limit, 0))
    }
}

/// In-memory stand-in for the Redis token store.
#[derive(Default)]
pub struct MemTokens {
    map: Mutex<HashMap<Uuid, String>>,
    pub fail_writes: bool,
}

impl MemTokens {
    /// A token store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn stored_token(&self, user: Uuid) -> Option<String> {
        self.map.lock().unwrap().get(&user).cloned()
    }
}

impl TokenCache for MemTokens {
    async fn put_delete_token(
        &self,
        user: Uuid,
        token: &str,
        _ttl: Duration,
    ) -> Result<(), redis::RedisError> {
        if self.fail_writes {
            return Err(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "token store unavailable",
            )));
        }
        self.map.lock().unwrap().insert(user, token.to_string());
        Ok(())
    }

    async fn get_delete_token(&self, user: Uuid) -> Result<Option<String>, redis::RedisError> {
        Ok(self.map.lock().unwrap().get(&user).cloned())
    }

    async fn remove_delete_token(&self, user: Uuid) -> Result<(), redis::RedisError> {
        self.map.lock().unwrap().remove(&user);
        Ok(())
    }
}
