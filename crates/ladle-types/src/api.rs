//! Request and response bodies for the HTTP surface.
//!
//! Everything here is plain serde data. Field-level redaction (dropping
//! `email`/`full_name` from a profile) is expressed as `Option` +
//! `skip_serializing_if`, so a redacted field is absent from the wire, not
//! null.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{FavoriteSummary, FollowSummary, RecipeSummary, ReviewSummary};
use crate::preferences::PreferenceCategory;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

// -- Error envelope --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

// -- Profiles --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduced schema for the public listing and search results: never carries
/// `email` or `bio`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSearchResult {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSearchResponse {
    pub total_count: i64,
    pub results: Vec<UserSearchResult>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 50, message = "must be 1-50 characters"),
        regex(path = *USERNAME_RE, message = "only letters, digits and underscore")
    )]
    pub username: Option<String>,
    #[validate(email(message = "not a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    /// True when no field is present; such a patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.full_name.is_none()
            && self.bio.is_none()
    }
}

// -- Account deletion --

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletionRequestedResponse {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmDeletionRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletionConfirmedResponse {
    pub user_id: Uuid,
    pub deactivated_at: DateTime<Utc>,
}

// -- Social --

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowActionResponse {
    pub message: String,
    pub is_following: bool,
}

/// Follower/following list. With `count_only` the optional fields are
/// omitted entirely; otherwise `users` is always present, possibly empty.
#[derive(Debug, Serialize, Deserialize)]
pub struct FollowListResponse {
    pub total_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserSearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub user_id: Uuid,
    pub recent_recipes: Vec<RecipeSummary>,
    pub recent_follows: Vec<FollowSummary>,
    pub recent_reviews: Vec<ReviewSummary>,
    pub recent_favorites: Vec<FavoriteSummary>,
}

// -- Preferences --

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryPreferencesResponse {
    pub user_id: Uuid,
    pub category: PreferenceCategory,
    pub preferences: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub preferences: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllPreferencesResponse {
    pub user_id: Uuid,
    pub preferences: BTreeMap<String, CategoryEntry>,
}

// -- Notifications inbox --

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub total_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<crate::models::Notification>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchDeleteRequest {
    pub notification_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub deleted: Vec<Uuid>,
    pub requested: Vec<String>,
    pub partial: bool,
    pub all_not_found: bool,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub database: String,
    pub redis: String,
}

// -- Metrics --

#[derive(Debug, Serialize, Deserialize)]
pub struct DbPoolStats {
    pub active_connections: u32,
    pub max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PerformanceMetricsResponse {
    pub total_requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub average_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub database: DbPoolStats,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheMetricsResponse {
    pub total_keys: i64,
    pub used_memory_bytes: u64,
    pub used_memory_human: String,
    pub connected_clients: u64,
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiskStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessStats {
    pub rss_bytes: u64,
    pub vms_bytes: u64,
    pub cpu_percent: f32,
    pub threads: usize,
    pub open_files: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemMetricsResponse {
    pub cpu_percent: f32,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub process: ProcessStats,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub database: ComponentHealth,
    pub cache: ComponentHealth,
}

// -- Cache administration --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearCacheRequest {
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub cleared_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_patch_is_detected() {
        let patch = UpdateProfileRequest::default();
        assert!(patch.is_empty());
        let patch = UpdateProfileRequest {
            bio: Some("cook".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn profile_patch_validation() {
        let ok = UpdateProfileRequest {
            username: Some("chef_anna".into()),
            email: Some("anna@example.com".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateProfileRequest {
            username: Some("chef anna!".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = UpdateProfileRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn redacted_profile_fields_are_absent_not_null() {
        let profile = UserProfileResponse {
            id: Uuid::new_v4(),
            username: "chef_anna".into(),
            email: None,
            full_name: Some("Anna".into()),
            bio: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let v = serde_json::to_value(&profile).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("email"));
        assert!(obj.contains_key("full_name"));
        // bio stays in the schema even when null
        assert!(obj.contains_key("bio"));
    }

    #[test]
    fn count_only_follow_list_omits_optional_fields() {
        let body = FollowListResponse {
            total_count: 3,
            users: None,
            limit: None,
            offset: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v.as_object().unwrap().len(), 1);
    }
}
