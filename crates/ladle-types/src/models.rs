use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user. `is_active = false` means the account has been
/// deactivated and is invisible to everyone but the user themselves.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Disclosure level of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    FollowersOnly,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::FollowersOnly => "followers_only",
            Visibility::Private => "private",
        }
    }

    /// Parse the stored text form. Returns `None` for anything unrecognized
    /// so that callers fail closed.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "followers_only" => Some(Visibility::FollowersOnly),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Authorization-relevant privacy settings, one row per user.
///
/// `profile_visibility` is kept as raw text: the visibility engine treats
/// unknown values as a denial rather than a decode error.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PrivacyPreferences {
    pub user_id: Uuid,
    pub profile_visibility: String,
    pub show_email: bool,
    pub show_full_name: bool,
    pub allow_follows: bool,
    pub allow_messages: bool,
    pub updated_at: DateTime<Utc>,
}

impl PrivacyPreferences {
    pub fn visibility(&self) -> Option<Visibility> {
        Visibility::parse(&self.profile_visibility)
    }
}

/// Directed follow edge: `follower_id` follows `followed_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// In-app notification. Soft-deleted rows (`is_deleted = true`) are excluded
/// from every list and count.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Activity summaries --
//
// Reduced rows from the recipe domain, read-only here. Each list in an
// activity response is independently fetched and independently empty.

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FavoriteSummary {
    pub recipe_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FollowSummary {
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
