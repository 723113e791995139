//! The visibility engine.
//!
//! One rule, applied to every read of a profile, activity feed, or
//! follower/following list. The decision itself is a pure function; the
//! async wrapper loads the target's privacy row and, only when required,
//! the follow edge.

use uuid::Uuid;

use ladle_db::ports::{FollowStore, PrivacyStore};
use ladle_types::models::{PrivacyPreferences, User, Visibility};

use crate::error::ApiError;

/// The core policy rule.
///
/// Self always passes. Otherwise `public` passes, `followers_only` requires
/// an authenticated requester with an existing edge, and `private` denies.
/// A visibility value we do not recognize denies as well.
pub fn decide(
    requester: Option<Uuid>,
    target: Uuid,
    visibility: Option<Visibility>,
    is_follower: bool,
) -> bool {
    if requester == Some(target) {
        return true;
    }
    match visibility {
        Some(Visibility::Public) => true,
        Some(Visibility::FollowersOnly) => requester.is_some() && is_follower,
        Some(Visibility::Private) | None => false,
    }
}

/// Apply the rule to `target`, loading privacy and (when needed) the follow
/// edge. Returns the target's privacy row so callers can redact fields
/// without a second fetch; `None` only when the requester is the target and
/// no privacy row exists yet.
///
/// Deactivated targets read as `NotFound` for everyone but themselves.
pub async fn check_profile_access<S>(
    store: &S,
    requester: Option<Uuid>,
    target: &User,
) -> Result<Option<PrivacyPreferences>, ApiError>
where
    S: PrivacyStore + FollowStore,
{
    let is_self = requester == Some(target.id);
    if !target.is_active && !is_self {
        return Err(ApiError::NotFound("user"));
    }
    if is_self {
        return Ok(store.privacy_for(target.id).await?);
    }

    // Fail closed: a missing privacy row denies like `private` does.
    let privacy = store
        .privacy_for(target.id)
        .await?
        .ok_or(ApiError::ProfilePrivate)?;

    let visibility = privacy.visibility();
    let is_follower = match (visibility, requester) {
        (Some(Visibility::FollowersOnly), Some(r)) => store.is_following(r, target.id).await?,
        _ => false,
    };

    if decide(requester, target.id, visibility, is_follower) {
        Ok(Some(privacy))
    } else {
        Err(ApiError::ProfilePrivate)
    }
}
