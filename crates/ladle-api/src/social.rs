//! Follow/unfollow, follower and following lists, and activity aggregation.

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use ladle_db::ports::{ActivityStore, FollowStore, PrivacyStore, UserStore};
use ladle_types::api::{ActivityResponse, FollowActionResponse, FollowListResponse};

use crate::error::ApiError;
use crate::notifier::NewFollowerEvent;
use crate::principal::Principal;
use crate::state::AppState;
use crate::visibility;

const MAX_PAGE_SIZE: u32 = 100;
const MAX_ACTIVITY_LIMIT: u32 = 50;

fn default_limit() -> u32 {
    20
}

fn default_activity_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub count_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    #[serde(default = "default_activity_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum Relation {
    Following,
    Followers,
}

// -- Service --

pub async fn list_relations<S>(
    store: &S,
    requester: Option<Uuid>,
    target_id: Uuid,
    relation: Relation,
    limit: u32,
    offset: u32,
    count_only: bool,
) -> Result<FollowListResponse, ApiError>
where
    S: UserStore + PrivacyStore + FollowStore,
{
    let target = store
        .user_by_id(target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    visibility::check_profile_access(store, requester, &target).await?;

    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let total_count = match relation {
        Relation::Following => store.following_count(target_id).await?,
        Relation::Followers => store.followers_count(target_id).await?,
    };
    if count_only {
        return Ok(FollowListResponse {
            total_count,
            users: None,
            limit: None,
            offset: None,
        });
    }

    let users = match relation {
        Relation::Following => {
            store
                .following_of(target_id, limit as i64, offset as i64)
                .await?
        }
        Relation::Followers => {
            store
                .followers_of(target_id, limit as i64, offset as i64)
                .await?
        }
    };
    Ok(FollowListResponse {
        total_count,
        users: Some(users),
        limit: Some(limit),
        offset: Some(offset),
    })
}

#[derive(Debug)]
pub struct FollowOutcome {
    pub response: FollowActionResponse,
    pub event: Option<NewFollowerEvent>,
}

pub async fn follow_user<S>(
    store: &S,
    follower: Uuid,
    target_id: Uuid,
) -> Result<FollowOutcome, ApiError>
where
    S: UserStore + PrivacyStore + FollowStore,
{
    if follower == target_id {
        return Err(ApiError::CannotFollowSelf);
    }
    let target = store
        .user_by_id(target_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::NotFound("user"))?;

    let allows_follows = store
        .privacy_for(target_id)
        .await?
        .map(|p| p.allow_follows)
        .unwrap_or(true);
    if !allows_follows {
        return Err(ApiError::FollowNotAllowed);
    }

    // Idempotent: a duplicate edge is a success.
    store.create_follow(follower, target_id).await?;

    let event = store
        .user_by_id(follower)
        .await?
        .map(|u| NewFollowerEvent {
            user_id: target_id,
            follower_id: follower,
            follower_username: u.username,
        });

    Ok(FollowOutcome {
        response: FollowActionResponse {
            message: format!("now following {}", target.username),
            is_following: true,
        },
        event,
    })
}

pub async fn unfollow_user<S>(
    store: &S,
    follower: Uuid,
    target_id: Uuid,
) -> Result<FollowActionResponse, ApiError>
where
    S: UserStore + FollowStore,
{
    if follower == target_id {
        return Err(ApiError::BadRequest(
            "users cannot unfollow themselves".to_string(),
        ));
    }
    let target = store
        .user_by_id(target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    // Idempotent: deleting a missing edge is a success.
    store.delete_follow(follower, target_id).await?;

    Ok(FollowActionResponse {
        message: format!("unfollowed {}", target.username),
        is_following: false,
    })
}

pub async fn user_activity<S>(
    store: &S,
    requester: Option<Uuid>,
    target_id: Uuid,
    per_type_limit: u32,
) -> Result<ActivityResponse, ApiError>
where
    S: UserStore + PrivacyStore + FollowStore + ActivityStore,
{
    let target = store
        .user_by_id(target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    visibility::check_profile_access(store, requester, &target).await?;

    let limit = per_type_limit.clamp(1, MAX_ACTIVITY_LIMIT) as i64;
    let (recipes, follows, reviews, favorites) = tokio::join!(
        store.recent_recipes(target_id, limit),
        store.recent_follows(target_id, limit),
        store.recent_reviews(target_id, limit),
        store.recent_favorites(target_id, limit),
    );

    Ok(ActivityResponse {
        user_id: target_id,
        recent_recipes: recipes?,
        recent_follows: follows?,
        recent_reviews: reviews?,
        recent_favorites: favorites?,
    })
}

// -- Handlers --

pub async fn get_following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListQuery>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<FollowListResponse>, ApiError> {
    let response = list_relations(
        &state.db,
        principal.user_id,
        id,
        Relation::Following,
        params.limit,
        params.offset,
        params.count_only,
    )
    .await?;
    Ok(Json(response))
}

pub async fn get_followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListQuery>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<FollowListResponse>, ApiError> {
    let response = list_relations(
        &state.db,
        principal.user_id,
        id,
        Relation::Followers,
        params.limit,
        params.offset,
        params.count_only,
    )
    .await?;
    Ok(Json(response))
}

pub async fn post_follow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<FollowActionResponse>, ApiError> {
    let follower = principal.require_user()?;
    let outcome = follow_user(&state.db, follower, id).await?;
    if let Some(event) = outcome.event {
        state.notifier.dispatch_new_follower(event);
    }
    Ok(Json(outcome.response))
}

pub async fn delete_follow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<FollowActionResponse>, ApiError> {
    let follower = principal.require_user()?;
    Ok(Json(unfollow_user(&state.db, follower, id).await?))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ActivityQuery>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ActivityResponse>, ApiError> {
    Ok(Json(
        user_activity(&state.db, principal.user_id, id, params.limit).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{privacy_row, user_row, MemStore};

    fn seeded_pair(store: &MemStore) -> (Uuid, Uuid) {
        let a = user_row("alice", true);
        let b = user_row("bob", true);
        store.insert_privacy(privacy_row(a.id, "public"));
        store.insert_privacy(privacy_row(b.id, "public"));
        let ids = (a.id, b.id);
        store.insert_user(a);
        store.insert_user(b);
        ids
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let store = MemStore::default();
        let (a, _) = seeded_pair(&store);
        let err = follow_user(&store, a, a).await.unwrap_err();
        assert!(matches!(err, ApiError::CannotFollowSelf));
    }

    #[tokio::test]
    async fn follow_is_idempotent() {
        let store = MemStore::default();
        let (a, b) = seeded_pair(&store);

        let first = follow_user(&store, a, b).await.unwrap();
        let second = follow_user(&store, a, b).await.unwrap();
        assert!(first.response.is_following);
        assert!(second.response.is_following);
        assert_eq!(store.follow_count(), 1);
    }

    #[tokio::test]
    async fn unfollow_is_idempotent() {
        let store = MemStore::default();
        let (a, b) = seeded_pair(&store);

        store.insert_follow(a, b);
        let first = unfollow_user(&store, a, b).await.unwrap();
        let second = unfollow_user(&store, a, b).await.unwrap();
        assert!(!first.is_following);
        assert!(!second.is_following);
        assert_eq!(store.follow_count(), 0);
    }

    #[tokio::test]
    async fn follow_respects_allow_follows() {
        let store = MemStore::default();
        let a = user_row("alice", true);
        let b = user_row("bob", true);
        let mut privacy = privacy_row(b.id, "public");
        privacy.allow_follows = false;
        store.insert_privacy(privacy);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_user(a);
        store.insert_user(b);

        let err = follow_user(&store, a_id, b_id).await.unwrap_err();
        assert!(matches!(err, ApiError::FollowNotAllowed));
    }

    #[tokio::test]
    async fn follow_of_inactive_target_is_not_found() {
        let store = MemStore::default();
        let a = user_row("alice", true);
        let ghost = user_row("ghost", false);
        let (a_id, ghost_id) = (a.id, ghost.id);
        store.insert_user(a);
        store.insert_user(ghost);

        let err = follow_user(&store, a_id, ghost_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn follow_carries_a_fanout_event() {
        let store = MemStore::default();
        let (a, b) = seeded_pair(&store);
        let outcome = follow_user(&store, a, b).await.unwrap();
        let event = outcome.event.expect("event for existing follower");
        assert_eq!(event.user_id, b);
        assert_eq!(event.follower_id, a);
        assert_eq!(event.follower_username, "alice");
    }

    #[tokio::test]
    async fn count_only_list_has_no_users_field() {
        let store = MemStore::default();
        let (a, b) = seeded_pair(&store);
        store.insert_follow(a, b);

        let counted = list_relations(&store, Some(a), b, Relation::Followers, 20, 0, true)
            .await
            .unwrap();
        assert_eq!(counted.total_count, 1);
        assert!(counted.users.is_none());

        let listed = list_relations(&store, Some(a), b, Relation::Followers, 20, 0, false)
            .await
            .unwrap();
        assert_eq!(listed.users.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_list_is_an_empty_vec_not_absent() {
        let store = MemStore::default();
        let (a, _) = seeded_pair(&store);
        let listed = list_relations(&store, None, a, Relation::Following, 20, 0, false)
            .await
            .unwrap();
        assert_eq!(listed.total_count, 0);
        assert!(listed.users.unwrap().is_empty());
    }

    #[tokio::test]
    async fn followers_only_list_requires_an_edge() {
        let store = MemStore::default();
        let guarded = user_row("guarded", true);
        let fan = user_row("fan", true);
        let stranger = user_row("stranger", true);
        store.insert_privacy(privacy_row(guarded.id, "followers_only"));
        store.insert_privacy(privacy_row(fan.id, "public"));
        store.insert_privacy(privacy_row(stranger.id, "public"));
        let (g, f, s) = (guarded.id, fan.id, stranger.id);
        store.insert_user(guarded);
        store.insert_user(fan);
        store.insert_user(stranger);
        store.insert_follow(f, g);

        assert!(
            list_relations(&store, Some(f), g, Relation::Followers, 20, 0, false)
                .await
                .is_ok()
        );
        let err = list_relations(&store, Some(s), g, Relation::Followers, 20, 0, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ProfilePrivate));
    }

    #[tokio::test]
    async fn activity_denies_anonymous_on_followers_only() {
        let store = MemStore::default();
        let guarded = user_row("guarded", true);
        store.insert_privacy(privacy_row(guarded.id, "followers_only"));
        let g = guarded.id;
        store.insert_user(guarded);

        let err = user_activity(&store, None, g, 10).await.unwrap_err();
        assert!(matches!(err, ApiError::ProfilePrivate));
    }

    #[tokio::test]
    async fn activity_returns_four_independent_lists() {
        let store = MemStore::default();
        let (a, b) = seeded_pair(&store);
        store.insert_follow(a, b);
        store.insert_recipe(a, "sourdough");
        store.insert_recipe(a, "ramen");

        let activity = user_activity(&store, Some(a), a, 10).await.unwrap();
        assert_eq!(activity.recent_recipes.len(), 2);
        assert_eq!(activity.recent_follows.len(), 1);
        // untouched lists come back empty, not missing
        assert!(activity.recent_reviews.is_empty());
        assert!(activity.recent_favorites.is_empty());
    }
}
