//! Profile reads and updates, user search, and the two-step account
//! deletion flow.

use std::time::Duration;

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use ladle_cache::TokenCache;
use ladle_db::ports::{FollowStore, PrivacyStore, UserStore};
use ladle_types::api::{
    ConfirmDeletionRequest, DeletionConfirmedResponse, DeletionRequestedResponse,
    UpdateProfileRequest, UserProfileResponse, UserSearchResponse, UserSearchResult,
};
use ladle_types::models::User;

use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;
use crate::visibility;

/// Deletion tokens live for 24 hours.
pub const DELETE_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_PAGE_SIZE: u32 = 100;

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub count_only: bool,
}

// -- Service --

fn render_profile(user: &User, show_email: bool, show_full_name: bool) -> UserProfileResponse {
    UserProfileResponse {
        id: user.id,
        username: user.username.clone(),
        email: show_email.then(|| user.email.clone()),
        full_name: if show_full_name { user.full_name.clone() } else { None },
        bio: user.bio.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub async fn fetch_profile<S>(
    store: &S,
    requester: Option<Uuid>,
    target_id: Uuid,
) -> Result<UserProfileResponse, ApiError>
where
    S: UserStore + PrivacyStore + FollowStore,
{
    let user = store
        .user_by_id(target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    let privacy = visibility::check_profile_access(store, requester, &user).await?;

    let is_self = requester == Some(user.id);
    let (show_email, show_full_name) = if is_self {
        (true, true)
    } else {
        privacy
            .as_ref()
            .map(|p| (p.show_email, p.show_full_name))
            .unwrap_or((false, false))
    };
    Ok(render_profile(&user, show_email, show_full_name))
}

/// Public listing variant: only `public` profiles resolve, everything else
/// is a plain not-found.
pub async fn fetch_public_profile<S: UserStore>(
    store: &S,
    id: Uuid,
) -> Result<UserSearchResult, ApiError> {
    store
        .public_profile(id)
        .await?
        .ok_or(ApiError::NotFound("user"))
}

pub async fn apply_profile_update<S: UserStore>(
    store: &S,
    user_id: Uuid,
    patch: UpdateProfileRequest,
) -> Result<UserProfileResponse, ApiError> {
    patch.validate()?;

    // An all-absent patch is a no-op; return the current row without a write.
    if patch.is_empty() {
        let user = store
            .user_by_id(user_id)
            .await?
            .ok_or(ApiError::NotFound("user"))?;
        return Ok(render_profile(&user, true, true));
    }

    let user = store
        .update_profile(user_id, &patch)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(render_profile(&user, true, true))
}

pub async fn search_users<S: UserStore>(
    store: &S,
    query: &str,
    limit: u32,
    offset: u32,
    count_only: bool,
) -> Result<UserSearchResponse, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let limit = limit.clamp(1, MAX_PAGE_SIZE);

    let total_count = store.search_count(query).await?;
    let results = if count_only {
        Vec::new()
    } else {
        store.search(query, limit as i64, offset as i64).await?
    };
    Ok(UserSearchResponse {
        total_count,
        results,
        limit,
        offset,
    })
}

/// Issue a fresh deletion token, replacing any live one.
pub async fn request_deletion<S, T>(
    store: &S,
    tokens: &T,
    user_id: Uuid,
) -> Result<DeletionRequestedResponse, ApiError>
where
    S: UserStore,
    T: TokenCache,
{
    store
        .user_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + chrono::Duration::hours(24);
    tokens.put_delete_token(user_id, &token, DELETE_TOKEN_TTL).await?;

    info!("deletion requested for user {user_id}");
    Ok(DeletionRequestedResponse {
        user_id,
        token,
        expires_at,
    })
}

/// Consume a deletion token and deactivate the account. Token cleanup after
/// the deactivation is best-effort.
pub async fn confirm_deletion<S, T>(
    store: &S,
    tokens: &T,
    user_id: Uuid,
    supplied: &str,
) -> Result<DeletionConfirmedResponse, ApiError>
where
    S: UserStore,
    T: TokenCache,
{
    store
        .user_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let stored = tokens
        .get_delete_token(user_id)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    if !constant_time_eq(supplied, &stored) {
        return Err(ApiError::InvalidToken);
    }

    store.deactivate(user_id).await?;
    if let Err(e) = tokens.remove_delete_token(user_id).await {
        warn!("failed to drop consumed deletion token for {user_id}: {e}");
    }

    info!("user {user_id} deactivated");
    Ok(DeletionConfirmedResponse {
        user_id,
        deactivated_at: Utc::now(),
    })
}

/// Length-guarded constant-time comparison for deletion tokens.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

// -- Handlers --

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<UserSearchResponse>, ApiError> {
    let response = search_users(
        &state.db,
        &params.query,
        params.limit,
        params.offset,
        params.count_only,
    )
    .await?;
    Ok(Json(response))
}

pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserSearchResult>, ApiError> {
    Ok(Json(fetch_public_profile(&state.db, id).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    Ok(Json(fetch_profile(&state.db, principal.user_id, id).await?))
}

pub async fn patch_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(patch): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    if !principal.is_self(id) {
        return Err(ApiError::AccessDenied);
    }
    Ok(Json(apply_profile_update(&state.db, id, patch).await?))
}

pub async fn post_deletion_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<DeletionRequestedResponse>, ApiError> {
    if !principal.is_self(id) {
        return Err(ApiError::AccessDenied);
    }
    Ok(Json(request_deletion(&state.db, &state.cache, id).await?))
}

pub async fn post_deletion_confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<ConfirmDeletionRequest>,
) -> Result<Json<DeletionConfirmedResponse>, ApiError> {
    if !principal.is_self(id) {
        return Err(ApiError::AccessDenied);
    }
    Ok(Json(
        confirm_deletion(&state.db, &state.cache, id, &body.token).await?,
    ))
}
