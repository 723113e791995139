//! Per-category preference reads and updates.
//!
//! All nine categories flow through the same four operations; the only
//! category-specific code is the typed patch dispatch in `ladle-types`.
//! Rows are created lazily on first read with the documented defaults.

use std::collections::BTreeMap;

use anyhow::anyhow;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use ladle_db::ports::{PreferenceStore, UserStore};
use ladle_types::api::{AllPreferencesResponse, CategoryEntry, CategoryPreferencesResponse};
use ladle_types::preferences::{
    self, PreferenceCategory, PreferenceUpdate, PreferencesPatch,
};

use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    /// Comma-separated category filter, e.g. `?categories=display,sound`.
    pub categories: Option<String>,
}

// -- Service --

fn authorize(principal: &Principal, target: Uuid) -> Result<(), ApiError> {
    if principal.can_manage(target) {
        Ok(())
    } else {
        Err(ApiError::AccessDenied)
    }
}

async fn ensure_target_exists<S: UserStore>(store: &S, target: Uuid) -> Result<(), ApiError> {
    store
        .user_by_id(target)
        .await?
        .map(|_| ())
        .ok_or(ApiError::NotFound("user"))
}

/// Current document for a category, creating the row with defaults on the
/// first read.
async fn read_category<S: PreferenceStore>(
    store: &S,
    user: Uuid,
    category: PreferenceCategory,
) -> Result<(serde_json::Value, DateTime<Utc>), ApiError> {
    if let Some(row) = store.category_document(user, category).await? {
        return Ok(row);
    }
    let document = preferences::default_document(category);
    let updated_at = store.put_category_document(user, category, &document).await?;
    Ok((document, updated_at))
}

async fn apply_one<S: PreferenceStore>(
    store: &S,
    user: Uuid,
    update: &PreferenceUpdate,
) -> Result<CategoryPreferencesResponse, ApiError> {
    let category = update.category();
    let current = match store.category_document(user, category).await? {
        Some((document, _)) => document,
        None => preferences::default_document(category),
    };
    let next = preferences::apply_update(current, update).map_err(|e| {
        ApiError::Internal(anyhow!("stored {category} preferences are corrupt: {e}"))
    })?;
    let updated_at = store.put_category_document(user, category, &next).await?;
    Ok(CategoryPreferencesResponse {
        user_id: user,
        category,
        preferences: next,
        updated_at,
    })
}

pub async fn get_all<S>(
    store: &S,
    target: Uuid,
    categories: Option<Vec<PreferenceCategory>>,
) -> Result<AllPreferencesResponse, ApiError>
where
    S: UserStore + PreferenceStore,
{
    ensure_target_exists(store, target).await?;
    let categories = categories.unwrap_or_else(|| PreferenceCategory::ALL.to_vec());

    let mut map = BTreeMap::new();
    for category in categories {
        let (document, updated_at) = read_category(store, target, category).await?;
        map.insert(
            category.as_str().to_string(),
            CategoryEntry {
                preferences: document,
                updated_at,
            },
        );
    }
    Ok(AllPreferencesResponse {
        user_id: target,
        preferences: map,
    })
}

pub async fn get_one<S>(
    store: &S,
    target: Uuid,
    category: PreferenceCategory,
) -> Result<CategoryPreferencesResponse, ApiError>
where
    S: UserStore + PreferenceStore,
{
    ensure_target_exists(store, target).await?;
    let (document, updated_at) = read_category(store, target, category).await?;
    Ok(CategoryPreferencesResponse {
        user_id: target,
        category,
        preferences: document,
        updated_at,
    })
}

/// Apply every category patch in the payload, in declaration order. Each
/// category writes independently; the first failure aborts the remainder and
/// already-written categories stay written (callers retry).
pub async fn update_all<S>(
    store: &S,
    target: Uuid,
    patch: PreferencesPatch,
) -> Result<AllPreferencesResponse, ApiError>
where
    S: UserStore + PreferenceStore,
{
    ensure_target_exists(store, target).await?;

    let mut map = BTreeMap::new();
    for update in patch.into_updates() {
        let applied = apply_one(store, target, &update).await?;
        map.insert(
            applied.category.as_str().to_string(),
            CategoryEntry {
                preferences: applied.preferences,
                updated_at: applied.updated_at,
            },
        );
    }
    Ok(AllPreferencesResponse {
        user_id: target,
        preferences: map,
    })
}

pub async fn update_one<S>(
    store: &S,
    target: Uuid,
    update: &PreferenceUpdate,
) -> Result<CategoryPreferencesResponse, ApiError>
where
    S: UserStore + PreferenceStore,
{
    ensure_target_exists(store, target).await?;
    apply_one(store, target, update).await
}

fn parse_category(raw: &str) -> Result<PreferenceCategory, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidCategory(raw.to_string()))
}

fn parse_category_filter(raw: &str) -> Result<Vec<PreferenceCategory>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_category)
        .collect()
}

// -- Handlers --

pub async fn get_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CategoriesQuery>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AllPreferencesResponse>, ApiError> {
    authorize(&principal, id)?;
    let categories = params
        .categories
        .as_deref()
        .map(parse_category_filter)
        .transpose()?;
    Ok(Json(get_all(&state.db, id, categories).await?))
}

pub async fn get_preference_category(
    State(state): State<AppState>,
    Path((id, category)): Path<(Uuid, String)>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<CategoryPreferencesResponse>, ApiError> {
    authorize(&principal, id)?;
    let category = parse_category(&category)?;
    Ok(Json(get_one(&state.db, id, category).await?))
}

pub async fn patch_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AllPreferencesResponse>, ApiError> {
    authorize(&principal, id)?;
    let patch: PreferencesPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid preferences payload: {e}")))?;
    Ok(Json(update_all(&state.db, id, patch).await?))
}

pub async fn patch_preference_category(
    State(state): State<AppState>,
    Path((id, category)): Path<(Uuid, String)>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CategoryPreferencesResponse>, ApiError> {
    authorize(&principal, id)?;
    let category = parse_category(&category)?;
    let update = PreferenceUpdate::from_value(category, body)
        .map_err(|e| ApiError::BadRequest(format!("invalid {category} preferences: {e}")))?;
    Ok(Json(update_one(&state.db, id, &update).await?))
}
