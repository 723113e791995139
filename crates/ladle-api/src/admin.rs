//! Cache administration.

use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use ladle_types::api::{ClearCacheRequest, ClearCacheResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Sweep cache keys matching the requested pattern (default `*`). Progress
/// made before a failure is kept; the sweep is resumable, not transactional.
pub async fn post_clear_cache(
    State(state): State<AppState>,
    body: Option<Json<ClearCacheRequest>>,
) -> Result<Json<ClearCacheResponse>, ApiError> {
    let pattern = body
        .and_then(|Json(b)| b.pattern)
        .unwrap_or_else(|| "*".to_string());

    let outcome = state.cache.clear_pattern(&pattern).await;
    match outcome.error {
        Some(e) => {
            warn!(
                "cache clear for pattern {pattern:?} aborted after {} keys: {e}",
                outcome.cleared
            );
            Err(ApiError::CacheUnavailable(e))
        }
        None => {
            info!("cleared {} cache keys for pattern {pattern:?}", outcome.cleared);
            Ok(Json(ClearCacheResponse {
                cleared_count: outcome.cleared,
            }))
        }
    }
}
