//! Liveness and readiness.
//!
//! Liveness is unconditional; readiness composes 1-second database and cache
//! probes and logs each probe's up/down transitions exactly once.

use std::sync::Mutex;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use tokio::time::timeout;
use tracing::{info, warn};

use ladle_types::api::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

pub fn overall_status(database_up: bool, redis_up: bool) -> &'static str {
    if database_up && redis_up {
        "READY"
    } else {
        "DEGRADED"
    }
}

fn probe_status(up: bool) -> &'static str {
    if up { "up" } else { "down" }
}

/// Debounces probe-transition logging: a flapping dependency logs once per
/// change of state, not once per probe.
#[derive(Default)]
pub struct ReadinessTracker {
    last: Mutex<Option<(bool, bool)>>,
}

impl ReadinessTracker {
    pub fn observe(&self, database_up: bool, redis_up: bool) {
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if let Some((prev_db, prev_redis)) = *last {
            if prev_db != database_up {
                log_transition("database", database_up);
            }
            if prev_redis != redis_up {
                log_transition("redis", redis_up);
            }
        }
        *last = Some((database_up, redis_up));
    }
}

fn log_transition(component: &str, up: bool) {
    if up {
        info!("{component} probe transitioned to up");
    } else {
        warn!("{component} probe transitioned to down");
    }
}

// -- Handlers --

pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
    })
}

pub async fn get_ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let (database, redis) = tokio::join!(
        timeout(PROBE_TIMEOUT, state.db.ping()),
        timeout(PROBE_TIMEOUT, state.cache.ping()),
    );
    let database_up = matches!(database, Ok(Ok(())));
    let redis_up = matches!(redis, Ok(Ok(())));

    state.readiness.observe(database_up, redis_up);

    Json(ReadinessResponse {
        status: overall_status(database_up, redis_up).to_string(),
        database: probe_status(database_up).to_string(),
        redis: probe_status(redis_up).to_string(),
    })
}
