use std::sync::Arc;
use std::time::Instant;

use ladle_cache::Cache;
use ladle_db::Database;

use crate::health::ReadinessTracker;
use crate::notifier::Notifier;
use crate::telemetry::Telemetry;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub cache: Cache,
    pub notifier: Notifier,
    pub telemetry: Telemetry,
    pub readiness: ReadinessTracker,
    pub started_at: Instant,
}
