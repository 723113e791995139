mod config;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ladle_api::health::ReadinessTracker;
use ladle_api::notifier::Notifier;
use ladle_api::state::{AppState, AppStateInner};
use ladle_api::telemetry::Telemetry;
use ladle_api::{
    admin, health, metrics, notifications, preferences, principal, social, telemetry, users,
};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ladle=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::load();
    info!(
        "starting ladle {} ({})",
        config.service_version, config.environment
    );

    // Stores
    let db = ladle_db::Database::connect(&config.db).await?;
    let cache = ladle_cache::Cache::connect(&config.cache).await?;
    let notifier = Notifier::new(config.notifier_url.clone())?;
    let telemetry = Telemetry::new()?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        cache,
        notifier,
        telemetry,
        readiness: ReadinessTracker::default(),
        started_at: Instant::now(),
    });

    let app = router(state);

    info!("ladle listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/users/search", get(users::search))
        .route("/users/{id}", get(users::get_public))
        .route(
            "/users/{id}/profile",
            get(users::get_profile).patch(users::patch_profile),
        )
        .route("/users/{id}/deletion", post(users::post_deletion_request))
        .route(
            "/users/{id}/deletion/confirm",
            post(users::post_deletion_confirm),
        )
        .route("/users/{id}/following", get(social::get_following))
        .route("/users/{id}/followers", get(social::get_followers))
        .route(
            "/users/{id}/follow",
            post(social::post_follow).delete(social::delete_follow),
        )
        .route("/users/{id}/activity", get(social::get_activity))
        .route(
            "/users/{id}/preferences",
            get(preferences::get_preferences).patch(preferences::patch_preferences),
        )
        .route(
            "/users/{id}/preferences/{category}",
            get(preferences::get_preference_category)
                .patch(preferences::patch_preference_category),
        )
        .route(
            "/users/{id}/notifications",
            get(notifications::get_notifications).delete(notifications::delete_notifications),
        )
        .route(
            "/users/{id}/notifications/read-all",
            patch(notifications::patch_notifications_read_all),
        )
        .route(
            "/users/{id}/notifications/{notification_id}/read",
            patch(notifications::patch_notification_read),
        );

    let ops_routes = Router::new()
        .route("/health", get(health::get_health))
        .route("/ready", get(health::get_ready))
        .route("/metrics/performance", get(metrics::get_performance))
        .route("/metrics/cache", get(metrics::get_cache))
        .route("/metrics/system", get(metrics::get_system))
        .route("/metrics/health", get(metrics::get_detailed_health))
        .route("/admin/cache/clear", post(admin::post_clear_cache));

    Router::new()
        .merge(user_routes)
        .merge(ops_routes)
        .layer(middleware::from_fn(principal::attach_principal))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            telemetry::track_requests,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
