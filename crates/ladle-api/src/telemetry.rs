//! Request metrics on the shared Prometheus registry.
//!
//! The family names are contract constants: the performance aggregation in
//! `metrics` looks them up by name and reads zeroes when they are absent.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::state::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl Telemetry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(HTTP_REQUESTS_TOTAL, "Total HTTP requests handled"),
            &["method", "path", "status"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                HTTP_REQUEST_DURATION_SECONDS,
                "HTTP request latency in seconds",
            ),
            &["method", "path"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record(&self, method: &str, path: &str, status: u16, seconds: f64) {
        self.requests
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.duration
            .with_label_values(&[method, path])
            .observe(seconds);
    }
}

/// Middleware: count and time every response, labeled with the matched route
/// template rather than the raw URI.
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(req).await;
    state
        .telemetry
        .record(&method, &path, response.status().as_u16(), start.elapsed().as_secs_f64());
    response
}
