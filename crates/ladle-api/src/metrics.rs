//! Operational metrics: request performance, cache statistics, host and
//! process statistics, and a composed health report.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path as FsPath;
use std::time::Instant;

use anyhow::anyhow;
use axum::extract::State;
use axum::Json;
use prometheus::proto::MetricFamily;
use sysinfo::{Disks, ProcessesToUpdate, System};

use ladle_types::api::{
    CacheMetricsResponse, ComponentHealth, DetailedHealthResponse, DiskStats, MemoryStats,
    PerformanceMetricsResponse, ProcessStats, SystemMetricsResponse,
};

use crate::error::ApiError;
use crate::health::PROBE_TIMEOUT;
use crate::state::AppState;
use crate::telemetry;

/// Request statistics extracted from the metrics registry.
#[derive(Debug, Default, PartialEq)]
pub struct RequestStats {
    pub total: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub average_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Pull the request counter and duration histogram out of gathered metric
/// families. Missing families read as zeroes.
pub fn request_stats(families: &[MetricFamily]) -> RequestStats {
    let mut total = 0u64;
    let mut client_errors = 0u64;
    let mut server_errors = 0u64;

    for family in families
        .iter()
        .filter(|f| f.get_name() == telemetry::HTTP_REQUESTS_TOTAL)
    {
        for metric in family.get_metric() {
            let count = metric.get_counter().get_value() as u64;
            total += count;
            let class = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == "status")
                .and_then(|l| l.get_value().chars().next());
            match class {
                Some('4') => client_errors += count,
                Some('5') => server_errors += count,
                _ => {}
            }
        }
    }

    let mut sum_seconds = 0f64;
    let mut sample_count = 0u64;
    // Merge bucket counts across label series, keyed by upper bound. The
    // bit pattern of a non-negative f64 orders the same as its value.
    let mut merged: BTreeMap<u64, u64> = BTreeMap::new();
    for family in families
        .iter()
        .filter(|f| f.get_name() == telemetry::HTTP_REQUEST_DURATION_SECONDS)
    {
        for metric in family.get_metric() {
            let histogram = metric.get_histogram();
            sum_seconds += histogram.get_sample_sum();
            sample_count += histogram.get_sample_count();
            for bucket in histogram.get_bucket() {
                let bound = bucket.get_upper_bound();
                // the +Inf bucket is implied by the sample count
                if bound.is_finite() {
                    *merged.entry(bound.to_bits()).or_insert(0) += bucket.get_cumulative_count();
                }
            }
        }
    }
    let buckets: Vec<(f64, u64)> = merged
        .into_iter()
        .map(|(bits, count)| (f64::from_bits(bits), count))
        .collect();

    let average_ms = if sample_count > 0 {
        sum_seconds / sample_count as f64 * 1000.0
    } else {
        0.0
    };

    RequestStats {
        total,
        client_errors,
        server_errors,
        average_ms,
        p50_ms: quantile(&buckets, sample_count, 0.50) * 1000.0,
        p95_ms: quantile(&buckets, sample_count, 0.95) * 1000.0,
        p99_ms: quantile(&buckets, sample_count, 0.99) * 1000.0,
    }
}

/// Quantile by linear interpolation across cumulative buckets (ascending
/// upper bounds). Falls back to the largest bound when no bucket reaches the
/// rank, and to 0 for an empty histogram.
pub fn quantile(buckets: &[(f64, u64)], total: u64, q: f64) -> f64 {
    if total == 0 || buckets.is_empty() {
        return 0.0;
    }
    let rank = q * total as f64;
    let (mut prev_bound, mut prev_cumulative) = (0.0f64, 0u64);
    for &(bound, cumulative) in buckets {
        if cumulative as f64 >= rank {
            if cumulative == prev_cumulative {
                return bound;
            }
            return prev_bound
                + (bound - prev_bound) * (rank - prev_cumulative as f64)
                    / ((cumulative - prev_cumulative) as f64);
        }
        prev_bound = bound;
        prev_cumulative = cumulative;
    }
    buckets.last().map_or(0.0, |b| b.0)
}

// -- Host & process metrics --

fn collect_host_metrics() -> Result<SystemMetricsResponse, ApiError> {
    let mut sys = System::new_all();
    // CPU usage needs two samples a short interval apart.
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let pid = sysinfo::get_current_pid()
        .map_err(|e| ApiError::Internal(anyhow!("cannot resolve own pid: {e}")))?;
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let process = sys
        .process(pid)
        .ok_or_else(|| ApiError::Internal(anyhow!("own process missing from snapshot")))?;

    let total_memory = sys.total_memory();
    let used_memory = sys.used_memory();
    let memory = MemoryStats {
        total_bytes: total_memory,
        used_bytes: used_memory,
        percent: percent_of(used_memory, total_memory),
    };

    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .iter()
        .find(|d| d.mount_point() == FsPath::new("/"))
        .or_else(|| disks.iter().max_by_key(|d| d.total_space()));
    let disk = match root {
        Some(d) => {
            let total = d.total_space();
            let used = total.saturating_sub(d.available_space());
            DiskStats {
                total_bytes: total,
                used_bytes: used,
                percent: percent_of(used, total),
            }
        }
        None => DiskStats {
            total_bytes: 0,
            used_bytes: 0,
            percent: 0.0,
        },
    };

    Ok(SystemMetricsResponse {
        cpu_percent: sys.global_cpu_usage(),
        memory,
        disk,
        process: ProcessStats {
            rss_bytes: process.memory(),
            vms_bytes: process.virtual_memory(),
            cpu_percent: process.cpu_usage(),
            threads: process.tasks().map(|t| t.len()).unwrap_or(0),
            open_files: open_fd_count(),
        },
        uptime_seconds: 0,
    })
}

fn percent_of(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

#[cfg(target_os = "linux")]
fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .map(|entries| entries.count().saturating_sub(1))
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn open_fd_count() -> usize {
    0
}

// -- Handlers --

pub async fn get_performance(
    State(state): State<AppState>,
) -> Result<Json<PerformanceMetricsResponse>, ApiError> {
    let families = state.telemetry.registry().gather();
    let stats = request_stats(&families);
    Ok(Json(PerformanceMetricsResponse {
        total_requests: stats.total,
        client_errors: stats.client_errors,
        server_errors: stats.server_errors,
        average_latency_ms: stats.average_ms,
        p50_latency_ms: stats.p50_ms,
        p95_latency_ms: stats.p95_ms,
        p99_latency_ms: stats.p99_ms,
        database: state.db.pool_stats(),
    }))
}

pub async fn get_cache(
    State(state): State<AppState>,
) -> Result<Json<CacheMetricsResponse>, ApiError> {
    Ok(Json(state.cache.stats().await?))
}

pub async fn get_system(
    State(state): State<AppState>,
) -> Result<Json<SystemMetricsResponse>, ApiError> {
    let started_at = state.started_at;
    let mut response = tokio::task::spawn_blocking(collect_host_metrics)
        .await
        .map_err(|e| ApiError::Internal(anyhow!("system metrics task failed: {e}")))??;
    response.uptime_seconds = started_at.elapsed().as_secs();
    Ok(Json(response))
}

pub async fn get_detailed_health(
    State(state): State<AppState>,
) -> Result<Json<DetailedHealthResponse>, ApiError> {
    let (database, cache) = tokio::join!(
        probe_component(state.db.ping()),
        probe_component(state.cache.ping()),
    );
    let healthy = database.status == "healthy" && cache.status == "healthy";
    Ok(Json(DetailedHealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        database,
        cache,
    }))
}

async fn probe_component<E>(
    probe: impl Future<Output = Result<(), E>>,
) -> ComponentHealth {
    let start = Instant::now();
    let outcome = tokio::time::timeout(PROBE_TIMEOUT, probe).await;
    let up = matches!(outcome, Ok(Ok(())));
    ComponentHealth {
        status: if up { "healthy" } else { "unhealthy" }.to_string(),
        latency_ms: up.then(|| start.elapsed().as_millis() as u64),
    }
}
