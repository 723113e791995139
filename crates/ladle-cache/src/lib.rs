mod info;

pub use info::parse_info;

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError};
use tracing::info;
use uuid::Uuid;

use ladle_types::api::CacheMetricsResponse;

const DELETE_REQUEST_PREFIX: &str = "delete-request:";

/// Batch size for SCAN/DEL sweeps.
const SCAN_BATCH: usize = 100;

/// Connection settings for the Redis client.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: i64,
    pub pool_size: u32,
    pub min_idle: u32,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

/// Port for the deletion-token store, so the account-deletion flow can be
/// exercised without a live Redis.
#[allow(async_fn_in_trait)]
pub trait TokenCache {
    /// Unconditional overwrite: re-requesting deletion supersedes any prior
    /// token.
    async fn put_delete_token(
        &self,
        user: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<(), RedisError>;

    async fn get_delete_token(&self, user: Uuid) -> Result<Option<String>, RedisError>;

    async fn remove_delete_token(&self, user: Uuid) -> Result<(), RedisError>;
}

/// Outcome of a key sweep: how many keys were removed, and the error that
/// interrupted the sweep, if any. Progress made before a failure is kept.
#[derive(Debug)]
pub struct ClearOutcome {
    pub cleared: u64,
    pub error: Option<RedisError>,
}

/// Redis access point. The manager multiplexes one connection and reconnects
/// on failure; cloning is cheap and safe for concurrent use.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    pub async fn connect(opts: &CacheOptions) -> Result<Self, RedisError> {
        // Pool sizing fields are accepted for config parity with the
        // deployment charts; the manager itself multiplexes one connection.
        let connection_info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(opts.host.clone(), opts.port),
            redis: redis::RedisConnectionInfo {
                db: opts.db,
                username: opts.username.clone(),
                password: opts.password.clone(),
                ..Default::default()
            },
        };

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(opts.dial_timeout)
            .set_response_timeout(opts.read_timeout.max(opts.write_timeout));

        let client = redis::Client::open(connection_info)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        info!("Redis connection ready at {}:{}/{}", opts.host, opts.port, opts.db);
        Ok(Self { conn })
    }

    /// Cheap round-trip used by the readiness and health probes.
    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// One pipelined INFO + DBSIZE pair, parsed into cache statistics.
    pub async fn stats(&self) -> Result<CacheMetricsResponse, RedisError> {
        let mut conn = self.conn.clone();
        let (raw_info, total_keys): (String, i64) = redis::pipe()
            .cmd("INFO")
            .arg("memory")
            .arg("stats")
            .arg("keyspace")
            .arg("clients")
            .cmd("DBSIZE")
            .query_async(&mut conn)
            .await?;

        let fields = parse_info(&raw_info);
        let int = |key: &str| fields.get(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);

        let keyspace_hits = int("keyspace_hits");
        let keyspace_misses = int("keyspace_misses");
        let lookups = keyspace_hits + keyspace_misses;
        let hit_rate = (lookups > 0).then(|| keyspace_hits as f64 / lookups as f64);

        Ok(CacheMetricsResponse {
            total_keys,
            used_memory_bytes: int("used_memory"),
            used_memory_human: fields.get("used_memory_human").cloned().unwrap_or_default(),
            connected_clients: int("connected_clients"),
            keyspace_hits,
            keyspace_misses,
            hit_rate,
        })
    }

    /// Sweep keys matching `pattern` in batches, deleting each batch with a
    /// pipelined call. Not transactional: keys removed before a failure stay
    /// removed, and the accumulated count is reported either way.
    pub async fn clear_pattern(&self, pattern: &str) -> ClearOutcome {
        let mut conn = self.conn.clone();
        let mut cleared: u64 = 0;
        let mut cursor: u64 = 0;

        loop {
            let scanned: Result<(u64, Vec<String>), RedisError> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await;

            let (next, keys) = match scanned {
                Ok(batch) => batch,
                Err(e) => return ClearOutcome { cleared, error: Some(e) },
            };

            if !keys.is_empty() {
                let mut pipe = redis::pipe();
                for key in &keys {
                    pipe.del(key);
                }
                match pipe.query_async::<Vec<u64>>(&mut conn).await {
                    Ok(counts) => cleared += counts.iter().sum::<u64>(),
                    Err(e) => return ClearOutcome { cleared, error: Some(e) },
                }
            }

            cursor = next;
            if cursor == 0 {
                return ClearOutcome { cleared, error: None };
            }
        }
    }
}

impl TokenCache for Cache {
    async fn put_delete_token(
        &self,
        user: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(delete_request_key(user), token, ttl.as_secs())
            .await
    }

    async fn get_delete_token(&self, user: Uuid) -> Result<Option<String>, RedisError> {
        let mut conn = self.conn.clone();
        conn.get(delete_request_key(user)).await
    }

    async fn remove_delete_token(&self, user: Uuid) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(delete_request_key(user)).await
    }
}

fn delete_request_key(user: Uuid) -> String {
    format!("{DELETE_REQUEST_PREFIX}{user}")
}
