use std::net::SocketAddr;
use std::time::Duration;
use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use ladle_cache::CacheOptions;
use ladle_db::DbOptions;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub environment: String,
    pub service_version: String,
    pub notifier_url: Option<String>,
    pub db: DbOptions,
    pub cache: CacheOptions,
}

impl Config {
    pub fn load() -> Self {
        let db = DbOptions {
            host: try_load("LADLE_DATABASE_HOST", "localhost"),
            port: try_load("LADLE_DATABASE_PORT", "5432"),
            user: try_load("LADLE_DATABASE_USER", "ladle"),
            password: try_load("LADLE_DATABASE_PASSWORD", "ladle"),
            database: try_load("LADLE_DATABASE_NAME", "ladle"),
            pool_size: try_load("LADLE_DATABASE_POOL_SIZE", "10"),
            min_idle: try_load("LADLE_DATABASE_MIN_IDLE", "1"),
            acquire_timeout: millis("LADLE_DATABASE_ACQUIRE_TIMEOUT_MS", "3000"),
            idle_timeout: millis("LADLE_DATABASE_IDLE_TIMEOUT_MS", "600000"),
        };

        let cache = CacheOptions {
            host: try_load("LADLE_REDIS_HOST", "localhost"),
            port: try_load("LADLE_REDIS_PORT", "6379"),
            username: optional("LADLE_REDIS_USERNAME"),
            password: optional("LADLE_REDIS_PASSWORD"),
            db: try_load("LADLE_REDIS_DB", "0"),
            pool_size: try_load("LADLE_REDIS_POOL_SIZE", "8"),
            min_idle: try_load("LADLE_REDIS_MIN_IDLE", "1"),
            dial_timeout: millis("LADLE_REDIS_DIAL_TIMEOUT_MS", "500"),
            read_timeout: millis("LADLE_REDIS_READ_TIMEOUT_MS", "500"),
            write_timeout: millis("LADLE_REDIS_WRITE_TIMEOUT_MS", "500"),
        };

        Self {
            listen_addr: try_load("LADLE_LISTEN_ADDR", "0.0.0.0:8080"),
            environment: try_load("LADLE_ENVIRONMENT", "development"),
            service_version: try_load("LADLE_SERVICE_VERSION", env!("CARGO_PKG_VERSION")),
            notifier_url: optional("LADLE_NOTIFIER_URL"),
            db,
            cache,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn millis(key: &str, default: &str) -> Duration {
    Duration::from_millis(try_load(key, default))
}
