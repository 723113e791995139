pub mod admin;
pub mod error;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod notifier;
pub mod preferences;
pub mod principal;
pub mod social;
pub mod state;
pub mod telemetry;
pub mod users;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testutil;
