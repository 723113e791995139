//! Client for the external notifications producer.
//!
//! Follow events are dispatched on a detached task with the client's own
//! timeout, so a cancelled request still triggers fan-out.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct NewFollowerEvent {
    pub user_id: Uuid,
    pub follower_id: Uuid,
    pub follower_username: String,
}

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl Notifier {
    /// `base_url` of the producer; `None` disables fan-out (local dev).
    pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Fire-and-forget: spawned on the runtime, independent of the caller's
    /// cancellation scope. Failures are logged, never surfaced.
    pub fn dispatch_new_follower(&self, event: NewFollowerEvent) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_new_follower(&event).await {
                warn!(
                    "new-follower event for user {} failed: {e}",
                    event.user_id
                );
            }
        });
    }

    async fn send_new_follower(&self, event: &NewFollowerEvent) -> reqwest::Result<()> {
        let Some(base) = &self.base_url else {
            debug!("notifications producer not configured; dropping follow event");
            return Ok(());
        };
        self.http
            .post(format!("{base}/events/new-follower"))
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
