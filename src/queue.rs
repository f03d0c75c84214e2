//! Queue resolution: waiting for a queued build request to be handed an executor.
//!
//! A freshly triggered build exists only as a queue item. Jenkins fills in `executable.url` once the
//! build has a number; until then the field is absent, `null`, or (on some versions) the string
//! `"null"`. All three mean "still queued".

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::PollSettings;
use crate::contract::{Crumb, HttpTransport, Sleeper};
use crate::error::RemoteJobError;
use crate::poll::PollBudget;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueItemStatus {
    #[serde(default)]
    pub executable: Option<Executable>,
    #[serde(default)]
    pub cancelled: Option<bool>,
    /// Human readable reason the item is still waiting.
    #[serde(default)]
    pub why: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Executable {
    #[serde(default)]
    pub url: Option<String>,
}

impl QueueItemStatus {
    /// The build URL, with the server's `"null"` string treated as absent.
    pub fn build_url(&self) -> Option<&str> {
        self.executable
            .as_ref()
            .and_then(|executable| executable.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != "null")
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    Queued,
    Assigned { build_url: String },
}

impl From<&QueueItemStatus> for QueueState {
    fn from(status: &QueueItemStatus) -> Self {
        match status.build_url() {
            Some(url) => QueueState::Assigned {
                build_url: url.to_string(),
            },
            None => QueueState::Queued,
        }
    }
}

/// A queue item that made it to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    pub build_url: String,
    /// Number of queue status requests it took.
    pub polls: usize,
}

pub struct QueueResolver<'a, T: ?Sized, S: ?Sized> {
    transport: &'a T,
    sleeper: &'a S,
    settings: &'a PollSettings,
}

impl<'a, T, S> QueueResolver<'a, T, S>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
{
    pub fn new(transport: &'a T, sleeper: &'a S, settings: &'a PollSettings) -> Self {
        QueueResolver {
            transport,
            sleeper,
            settings,
        }
    }

    async fn poll(&self, queue_url: &str, crumb: &Crumb) -> Result<QueueItemStatus, RemoteJobError> {
        self.transport
            .get(queue_url, Some(crumb.clone()))
            .await?
            .into_json(queue_url)
    }

    /// Polls `queue_url` until the item has a build URL.
    ///
    /// Fails with [`RemoteJobError::QueueTimeout`] once more than the build timeout has been spent
    /// waiting, without polling again.
    pub async fn resolve(&self, queue_url: &str, crumb: &Crumb) -> Result<ResolvedBuild, RemoteJobError> {
        let mut budget = PollBudget::new(self.settings.build_timeout);
        let mut polls = 0;

        loop {
            if polls > 0 {
                info!(queue_url, elapsed_secs = budget.elapsed().as_secs(), "Build is still queued");
                budget.wait(self.sleeper, self.settings.poll_interval).await;
                if budget.is_exhausted() {
                    error!(
                        queue_url,
                        timeout_secs = budget.timeout().as_secs(),
                        "A job was queued, but it did not start running in time"
                    );
                    return Err(RemoteJobError::QueueTimeout {
                        queue_url: queue_url.to_string(),
                        timeout: budget.timeout(),
                    });
                }
            }

            let status = self.poll(queue_url, crumb).await?;
            polls += 1;

            match QueueState::from(&status) {
                QueueState::Assigned { build_url } => {
                    info!(build_url = %build_url, polls, "Build started");
                    return Ok(ResolvedBuild { build_url, polls });
                }
                QueueState::Queued if status.is_cancelled() => {
                    error!(queue_url, "Queued item was cancelled");
                    return Err(RemoteJobError::QueueCancelled {
                        queue_url: queue_url.to_string(),
                    });
                }
                QueueState::Queued => {
                    if let Some(why) = status.why.as_deref() {
                        debug!(queue_url, why, "Queue reports");
                    }
                }
            }
        }
    }
}
