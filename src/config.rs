use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

pub const DEFAULT_BUILD_TIMEOUT_SECONDS: u64 = 86_400;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

/// Jenkins user plus API token, sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to start one build. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    server_url: String,
    job_name: String,
    parameters: Vec<String>,
    credentials: Credentials,
}

impl TriggerRequest {
    pub fn new(
        server_url: impl Into<String>,
        job_name: impl Into<String>,
        parameters: Vec<String>,
        credentials: Credentials,
    ) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        TriggerRequest {
            server_url,
            job_name: job_name.into(),
            parameters,
            credentials,
        }
    }

    /// Base URL without a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// `key=value` pairs in the order they were given.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Timing of both polling stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Budget for each polling stage (queue wait, then build wait).
    pub build_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            build_timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECONDS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        }
    }
}

/// The configuration of one run, passed by reference to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub trigger: TriggerRequest,
    pub poll: PollSettings,
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        info!(
            server_url = %self.trigger.server_url(),
            job_name = %self.trigger.job_name(),
            parameters_count = self.trigger.parameters().len(),
            build_timeout_secs = self.poll.build_timeout.as_secs(),
            poll_interval_secs = self.poll.poll_interval.as_secs(),
            "Loaded run configuration"
        );
        debug!(?self, "Run configuration (full debug)");
    }
}
