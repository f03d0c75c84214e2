//! Error type shared by every stage of a remote job run.
//!
//! Every variant is terminal for the run: nothing in this crate retries. The CLI maps any
//! `RemoteJobError` to exit code 1.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteJobError {
    /// The request never produced a response (connection refused, TLS, DNS, ...).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no Location header in response to {trigger_url}; cannot find the queued item")]
    MissingQueueLocation { trigger_url: String },

    #[error("job was queued at {queue_url} but did not start running within {} seconds", .timeout.as_secs())]
    QueueTimeout { queue_url: String, timeout: Duration },

    #[error("queued item {queue_url} was cancelled before it started")]
    QueueCancelled { queue_url: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RemoteJobError {
    pub(crate) fn decode(url: &str, source: serde_json::Error) -> Self {
        RemoteJobError::Decode {
            url: url.to_string(),
            source,
        }
    }
}
