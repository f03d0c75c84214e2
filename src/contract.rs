//! # contract: seams between the polling core and the outside world
//!
//! The crumb, trigger, queue and monitor stages never talk to the network, the clock or the log
//! directly. They go through the three traits defined here:
//!
//! - [`HttpTransport`]: authenticated GET/POST against the Jenkins server.
//! - [`Sleeper`]: the pause between two polls.
//! - [`ConsoleSink`]: where freshly seen console lines of the remote build end up.
//!
//! `HttpTransport` and `Sleeper` are annotated for `mockall`, so tests can script server responses
//! and count sleeps without a server or a real clock. The mocks are exported under the
//! `test-export-mocks` feature (on by default) for the integration tests in `tests/`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::error::RemoteJobError;

/// Header name Jenkins expects when the crumb issuer does not say otherwise.
pub const DEFAULT_CRUMB_FIELD: &str = "Jenkins-Crumb";

/// Anti-forgery token attached to requests once it has been issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    /// Header name to send the token under.
    pub field: String,
    pub value: String,
}

impl Crumb {
    pub fn new(value: impl Into<String>) -> Self {
        Crumb {
            field: DEFAULT_CRUMB_FIELD.to_string(),
            value: value.into(),
        }
    }
}

/// Appends `suffix` to a Jenkins object URL with exactly one `/` between them.
pub fn resource_url(base: &str, suffix: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), suffix)
}

/// The parts of an HTTP response the core looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Value of the `Location` header, if any.
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        HttpResponse {
            status: 200,
            location: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Fails with [`RemoteJobError::HttpStatus`] unless the status is 2xx.
    pub fn error_for_status(self, url: &str) -> Result<Self, RemoteJobError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RemoteJobError::HttpStatus {
                url: url.to_string(),
                status: self.status,
            })
        }
    }

    /// Checks the status, then decodes the body as JSON.
    pub fn into_json<T: DeserializeOwned>(self, url: &str) -> Result<T, RemoteJobError> {
        let response = self.error_for_status(url)?;
        serde_json::from_str(&response.body).map_err(|e| RemoteJobError::decode(url, e))
    }

    /// Checks the status, then hands back the raw body.
    pub fn into_text(self, url: &str) -> Result<String, RemoteJobError> {
        Ok(self.error_for_status(url)?.body)
    }
}

/// Authenticated access to the Jenkins server.
///
/// Implementors own the credentials. `crumb` is attached as a request header when present.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, crumb: Option<Crumb>) -> Result<HttpResponse, RemoteJobError>;

    async fn post(&self, url: &str, crumb: Option<Crumb>) -> Result<HttpResponse, RemoteJobError>;
}

/// Suspends the run between two polls.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Receives console lines of the remote build, in order, each exactly once.
pub trait ConsoleSink: Send + Sync {
    fn emit(&self, job_name: &str, line: &str);
}

/// Logs every console line at INFO, tagged with the job name.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsoleSink;

impl ConsoleSink for TracingConsoleSink {
    fn emit(&self, job_name: &str, line: &str) {
        tracing::info!("[{job_name}] {line}");
    }
}
