//! Starting the remote build.
//!
//! Only `buildWithParameters` answers with the `Location` of the queue item, which is the sole
//! handle we get on the build before it starts. Jobs without parameters are triggered through the
//! same endpoint with a placeholder parameter.

use tracing::{error, info, warn};

use crate::config::TriggerRequest;
use crate::contract::{resource_url, Crumb, HttpTransport};
use crate::error::RemoteJobError;

/// Sent when no parameters were given, so the query string is never empty.
pub const PLACEHOLDER_PARAMETER: &str = "_dummy_=1";

/// Path of a job below the server root. `folder/job` becomes `job/folder/job/job`.
pub fn job_path(job_name: &str) -> String {
    job_name
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("job/{segment}"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins the `key=value` pairs with `&`, or falls back to [`PLACEHOLDER_PARAMETER`].
pub fn build_query(parameters: &[String]) -> String {
    if parameters.is_empty() {
        warn!("No parameters were set, triggering with {PLACEHOLDER_PARAMETER}");
        return PLACEHOLDER_PARAMETER.to_string();
    }
    parameters.join("&")
}

pub fn trigger_url(request: &TriggerRequest) -> String {
    format!(
        "{}/{}/buildWithParameters?{}",
        request.server_url(),
        job_path(request.job_name()),
        build_query(request.parameters())
    )
}

/// Status URL of a queue item, given the `Location` the trigger answered with.
pub fn queue_status_url(location: &str) -> String {
    resource_url(location, "api/json")
}

/// Starts the build and returns the status URL of its queue item.
///
/// Not idempotent: every successful call queues one more build.
pub async fn trigger_build<T>(
    transport: &T,
    request: &TriggerRequest,
    crumb: &Crumb,
) -> Result<String, RemoteJobError>
where
    T: HttpTransport + ?Sized,
{
    let url = trigger_url(request);
    info!(url = %url, "Calling remote job");

    let response = transport.post(&url, Some(crumb.clone())).await?;
    if !response.is_success() && !response.is_redirection() {
        error!(url = %url, status = response.status, "Trigger request was rejected");
        return Err(RemoteJobError::HttpStatus {
            url,
            status: response.status,
        });
    }

    match response.location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => {
            let queue_url = queue_status_url(location);
            info!(queue_url = %queue_url, "Build queued");
            Ok(queue_url)
        }
        _ => {
            error!(url = %url, "No queued item URL was found in the trigger response");
            Err(RemoteJobError::MissingQueueLocation { trigger_url: url })
        }
    }
}
