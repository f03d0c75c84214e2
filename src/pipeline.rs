//! High-level run: crumb → trigger → queue → monitor, strictly in that order.
//!
//! Each stage either hands its product to the next one or ends the run with a
//! [`RemoteJobError`]. Nothing here exits the process; the CLI turns the returned
//! [`RunReport`] or error into an exit code.

use tracing::info;

use crate::config::RunConfig;
use crate::contract::{ConsoleSink, HttpTransport, Sleeper};
use crate::crumb::fetch_crumb;
use crate::error::RemoteJobError;
use crate::monitor::BuildMonitor;
use crate::outcome::RunReport;
use crate::queue::QueueResolver;
use crate::trigger::trigger_build;

pub async fn run_remote_job<T, S, C>(
    config: &RunConfig,
    transport: &T,
    sleeper: &S,
    sink: &C,
) -> Result<RunReport, RemoteJobError>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
    C: ConsoleSink + ?Sized,
{
    let request = &config.trigger;
    info!(job_name = %request.job_name(), server_url = %request.server_url(), "Starting remote job");

    let crumb = fetch_crumb(transport, request).await?;
    let queue_url = trigger_build(transport, request, &crumb).await?;

    let resolved = QueueResolver::new(transport, sleeper, &config.poll)
        .resolve(&queue_url, &crumb)
        .await?;
    info!(build_url = %resolved.build_url, "JOB URL: {}", resolved.build_url);

    BuildMonitor::new(transport, sleeper, sink, config)
        .watch(&resolved.build_url, &crumb)
        .await
}
