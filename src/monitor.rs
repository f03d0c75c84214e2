//! Build monitoring: waiting for a running build to finish while tailing its console.
//!
//! Jenkins only offers the full console text, so every cycle downloads all of it and the
//! [`ConsoleCursor`] decides which lines have not been shown yet. The cursor counts lines, never
//! moves backwards, and is local to one monitor run.

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::contract::{resource_url, ConsoleSink, Crumb, HttpTransport, Sleeper};
use crate::error::RemoteJobError;
use crate::outcome::{BuildResult, RunReport};
use crate::poll::PollBudget;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatus {
    pub building: bool,
    #[serde(default)]
    pub result: Option<String>,
}

impl BuildStatus {
    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn result(&self) -> BuildResult {
        BuildResult::from_field(self.result.as_deref())
    }
}

/// Splits console text into complete lines.
///
/// Accepts `\r\n` and `\n`. Whatever follows the last terminator is dropped: an empty string for
/// well-formed text, otherwise a line the server is still writing.
pub fn split_console(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    lines.pop();
    lines
}

/// Number of console lines already handed to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleCursor {
    seen: usize,
}

impl ConsoleCursor {
    pub fn position(&self) -> usize {
        self.seen
    }

    /// Returns the lines past the cursor and moves the cursor to the end.
    ///
    /// If the console shrank, nothing is returned and the cursor stays where it was.
    pub fn advance<'t, L>(&mut self, lines: &'t [L]) -> &'t [L] {
        let total = lines.len();
        if total <= self.seen {
            return &[];
        }
        let fresh = &lines[self.seen..];
        self.seen = total;
        fresh
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Building,
    Finished { timed_out: bool },
}

pub struct BuildMonitor<'a, T: ?Sized, S: ?Sized, C: ?Sized> {
    transport: &'a T,
    sleeper: &'a S,
    sink: &'a C,
    config: &'a RunConfig,
}

impl<'a, T, S, C> BuildMonitor<'a, T, S, C>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
    C: ConsoleSink + ?Sized,
{
    pub fn new(transport: &'a T, sleeper: &'a S, sink: &'a C, config: &'a RunConfig) -> Self {
        BuildMonitor {
            transport,
            sleeper,
            sink,
            config,
        }
    }

    async fn fetch_status(&self, build_url: &str, crumb: &Crumb) -> Result<BuildStatus, RemoteJobError> {
        let url = resource_url(build_url, "api/json");
        self.transport
            .get(&url, Some(crumb.clone()))
            .await?
            .into_json(&url)
    }

    async fn fetch_console(&self, build_url: &str, crumb: &Crumb) -> Result<String, RemoteJobError> {
        let url = resource_url(build_url, "consoleText");
        self.transport
            .get(&url, Some(crumb.clone()))
            .await?
            .into_text(&url)
    }

    /// Tails the build at `build_url` until it finishes or the build timeout runs out, then reads
    /// its result.
    ///
    /// A local timeout is not an error: the report comes back with `timed_out` set and whatever
    /// result the server reports at that point, usually none.
    pub async fn watch(&self, build_url: &str, crumb: &Crumb) -> Result<RunReport, RemoteJobError> {
        let job_name = self.config.trigger.job_name();
        let poll = &self.config.poll;
        let mut budget = PollBudget::new(poll.build_timeout);
        let mut cursor = ConsoleCursor::default();
        let mut state = MonitorState::Building;

        while state == MonitorState::Building {
            budget.wait(self.sleeper, poll.poll_interval).await;
            if budget.is_exhausted() {
                error!(
                    build_url,
                    timeout_secs = budget.timeout().as_secs(),
                    "TIME-OUT: Exceeded {} seconds",
                    budget.timeout().as_secs()
                );
                state = MonitorState::Finished { timed_out: true };
                continue;
            }

            let status = self.fetch_status(build_url, crumb).await?;
            let text = self.fetch_console(build_url, crumb).await?;
            let lines = split_console(&text);
            let fresh = cursor.advance(lines.as_slice());
            debug!(
                build_url,
                total_lines = lines.len(),
                new_lines = fresh.len(),
                building = status.is_building(),
                "Polled build"
            );
            for line in fresh {
                self.sink.emit(job_name, line);
            }

            if !status.is_building() {
                state = MonitorState::Finished { timed_out: false };
            }
        }

        let final_status = self.fetch_status(build_url, crumb).await?;
        let timed_out = matches!(state, MonitorState::Finished { timed_out: true });
        info!(build_url, timed_out, result = ?final_status.result, "Build monitoring finished");

        Ok(RunReport {
            job_name: job_name.to_string(),
            build_url: build_url.to_string(),
            result: final_status.result(),
            timed_out,
            lines_emitted: cursor.position(),
        })
    }
}
