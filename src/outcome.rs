//! Mapping the end of a run onto a process exit code.

use std::fmt;

use tracing::{error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// The `result` field of a build. `Missing` covers both `null` (still running) and an absent field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    Other(String),
    Missing,
}

impl BuildResult {
    pub fn from_field(field: Option<&str>) -> Self {
        match field.map(str::trim) {
            None | Some("") | Some("null") => BuildResult::Missing,
            Some("SUCCESS") => BuildResult::Success,
            Some("UNSTABLE") => BuildResult::Unstable,
            Some("FAILURE") => BuildResult::Failure,
            Some("NOT_BUILT") => BuildResult::NotBuilt,
            Some("ABORTED") => BuildResult::Aborted,
            Some(other) => BuildResult::Other(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildResult::Success => f.write_str("SUCCESS"),
            BuildResult::Unstable => f.write_str("UNSTABLE"),
            BuildResult::Failure => f.write_str("FAILURE"),
            BuildResult::NotBuilt => f.write_str("NOT_BUILT"),
            BuildResult::Aborted => f.write_str("ABORTED"),
            BuildResult::Other(value) => f.write_str(value),
            BuildResult::Missing => f.write_str("None"),
        }
    }
}

/// Summary of a run that got as far as a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job_name: String,
    pub build_url: String,
    pub result: BuildResult,
    /// The monitor gave up locally; the build may still be running.
    pub timed_out: bool,
    pub lines_emitted: usize,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        if self.result.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Logs the final verdict: INFO on success, ERROR otherwise.
    pub fn log(&self) {
        if self.result.is_success() {
            info!(
                build_url = %self.build_url,
                lines = self.lines_emitted,
                "[{}] Build Result: {}",
                self.job_name,
                self.result
            );
        } else {
            error!(
                build_url = %self.build_url,
                timed_out = self.timed_out,
                "[{}] BUILD RESULT: {} - Build is unsuccessful, timed out, or status could not be obtained.",
                self.job_name,
                self.result
            );
        }
    }
}
