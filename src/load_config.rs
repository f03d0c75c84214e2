//! `load_config`: turns CLI input plus environment timing variables into a [`RunConfig`].
//!
//! Timing comes from the environment so that calling pipelines can tune it without touching the
//! command line:
//!
//! - `BUILD_TIMEOUT_SECONDS` (default 86400): budget for the queue wait and again for the build wait.
//! - `POLL_INTERVAL` (default 5): seconds between two polls.
//!
//! Unset variables fall back to their defaults. Set but unparsable values are errors, and so is a
//! zero poll interval since it would turn both polling loops into busy loops.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::config::{
    PollSettings, RunConfig, TriggerRequest, DEFAULT_BUILD_TIMEOUT_SECONDS,
    DEFAULT_POLL_INTERVAL_SECONDS,
};

pub const BUILD_TIMEOUT_ENV: &str = "BUILD_TIMEOUT_SECONDS";
pub const POLL_INTERVAL_ENV: &str = "POLL_INTERVAL";

/// Combines an already parsed trigger request with timing read from the environment.
pub fn load_config(trigger: TriggerRequest) -> Result<RunConfig> {
    let poll = load_poll_settings()?;
    let config = RunConfig { trigger, poll };
    config.trace_loaded();
    Ok(config)
}

pub fn load_poll_settings() -> Result<PollSettings> {
    let build_timeout = read_seconds(BUILD_TIMEOUT_ENV, DEFAULT_BUILD_TIMEOUT_SECONDS)?;
    let poll_interval = read_seconds(POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL_SECONDS)?;

    if poll_interval == 0 {
        error!(var = POLL_INTERVAL_ENV, "Poll interval must be at least one second");
        anyhow::bail!("{POLL_INTERVAL_ENV} must be at least 1 second");
    }

    Ok(PollSettings {
        build_timeout: Duration::from_secs(build_timeout),
        poll_interval: Duration::from_secs(poll_interval),
    })
}

fn read_seconds(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => {
                info!(var, secs, "Read timing from environment");
                Ok(secs)
            }
            Err(e) => {
                error!(error = ?e, var, raw = %raw, "Timing variable must be a whole number of seconds");
                Err(anyhow::anyhow!(
                    "{var} must be a whole number of seconds, got {raw:?}: {e}"
                ))
            }
        },
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => {
            error!(error = ?e, var, "Timing variable is not valid unicode");
            Err(anyhow::anyhow!("{var} is not valid unicode: {e}"))
        }
    }
}
