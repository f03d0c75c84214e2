//! Command line surface of `remote-job`.
//!
//! Parsing, logging setup and the call into [`run_remote_job`] live here; every decision about the
//! remote build is made in the library modules. [`run`] returns the report instead of exiting so
//! integration tests can drive it; `main` owns the one translation into an exit code.
//!
//! Timing is not a flag: see [`crate::load_config`] for `BUILD_TIMEOUT_SECONDS` and
//! `POLL_INTERVAL`.
use std::io::IsTerminal;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::Level;

use crate::client::JenkinsClient;
use crate::config::{Credentials, TriggerRequest};
use crate::contract::TracingConsoleSink;
use crate::load_config::load_config;
use crate::outcome::RunReport;
use crate::pipeline::run_remote_job;
use crate::poll::TokioSleeper;

/// Trigger a remote Jenkins job, follow its console and exit with its result.
#[derive(Parser, Debug)]
#[clap(
    name = "remote-job",
    version,
    about = "Trigger a remote Jenkins job, stream its console and exit 0 only if it succeeded"
)]
pub struct Cli {
    /// Remote Jenkins URL (http://jenkins-url:8080)
    #[clap(long, short = 'u')]
    pub jenkins_url: String,

    /// Remote Jenkins job name; use `folder/job` for jobs inside folders
    #[clap(long, short = 'j')]
    pub job_name: String,

    /// Remote Jenkins user
    #[clap(long, short = 'l')]
    pub jenkins_user: String,

    /// Remote Jenkins user API token
    #[clap(long, short = 't')]
    pub token: String,

    /// Parameter to pass (-p param1=value1 -p param2=value2)
    #[clap(long, short = 'p', num_args = 1.., action = ArgAction::Append, value_parser = parse_parameter)]
    pub parameter: Vec<String>,

    /// Debug output
    #[clap(long, short = 'd')]
    pub debug: bool,
}

impl Cli {
    pub fn trigger_request(&self) -> TriggerRequest {
        TriggerRequest::new(
            self.jenkins_url.clone(),
            self.job_name.clone(),
            self.parameter.clone(),
            Credentials {
                user: self.jenkins_user.clone(),
                token: self.token.clone(),
            },
        )
    }
}

fn parse_parameter(raw: &str) -> Result<String, String> {
    match raw.split_once('=') {
        Some((key, _)) if !key.trim().is_empty() => Ok(raw.to_string()),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

/// Installs the fmt subscriber; `--debug` lowers the threshold from INFO to DEBUG.
pub fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<RunReport> {
    tracing::info!(job_name = %cli.job_name, "remote-job starting");

    let config = load_config(cli.trigger_request())?;
    let client = JenkinsClient::new(config.trigger.credentials().clone())?;

    let report = run_remote_job(&config, &client, &TokioSleeper, &TracingConsoleSink).await?;
    report.log();
    Ok(report)
}
