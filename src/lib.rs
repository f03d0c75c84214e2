//! remote-job: trigger a parameterized Jenkins build on a remote server and follow it to the end.
//!
//! The library holds the whole run; the binary only parses arguments and turns the result into an
//! exit code.
//!
//! # Layout
//! - [`contract`]: the transport, sleep and console seams (mockable).
//! - [`client`]: reqwest implementation of the transport.
//! - [`crumb`], [`trigger`], [`queue`], [`monitor`]: the stages, in the order they run.
//! - [`outcome`]: build results and exit codes.
//! - [`pipeline`]: wires the stages together.

pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod crumb;
pub mod error;
pub mod load_config;
pub mod monitor;
pub mod outcome;
pub mod pipeline;
pub mod poll;
pub mod queue;
pub mod trigger;

pub use cli::{run, Cli};
pub use error::RemoteJobError;
pub use pipeline::run_remote_job;
