use clap::Parser;
use remote_job::cli::{init_tracing, run, Cli};
use remote_job::outcome::EXIT_FAILURE;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("CLI arguments parsed, invoking run");

    let code = match run(cli).await {
        Ok(report) => report.exit_code(),
        Err(e) => {
            tracing::error!(error = %e, "Remote job failed");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
