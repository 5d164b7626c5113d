mod cli;
mod commands;
mod error;
mod logging;
mod metadata;
mod output;

use std::process::ExitCode;

use clap::Parser;
use powerlaw_core::{EngineConfig, PowerLawService};
use tracing::{debug, error};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = logging::init_tracing(cli.verbose) {
        eprintln!("warning: {error}");
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(code = failure.exit_code(), "{failure}");
            if output::render_error(&failure, cli.pretty).is_err() {
                eprintln!("error: {failure}");
            }
            ExitCode::from(failure.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    debug!(
        symbol = %config.upstream.symbol,
        interval = %config.upstream.interval,
        lookback_years = config.upstream.lookback_years,
        "configuration loaded"
    );

    let service = PowerLawService::from_config(&config);
    let envelope = commands::run(cli, &service).await?;
    output::render(&envelope, cli.pretty)
}
