mod constants;
mod deviation;
mod forecast;
mod series;

use std::time::Instant;

use powerlaw_core::{Envelope, PowerLawService, SCHEMA_VERSION};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub async fn run(cli: &Cli, service: &PowerLawService) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Series => series::run(service).await?,
        Command::Deviation => deviation::run(service).await?,
        Command::Forecast(args) => forecast::run(args, service).await?,
        Command::Constants => constants::run(service)?,
    };

    let CommandResult { data, warnings } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut metadata = Metadata::new(latency_ms);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta(SCHEMA_VERSION)?;
    Ok(Envelope::success(meta, data))
}
