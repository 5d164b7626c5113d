use powerlaw_core::PowerLawService;
use tracing::info;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::CommandResult;

/// Effective sample sizes below this make the intervals unreliable.
const LOW_EFFECTIVE_SAMPLE_SIZE: f64 = 30.0;

pub async fn run(args: &ForecastArgs, service: &PowerLawService) -> Result<CommandResult, CliError> {
    let forecast = service.get_forecast(args.year).await?;
    info!(
        year = args.year,
        symbol = %service.symbol(),
        lower = forecast.lower_bound,
        upper = forecast.upper_bound,
        "forecast ready"
    );

    let effective = forecast.historical_deviation.effective_sample_size;
    let mut result = CommandResult::ok(serde_json::to_value(&forecast)?);
    if effective < LOW_EFFECTIVE_SAMPLE_SIZE {
        result = result.with_warning(format!(
            "effective sample size {effective:.1} is low; confidence intervals are wide or unreliable"
        ));
    }
    Ok(result)
}
