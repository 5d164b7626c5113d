use powerlaw_core::PowerLawService;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(service: &PowerLawService) -> Result<CommandResult, CliError> {
    let view = service.get_series().await?;

    let undefined = view
        .points
        .iter()
        .filter(|point| point.model_price == 0.0)
        .count();

    let mut result = CommandResult::ok(serde_json::to_value(&view)?);
    if undefined > 0 {
        result = result.with_warning(format!(
            "model price undefined for {undefined} point(s); reported as 0"
        ));
    }
    Ok(result)
}
