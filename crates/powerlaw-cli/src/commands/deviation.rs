use powerlaw_core::PowerLawService;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(service: &PowerLawService) -> Result<CommandResult, CliError> {
    let view = service.get_deviation().await?;
    Ok(CommandResult::ok(serde_json::to_value(view)?))
}
