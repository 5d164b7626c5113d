use powerlaw_core::PowerLawService;

use crate::error::CliError;

use super::CommandResult;

pub fn run(service: &PowerLawService) -> Result<CommandResult, CliError> {
    Ok(CommandResult::ok(serde_json::to_value(service.get_constants())?))
}
