use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliError;

/// Default filter for a verbosity count; `RUST_LOG` takes precedence.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "powerlaw=info,powerlaw_core=info,warn",
        1 => "powerlaw=debug,powerlaw_core=debug,info",
        _ => "powerlaw=trace,powerlaw_core=trace,debug",
    }
}

/// Initialise the global tracing subscriber. Logs go to stderr so stdout
/// carries only the JSON envelope.
pub fn init_tracing(verbose: u8) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .map_err(|error| CliError::Logging(error.to_string()))
}
