use powerlaw_core::{ConfigError, EngineError, EnvelopeError, ErrorClass};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] powerlaw_core::ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Engine(error) => class_exit_code(error.class()),
            Self::Logging(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }

    /// Machine-readable form written to stderr.
    pub fn to_envelope_error(&self) -> EnvelopeError {
        match self {
            Self::Engine(error) => EnvelopeError::from(error),
            other => EnvelopeError {
                code: String::from(other.code()),
                message: other.to_string(),
                class: None,
                status: None,
            },
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "cli.validation",
            Self::Config(_) => "cli.config",
            Self::Engine(error) => error.code(),
            Self::Logging(_) => "cli.logging",
            Self::Serialization(_) => "cli.serialization",
            Self::Io(_) => "cli.io",
        }
    }
}

const fn class_exit_code(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::InvalidInput => 2,
        ErrorClass::NotFound => 4,
        ErrorClass::Upstream => 5,
        ErrorClass::Internal => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerlaw_core::{AnalysisError, FetchError, ForecastError, SourceError};

    #[test]
    fn exit_codes_follow_error_class() {
        let past = CliError::from(EngineError::from(ForecastError::PastYearRequested {
            year: 2020,
            current_year: 2025,
        }));
        assert_eq!(past.exit_code(), 2);

        let empty = CliError::from(EngineError::from(AnalysisError::EmptySeries));
        assert_eq!(empty.exit_code(), 4);

        let upstream = CliError::from(EngineError::from(FetchError::UpstreamUnavailable {
            attempts: 3,
            source: SourceError::unavailable("down"),
        }));
        assert_eq!(upstream.exit_code(), 5);
    }

    #[test]
    fn config_errors_are_input_errors() {
        let error = CliError::from(ConfigError::InvalidEnv {
            name: "POWERLAW_PAGE_LIMIT",
            value: String::from("lots"),
        });
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_envelope_error().code, "cli.config");
    }
}
