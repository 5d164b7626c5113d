//! CLI argument definitions for powerlaw.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `series` | Smoothed history paired with model prices |
//! | `deviation` | Current deviation from the model |
//! | `forecast` | Price forecast with confidence intervals |
//! | `constants` | Active model constants |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | JSON config file |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `0` | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! powerlaw deviation --pretty
//! powerlaw forecast 2030
//! POWERLAW_LOOKBACK_YEARS=8 powerlaw series --config powerlaw.json
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Power-law valuation and forecasting CLI.
#[derive(Debug, Parser)]
#[command(
    name = "powerlaw",
    author,
    version,
    about = "Power-law valuation and forecasting for a single asset",
    long_about = "Fetches daily price history, smooths it, compares it with the power-law \
model A * days^B * scale and forecasts future prices with confidence intervals derived \
from time-weighted historical deviation.\n\
\n\
Configuration is read from --config (JSON), then POWERLAW_* environment variables.\n\
Logs go to stderr; RUST_LOG overrides the default filter."
)]
pub struct Cli {
    /// JSON configuration file. Defaults are used when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Smoothed price history paired with model prices.
    ///
    /// Prices are rounded to cents.
    Series,

    /// Deviation of the latest smoothed price from the model price.
    Deviation,

    /// Forecast the price on January 1st of YEAR.
    ///
    /// YEAR must be between the current year and the current year plus the
    /// configured maximum forecast horizon.
    ///
    /// # Examples
    ///
    ///   powerlaw forecast 2030
    ///   powerlaw forecast 2028 --pretty
    Forecast(ForecastArgs),

    /// Print the active model constants.
    Constants,
}

/// Arguments for the `forecast` command.
#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Target calendar year.
    pub year: i32,
}
