//! # Domain Models
//!
//! Canonical domain types for the power-law engine.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Sample`] | Validated (open time, close price) observation |
//! | [`Series`] | Chronological, deduplicated samples |
//! | [`ModelConstants`] | Power-law parameters and forecasting tunables |
//! | [`Symbol`] | Validated trading pair |
//! | [`Interval`] | Candle interval (1d, 3d, 1w) |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! Samples are only built through [`Sample::new`] or [`validate_record`], so a
//! `Series` never holds a non-positive timestamp or price:
//!
//! ```rust
//! use powerlaw_core::{Sample, ValidationError};
//!
//! assert!(Sample::new(1_700_000_000_000, 35_000.0).is_ok());
//! assert!(matches!(
//!     Sample::new(1_700_000_000_000, 0.0),
//!     Err(ValidationError::NonPositiveValue { .. })
//! ));
//! ```

mod constants;
mod interval;
mod sample;
mod symbol;
pub(crate) mod timestamp;

pub use constants::{ModelConstants, DEFAULT_CONFIDENCE_LABEL, GENESIS_MS};
pub use interval::Interval;
pub use sample::{record_open_time, validate_record, Sample, Series};
pub use symbol::{Symbol, DEFAULT_SYMBOL};
pub use timestamp::{UtcDateTime, MS_PER_DAY, MS_PER_YEAR};
