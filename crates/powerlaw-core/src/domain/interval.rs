use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::timestamp::MS_PER_DAY;
use crate::ValidationError;

/// Candle intervals usable for the daily-resolution history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    pub const ALL: [Self; 3] = [Self::OneDay, Self::ThreeDays, Self::OneWeek];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
        }
    }

    pub const fn days(self) -> i64 {
        match self {
            Self::OneDay => 1,
            Self::ThreeDays => 3,
            Self::OneWeek => 7,
        }
    }

    /// Step between consecutive candle open times.
    pub const fn millis(self) -> i64 {
        self.days() * MS_PER_DAY
    }

    pub fn from_days(days: i64) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.days() == days)
            .ok_or_else(|| ValidationError::InvalidInterval {
                value: format!("{days}d"),
            })
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "3d" => Ok(Self::ThreeDays),
            "1w" => Ok(Self::OneWeek),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interval() {
        let interval = Interval::from_str("1D").expect("must parse");
        assert_eq!(interval, Interval::OneDay);
        assert_eq!(interval.millis(), 86_400_000);
    }

    #[test]
    fn rejects_intraday_interval() {
        let err = Interval::from_str("1h").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidInterval { .. }));
    }

    #[test]
    fn maps_day_counts() {
        assert_eq!(Interval::from_days(7).expect("weekly"), Interval::OneWeek);
        assert!(Interval::from_days(2).is_err());
    }
}
