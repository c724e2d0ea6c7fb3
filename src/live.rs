//! Classification of a live temperature against the historical day-of-year profile.

use crate::analysis::query;
use crate::model::{DayLookup, DayOfYearStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default maximum distance from the historical average of a normal temperature.
pub const DEFAULT_NORMAL_TOLERANCE: f64 = 10.0;

/// Failures a [`TemperatureSource`] may report.
///
/// Only [`FixedTemperature`] ships with the crate, so some variants are
/// constructed by external sources alone.
#[allow(dead_code)]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("invalid credential")]
    InvalidCredential,

    #[error("city {0:?} not found")]
    CityNotFound(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Provider of the current temperature of a city.
pub trait TemperatureSource {
    fn fetch_current_temperature(&self, city: &str) -> Result<f64, LookupError>;
}

/// Source that always reports the same temperature.
pub struct FixedTemperature {
    temp: f64,
}

impl FixedTemperature {
    pub fn new(temp: f64) -> Self {
        Self { temp }
    }
}

impl TemperatureSource for FixedTemperature {
    fn fetch_current_temperature(&self, _city: &str) -> Result<f64, LookupError> {
        if !self.temp.is_finite() {
            return Err(LookupError::MalformedResponse(format!(
                "temperature is not finite: {}",
                self.temp
            )));
        }
        Ok(self.temp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    Normal,
    Anomalous,
    /// No current temperature could be obtained.
    Unavailable,
    /// No historical observation exists for the day.
    NoHistory,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Classification::Normal => "normal",
            Classification::Anomalous => "anomalous",
            Classification::Unavailable => "cannot classify: no current temperature",
            Classification::NoHistory => "cannot classify: no historical data for this day",
        };
        f.write_str(msg)
    }
}

/// Classify `current` against the historical average of `lookup`.
pub fn classify(current: Option<f64>, lookup: &DayLookup, tolerance: f64) -> Classification {
    let Some(current) = current else {
        return Classification::Unavailable;
    };
    let Some(average) = lookup.average else {
        return Classification::NoHistory;
    };
    if (average - current).abs() <= tolerance {
        Classification::Normal
    } else {
        Classification::Anomalous
    }
}

/// Fetch the current temperature of `city` and classify it for `day_of_year`.
///
/// Lookup failures are logged and classified as [`Classification::Unavailable`].
pub fn classify_current<S: TemperatureSource + ?Sized>(
    source: &S,
    profile: &DayOfYearStats,
    day_of_year: u32,
    tolerance: f64,
) -> (Option<f64>, Classification) {
    let current = match source.fetch_current_temperature(&profile.city) {
        Ok(temp) => Some(temp),
        Err(error) => {
            log::warn!("failed to fetch current temperature of {}: {error}", profile.city);
            None
        }
    };
    let lookup = query(profile, day_of_year);
    (current, classify(current, &lookup, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayStats;
    use std::collections::BTreeMap;

    struct FailingSource(LookupError);

    impl TemperatureSource for FailingSource {
        fn fetch_current_temperature(&self, _city: &str) -> Result<f64, LookupError> {
            Err(self.0.clone())
        }
    }

    fn profile() -> DayOfYearStats {
        let mut days = BTreeMap::new();
        days.insert(
            100,
            DayStats {
                min: 10.0,
                max: 30.0,
                mean: 20.0,
                count: 3,
            },
        );
        DayOfYearStats {
            city: "Berlin".to_string(),
            days,
        }
    }

    #[test]
    fn classify_uses_inclusive_tolerance() {
        let lookup = query(&profile(), 100);
        assert_eq!(classify(Some(30.0), &lookup, 10.0), Classification::Normal);
        assert_eq!(classify(Some(10.0), &lookup, 10.0), Classification::Normal);
        assert_eq!(classify(Some(30.5), &lookup, 10.0), Classification::Anomalous);
        assert_eq!(classify(Some(-1.0), &lookup, 10.0), Classification::Anomalous);
    }

    #[test]
    fn classify_missing_values() {
        let lookup = query(&profile(), 100);
        assert_eq!(classify(None, &lookup, 10.0), Classification::Unavailable);

        let empty = query(&profile(), 200);
        assert_eq!(classify(Some(20.0), &empty, 10.0), Classification::NoHistory);
    }

    #[test]
    fn classify_current_with_fixed_source() {
        let source = FixedTemperature::new(24.0);
        let (current, class) = classify_current(&source, &profile(), 100, 10.0);
        assert_eq!(current, Some(24.0));
        assert_eq!(class, Classification::Normal);
    }

    #[test]
    fn classify_current_swallows_lookup_failures() {
        for error in [
            LookupError::InvalidCredential,
            LookupError::CityNotFound("Berlin".to_string()),
            LookupError::MalformedResponse("missing main.temp".to_string()),
        ] {
            let (current, class) = classify_current(&FailingSource(error), &profile(), 100, 10.0);
            assert_eq!(current, None);
            assert_eq!(class, Classification::Unavailable);
        }

        let (_, class) = classify_current(&FixedTemperature::new(f64::NAN), &profile(), 100, 10.0);
        assert_eq!(class, Classification::Unavailable);
    }
}
