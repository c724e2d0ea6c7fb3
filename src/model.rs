//! Temperature data types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single temperature observation of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    /// Categorical season label, taken as given.
    pub season: String,
}

impl Observation {
    pub fn new(
        city: impl Into<String>,
        timestamp: NaiveDateTime,
        temperature: f64,
        season: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
            season: season.into(),
        }
    }
}

/// Observation augmented with rolling-window statistics and trend.
///
/// Rolling statistics are `None` while the window is not yet full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedRow {
    pub obs: Observation,

    pub rolling_mean: Option<f64>,
    pub rolling_std: Option<f64>,

    /// Temperature lies more than two rolling standard deviations from the rolling mean.
    pub anomaly: bool,

    /// Whole days elapsed since the earliest timestamp of the series.
    pub day_number: i64,
    /// Value of the least-squares line at `day_number`.
    pub trend: f64,
}

/// Temperature statistics of one (city, season) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalStats {
    pub city: String,
    pub season: String,
    pub count: usize,
    pub mean: f64,
    /// `None` for groups with a single observation.
    pub std: Option<f64>,
}

/// Windowed row joined with the seasonal statistics of its (city, season).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionRow {
    pub row: WindowedRow,
    pub mean: f64,
    pub std: Option<f64>,
}

/// Temperature range and mean observed on one calendar day across all years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Historical profile of a city keyed by day-of-year (1..=366).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfYearStats {
    pub city: String,
    pub days: BTreeMap<u32, DayStats>,
}

/// Answer to "what is normal for this day-of-year".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayLookup {
    pub range: Option<(f64, f64)>,
    pub average: Option<f64>,
}

/// Key figures of a city's whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Everything a chart or report needs for one city.
#[derive(Debug, Serialize, Deserialize)]
pub struct CityReport {
    pub city: String,
    pub summary: CitySummary,
    pub rows: Vec<UnionRow>,
    pub seasonal: Vec<SeasonalStats>,
    pub n_anomalies: usize,
}
