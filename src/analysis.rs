//! Temperature series analysis.
//!
//! Every function borrows its input and returns freshly computed values.

use crate::model::{
    CitySummary, DayLookup, DayOfYearStats, DayStats, Observation, SeasonalStats, UnionRow,
    WindowedRow,
};
use crate::stats::{Accumulator, fit_line, rolling_stats};
use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Default rolling window size, in observations.
pub const DEFAULT_WINDOW: usize = 30;

/// Number of rolling standard deviations beyond which a temperature is anomalous.
const ANOMALY_N_STD: f64 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("window size must be positive, but is {0}")]
    InvalidWindow(usize),

    #[error("series must contain at least one observation")]
    InsufficientData,

    #[error("series must contain a single city, but contains {0:?}")]
    MixedCities(Vec<String>),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Compute rolling statistics, anomaly flags and a linear trend for a single-city series.
///
/// Rows are returned in chronological order; ties keep their input order.
///
/// # Errors
/// Returns [`AnalysisError::InvalidWindow`] if `window` is zero,
/// [`AnalysisError::InsufficientData`] if `series` is empty
/// and [`AnalysisError::MixedCities`] if `series` spans more than one city.
pub fn compute_window_stats(series: &[Observation], window: usize) -> Result<Vec<WindowedRow>> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }
    if series.is_empty() {
        return Err(AnalysisError::InsufficientData);
    }
    let cities: BTreeSet<&str> = series.iter().map(|obs| obs.city.as_str()).collect();
    if cities.len() > 1 {
        let cities = cities.into_iter().map(str::to_string).collect();
        return Err(AnalysisError::MixedCities(cities));
    }

    let mut sorted = series.to_vec();
    sorted.sort_by_key(|obs| obs.timestamp);

    let temps: Vec<f64> = sorted.iter().map(|obs| obs.temperature).collect();
    let win_stats = rolling_stats(&temps, window);

    let t_min = sorted[0].timestamp;
    let day_numbers: Vec<i64> = sorted
        .iter()
        .map(|obs| (obs.timestamp - t_min).num_days())
        .collect();
    let days: Vec<f64> = day_numbers.iter().map(|&day| day as f64).collect();
    let fit = fit_line(&days, &temps).ok_or(AnalysisError::InsufficientData)?;

    let rows = sorted
        .into_iter()
        .zip(win_stats)
        .zip(day_numbers)
        .map(|((obs, stats), day_number)| {
            let rolling_mean = stats.map(|s| s.mean);
            let rolling_std = stats.and_then(|s| s.std_dev);
            let anomaly = match (rolling_mean, rolling_std) {
                (Some(mean), Some(std)) => {
                    obs.temperature > mean + ANOMALY_N_STD * std
                        || obs.temperature < mean - ANOMALY_N_STD * std
                }
                _ => false,
            };
            WindowedRow {
                obs,
                rolling_mean,
                rolling_std,
                anomaly,
                day_number,
                trend: fit.eval(day_number as f64),
            }
        })
        .collect();

    Ok(rows)
}

/// Compute mean and sample standard deviation of temperature per (city, season).
///
/// Groups are ordered by city, then season.
pub fn compute_seasonal_stats(series: &[Observation]) -> Vec<SeasonalStats> {
    let mut groups: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();
    for obs in series {
        groups
            .entry((obs.city.as_str(), obs.season.as_str()))
            .or_insert_with(Accumulator::new)
            .add(obs.temperature);
    }

    groups
        .into_iter()
        .filter_map(|((city, season), acc)| {
            let report = acc.report()?;
            Some(SeasonalStats {
                city: city.to_string(),
                season: season.to_string(),
                count: report.n_vals,
                mean: report.mean,
                std: report.std_dev,
            })
        })
        .collect()
}

/// Split a series into single-city slices, ordered by city name.
///
/// Observations keep their relative order within each city.
pub fn partition_by_city(series: &[Observation]) -> BTreeMap<String, Vec<Observation>> {
    let mut cities: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in series {
        cities.entry(obs.city.clone()).or_default().push(obs.clone());
    }
    cities
}

/// Outcome of joining one (city, season) key of the windowed rows.
#[derive(Debug, Clone, Copy, PartialEq)]
enum JoinOutcome<'a> {
    Matched(&'a SeasonalStats),
    WindowOnly,
}

/// Join per-city window statistics with seasonal statistics on (city, season).
///
/// The series is partitioned by city before the window analysis, so rolling
/// windows and trends never blend cities. Rows whose (city, season) has no
/// seasonal counterpart are dropped.
///
/// # Errors
/// Returns [`AnalysisError::InvalidWindow`] if `window` is zero
/// and [`AnalysisError::InsufficientData`] if `series` is empty.
pub fn combine(series: &[Observation], window: usize) -> Result<Vec<UnionRow>> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }
    if series.is_empty() {
        return Err(AnalysisError::InsufficientData);
    }

    let seasonal = compute_seasonal_stats(series);
    let seasonal_idx: HashMap<(&str, &str), &SeasonalStats> = seasonal
        .iter()
        .map(|stats| ((stats.city.as_str(), stats.season.as_str()), stats))
        .collect();

    let mut windowed = Vec::with_capacity(series.len());
    for (city, city_series) in partition_by_city(series) {
        let rows = compute_window_stats(&city_series, window)?;
        log::debug!("computed {} windowed rows for {city}", rows.len());
        windowed.extend(rows);
    }

    let mut union = Vec::with_capacity(windowed.len());
    let mut n_dropped = 0;
    for row in windowed {
        let key = (row.obs.city.as_str(), row.obs.season.as_str());
        let outcome = match seasonal_idx.get(&key) {
            Some(&stats) => JoinOutcome::Matched(stats),
            None => JoinOutcome::WindowOnly,
        };
        match outcome {
            JoinOutcome::Matched(stats) => union.push(UnionRow {
                mean: stats.mean,
                std: stats.std,
                row,
            }),
            JoinOutcome::WindowOnly => n_dropped += 1,
        }
    }
    if n_dropped > 0 {
        log::debug!("dropped {n_dropped} rows without seasonal statistics");
    }

    Ok(union)
}

/// Compute the historical temperature range and mean of `city` per day-of-year.
///
/// Observations from all years are pooled by calendar ordinal (1..=366).
pub fn day_of_year_profile(series: &[Observation], city: &str) -> DayOfYearStats {
    let mut accs: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for obs in series.iter().filter(|obs| obs.city == city) {
        accs.entry(obs.timestamp.ordinal())
            .or_insert_with(Accumulator::new)
            .add(obs.temperature);
    }

    let days = accs
        .into_iter()
        .filter_map(|(day, acc)| {
            let report = acc.report()?;
            Some((
                day,
                DayStats {
                    min: report.min,
                    max: report.max,
                    mean: report.mean,
                    count: report.n_vals,
                },
            ))
        })
        .collect();

    DayOfYearStats {
        city: city.to_string(),
        days,
    }
}

/// Look up the historical range and average of a day-of-year.
///
/// Both fields are `None` if the profile has no observation on that exact day.
pub fn query(profile: &DayOfYearStats, day_of_year: u32) -> DayLookup {
    match profile.days.get(&day_of_year) {
        Some(stats) => DayLookup {
            range: Some((stats.min, stats.max)),
            average: Some(stats.mean),
        },
        None => DayLookup {
            range: None,
            average: None,
        },
    }
}

/// Compute count, mean and extrema of the temperatures of `city`.
///
/// # Errors
/// Returns [`AnalysisError::InsufficientData`] if `city` has no observations.
pub fn summarize_city(series: &[Observation], city: &str) -> Result<CitySummary> {
    let mut acc = Accumulator::new();
    series
        .iter()
        .filter(|obs| obs.city == city)
        .for_each(|obs| acc.add(obs.temperature));

    let report = acc.report().ok_or(AnalysisError::InsufficientData)?;
    Ok(CitySummary {
        count: report.n_vals,
        mean: report.mean,
        min: report.min,
        max: report.max,
    })
}
