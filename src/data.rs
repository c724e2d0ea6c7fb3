use crate::model::Observation;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

#[derive(Debug, Deserialize)]
struct Record {
    city: String,
    timestamp: String,
    temperature: f64,
    season: String,
}

/// Read observations from a CSV file with `city,timestamp,temperature,season` columns.
///
/// Rows whose timestamp cannot be parsed or whose temperature is not finite are skipped.
pub fn read_observations<P: AsRef<Path>>(file: P) -> Result<Vec<Observation>> {
    let file = file.as_ref();
    let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    parse_observations(reader).with_context(|| format!("failed to parse {file:?}"))
}

pub fn parse_observations<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut obs_vec = Vec::new();
    for (idx, record) in reader.deserialize().enumerate() {
        // Line 1 holds the headers.
        let line = idx + 2;
        let record: Record = record.with_context(|| format!("failed to read line {line}"))?;

        let Some(timestamp) = parse_timestamp(&record.timestamp) else {
            log::warn!("skipped line {line}: invalid timestamp {:?}", record.timestamp);
            continue;
        };
        if !record.temperature.is_finite() {
            log::warn!("skipped line {line}: non-finite temperature {}", record.temperature);
            continue;
        }
        obs_vec.push(Observation::new(
            record.city,
            timestamp,
            record.temperature,
            record.season,
        ));
    }

    Ok(obs_vec)
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
