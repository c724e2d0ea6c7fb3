use crate::analysis::{
    combine, compute_seasonal_stats, day_of_year_profile, partition_by_city, query,
    summarize_city,
};
use crate::config::Config;
use crate::data::read_observations;
use crate::live::{FixedTemperature, classify_current};
use crate::model::{CityReport, Observation};
use anyhow::{Context, Result, bail};
use chrono::Datelike;
use glob::glob;
use rmp_serde::encode;
use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub struct Manager {
    data_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        let cfg_file = data_dir.join("config.toml");
        let cfg = if cfg_file.exists() {
            Config::from_file(&cfg_file).context("failed to construct cfg")?
        } else {
            log::info!("{cfg_file:?} not found, using default config");
            Config::default()
        };
        log::info!("{cfg:#?}");

        Ok(Self { data_dir, cfg })
    }

    pub fn analyze(&self, city: Option<&str>) -> Result<()> {
        let obs_vec = self
            .load_observations()
            .context("failed to load observations")?;

        let cities = select_cities(&obs_vec, city)?;
        let obs_vec = match city {
            Some(city) => partition_by_city(&obs_vec)
                .remove(city)
                .with_context(|| format!("no observations of {city:?}"))?,
            None => obs_vec,
        };

        let union = combine(&obs_vec, self.cfg.analysis.window)
            .context("failed to combine window and seasonal statistics")?;

        for city in cities {
            let city_obs: Vec<_> = obs_vec
                .iter()
                .filter(|obs| obs.city == city)
                .cloned()
                .collect();

            let summary = summarize_city(&city_obs, &city)
                .with_context(|| format!("failed to summarize {city}"))?;
            let rows: Vec<_> = union
                .iter()
                .filter(|row| row.row.obs.city == city)
                .cloned()
                .collect();
            let n_anomalies = rows.iter().filter(|row| row.row.anomaly).count();

            let report = CityReport {
                city: city.clone(),
                summary,
                rows,
                seasonal: compute_seasonal_stats(&city_obs),
                n_anomalies,
            };
            log::info!(
                "{city}: {} rows, mean {:.2}, min {:.2}, max {:.2}, {n_anomalies} anomalies",
                report.summary.count,
                report.summary.mean,
                report.summary.min,
                report.summary.max
            );

            self.save_report(&report)
                .with_context(|| format!("failed to save report of {city}"))?;
        }

        Ok(())
    }

    pub fn classify(&self, city: &str, temp: f64, day_of_year: Option<u32>) -> Result<()> {
        let obs_vec = self
            .load_observations()
            .context("failed to load observations")?;
        select_cities(&obs_vec, Some(city))?;

        let day_of_year = day_of_year.unwrap_or_else(|| chrono::Local::now().ordinal());
        if !(1..=366).contains(&day_of_year) {
            bail!("day of year must be in the range 1..=366, but is {day_of_year}");
        }

        let profile = day_of_year_profile(&obs_vec, city);
        let lookup = query(&profile, day_of_year);
        match (lookup.range, lookup.average) {
            (Some((min, max)), Some(avg)) => {
                log::info!("{city} on day {day_of_year}: min {min:.2}, max {max:.2}, mean {avg:.2}")
            }
            _ => log::info!("{city} on day {day_of_year}: no historical data"),
        }

        let source = FixedTemperature::new(temp);
        let (current, class) = classify_current(
            &source,
            &profile,
            day_of_year,
            self.cfg.classify.normal_tolerance,
        );
        if let Some(current) = current {
            log::info!("current temperature in {city}: {current:.2}");
        }
        log::info!("temperature is {class}");

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        for file in self.glob_files("report-*.msgpack")? {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn load_observations(&self) -> Result<Vec<Observation>> {
        let files = self.glob_files(&self.cfg.input.pattern)?;
        if files.is_empty() {
            bail!(
                "no files match {:?} in {:?}",
                self.cfg.input.pattern,
                self.data_dir
            );
        }

        let mut obs_vec = Vec::new();
        for file in files {
            let file_obs = read_observations(&file)?;
            log::info!("read {} observations from {file:?}", file_obs.len());
            obs_vec.extend(file_obs);
        }
        Ok(obs_vec)
    }

    fn glob_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = self.data_dir.join(pattern);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let files = glob(pattern)
            .context("failed to glob files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        Ok(files)
    }

    fn save_report(&self, report: &CityReport) -> Result<()> {
        let path = self.report_file(&report.city);
        let file = File::create(&path).with_context(|| format!("failed to create {path:?}"))?;
        let mut writer = BufWriter::new(file);

        encode::write(&mut writer, report).context("failed to serialize report")?;
        writer.flush().context("failed to flush writer stream")?;

        log::info!("saved {path:?}");
        Ok(())
    }

    fn report_file(&self, city: &str) -> PathBuf {
        let name: String = city
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.data_dir.join(format!("report-{name}.msgpack"))
    }
}

fn select_cities(obs_vec: &[Observation], city: Option<&str>) -> Result<Vec<String>> {
    let cities: BTreeSet<&str> = obs_vec.iter().map(|obs| obs.city.as_str()).collect();
    match city {
        Some(city) if !cities.contains(city) => bail!("no observations of {city:?}"),
        Some(city) => Ok(vec![city.to_string()]),
        None => Ok(cities.into_iter().map(str::to_string).collect()),
    }
}
