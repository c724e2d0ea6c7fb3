use crate::analysis::DEFAULT_WINDOW;
use crate::live::DEFAULT_NORMAL_TOLERANCE;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// Missing sections and fields take their default values.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub classify: ClassifyConfig,
    pub input: InputConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Rolling window size, in observations.
    pub window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Maximum distance from the historical average of a normal temperature.
    pub normal_tolerance: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            normal_tolerance: DEFAULT_NORMAL_TOLERANCE,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Glob pattern of the data files, relative to the data directory.
    pub pattern: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pattern: "*.csv".to_string(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.analysis.window, 1..=10_000).context("invalid window size")?;
        check_num(self.classify.normal_tolerance, 0.0..=100.0)
            .context("invalid normal tolerance")?;
        if self.input.pattern.is_empty() {
            bail!("input pattern must not be empty");
        }
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").expect("empty config is valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.window, 30);
        assert_eq!(config.classify.normal_tolerance, 10.0);
        assert_eq!(config.input.pattern, "*.csv");
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = Config::from_toml("[analysis]\nwindow = 7\n").expect("valid config");
        assert_eq!(config.analysis.window, 7);
        assert_eq!(config.classify, ClassifyConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_toml("[analysis]\nwindow = 0\n").is_err());
        assert!(Config::from_toml("[classify]\nnormal_tolerance = -1.0\n").is_err());
        assert!(Config::from_toml("[input]\npattern = \"\"\n").is_err());
        assert!(Config::from_toml("[analysis]\nwindows = 3\n").is_err());
    }
}
