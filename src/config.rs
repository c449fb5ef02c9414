use crate::smoothing::DEFAULT_WINDOW_RADIUS;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub filter: FilterConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    pub correlation: CorrelationConfig,
    pub histogram: HistogramConfig,
}

/// Geographic bounding box. Bounds are exclusive.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Number of samples on either side of the averaged one.
    #[serde(default = "default_window_radius")]
    pub window_radius: i64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_radius: DEFAULT_WINDOW_RADIUS,
        }
    }
}

fn default_window_radius() -> i64 {
    DEFAULT_WINDOW_RADIUS
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Days subtracted from each date for the shifted day-based features.
    pub shift_days: i64,
    /// Calendar months subtracted from each date for the shifted month feature.
    pub shift_months: u32,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    pub n_bins: usize,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
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
        let filter = &self.filter;
        check_num(filter.lat_min, -90.0..=90.0).context("invalid minimum latitude")?;
        check_num(filter.lat_max, -90.0..=90.0).context("invalid maximum latitude")?;
        check_num(filter.lon_min, -180.0..=180.0).context("invalid minimum longitude")?;
        check_num(filter.lon_max, -180.0..=180.0).context("invalid maximum longitude")?;
        check_order(filter.lat_min, filter.lat_max).context("invalid latitude range")?;
        check_order(filter.lon_min, filter.lon_max).context("invalid longitude range")?;

        check_num(self.smoothing.window_radius, 0..1000).context("invalid window radius")?;

        check_num(self.correlation.shift_days, 0..=366).context("invalid day shift")?;
        check_num(self.correlation.shift_months, 0..=12).context("invalid month shift")?;

        check_num(self.histogram.n_bins, 1..1000).context("invalid number of histogram bins")?;

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

fn check_order(min: f64, max: f64) -> Result<()> {
    if min >= max {
        bail!("minimum must be less than maximum, but {min} >= {max}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[filter]
lat_min = 41.3
lat_max = 42.2
lon_min = -94.0
lon_max = -93.0

[correlation]
shift_days = 91
shift_months = 3

[histogram]
n_bins = 10
"#;

    #[test]
    fn smoothing_section_defaults_to_radius_two() {
        let cfg = Config::from_toml(VALID).unwrap();
        assert_eq!(cfg.smoothing.window_radius, 2);
        assert_eq!(cfg.filter.lon_min, -94.0);
        assert_eq!(cfg.histogram.n_bins, 10);
    }

    #[test]
    fn explicit_window_radius_is_used() {
        let contents = format!("{VALID}\n[smoothing]\nwindow_radius = 4\n");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.smoothing.window_radius, 4);
    }

    #[test]
    fn negative_window_radius_is_rejected() {
        let contents = format!("{VALID}\n[smoothing]\nwindow_radius = -1\n");
        let err = Config::from_toml(&contents).unwrap_err();
        assert!(format!("{err:#}").contains("invalid window radius"));
    }

    #[test]
    fn inverted_bounding_box_is_rejected() {
        let contents = VALID.replace("lat_max = 42.2", "lat_max = 40.0");
        let err = Config::from_toml(&contents).unwrap_err();
        assert!(format!("{err:#}").contains("invalid latitude range"));
    }

    #[test]
    fn missing_section_is_rejected() {
        let contents = VALID.replace("[histogram]\nn_bins = 10\n", "");
        assert!(Config::from_toml(&contents).is_err());
    }
}
