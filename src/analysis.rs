use crate::config::Config;
use crate::correlation::{Correlation, correlate_all};
use crate::model::{Entry, Sample};
use crate::smoothing::moving_average;
use crate::stats::{Accumulator, AccumulatorReport, Histogram};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

/// Largest Car - Real MPG offset within a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub date: NaiveDate,
    pub offset: f64,
    pub car_mpg: f64,
    pub real_mpg: f64,
    pub miles: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub offset: AccumulatorReport,
    pub outlier: Outlier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramReport {
    pub edges: Vec<f64>,
    /// Counts per bin, one row per entry of [`Report::years`].
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub n_entries: usize,
    pub n_samples: usize,
    pub window_radius: i64,
    pub years: Vec<YearReport>,
    pub histogram: Option<HistogramReport>,
    pub correlations: Vec<Correlation>,
}

#[derive(Debug, Serialize)]
struct TrendRow {
    date: NaiveDate,
    real_mpg: f64,
    car_mpg: f64,
    real_mpg_trend: Option<f64>,
    car_mpg_trend: Option<f64>,
}

#[derive(Debug, Serialize)]
struct OffsetRow {
    date: NaiveDate,
    year: i32,
    offset: f64,
}

pub struct Analyzer {
    cfg: Config,
    n_entries: usize,
    samples: Vec<Sample>,
}

impl Analyzer {
    /// Keep the entries with every numeric field present.
    pub fn new(cfg: Config, entries: &[Entry]) -> Self {
        let samples: Vec<_> = entries.iter().filter_map(Sample::from_entry).collect();
        log::info!(
            "dropped {} entries with missing values",
            entries.len() - samples.len()
        );
        Self {
            cfg,
            n_entries: entries.len(),
            samples,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Trend lines of the computed and the reported MPG, aligned with the samples.
    pub fn trends(&self) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>)> {
        let radius = self.cfg.smoothing.window_radius;
        let real: Vec<_> = self.samples.iter().map(|s| Some(s.real_mpg)).collect();
        let car: Vec<_> = self.samples.iter().map(|s| Some(s.car_mpg)).collect();
        let real_trend = moving_average(&real, radius).context("failed to smooth real MPG")?;
        let car_trend = moving_average(&car, radius).context("failed to smooth car MPG")?;
        Ok((real_trend, car_trend))
    }

    fn samples_by_year(&self) -> BTreeMap<i32, Vec<&Sample>> {
        let mut by_year: BTreeMap<i32, Vec<&Sample>> = BTreeMap::new();
        for sample in &self.samples {
            by_year.entry(sample.date.year()).or_default().push(sample);
        }
        by_year
    }

    pub fn report(&self) -> Report {
        let by_year = self.samples_by_year();

        let mut years = Vec::with_capacity(by_year.len());
        let mut offsets_per_year = Vec::with_capacity(by_year.len());
        for (&year, samples) in &by_year {
            let offsets: Vec<_> = samples.iter().map(|s| s.offset()).collect();
            let outlier = samples
                .iter()
                .copied()
                .reduce(|max, s| if s.offset() > max.offset() { s } else { max })
                .map(|s| Outlier {
                    date: s.date,
                    offset: s.offset(),
                    car_mpg: s.car_mpg,
                    real_mpg: s.real_mpg,
                    miles: s.miles,
                });
            // Groups are never empty.
            let Some(outlier) = outlier else { continue };

            years.push(YearReport {
                year,
                offset: offsets.iter().copied().collect::<Accumulator>().report(),
                outlier,
            });
            offsets_per_year.push(offsets);
        }

        let all_offsets: Vec<_> = offsets_per_year.iter().flatten().copied().collect();
        let histogram = Histogram::new(&all_offsets, self.cfg.histogram.n_bins).map(|hist| {
            HistogramReport {
                edges: hist.edges().to_vec(),
                counts: offsets_per_year.iter().map(|vals| hist.count(vals)).collect(),
            }
        });

        Report {
            n_entries: self.n_entries,
            n_samples: self.samples.len(),
            window_radius: self.cfg.smoothing.window_radius,
            years,
            histogram,
            correlations: correlate_all(&self.samples, &self.cfg.correlation),
        }
    }

    pub fn save_report<P: AsRef<Path>>(&self, report: &Report, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents = toml::to_string_pretty(report).context("failed to serialize report")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }

    pub fn save_trends<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let (real_trend, car_trend) = self.trends()?;
        let rows = self
            .samples
            .iter()
            .zip(real_trend)
            .zip(car_trend)
            .map(|((s, real_mpg_trend), car_mpg_trend)| TrendRow {
                date: s.date,
                real_mpg: s.real_mpg,
                car_mpg: s.car_mpg,
                real_mpg_trend,
                car_mpg_trend,
            });
        write_csv(rows, file)
    }

    pub fn save_offsets<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let rows = self.samples.iter().map(|s| OffsetRow {
            date: s.date,
            year: s.date.year(),
            offset: s.offset(),
        });
        write_csv(rows, file)
    }
}

fn write_csv<T, I, P>(rows: I, file: P) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let file = file.as_ref();
    let handle = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(handle));
    for row in rows {
        writer.serialize(row).context("failed to serialize row")?;
    }
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Log the ranked correlations, one feature per line.
pub fn log_correlations(correlations: &[Correlation]) {
    for corr in correlations {
        log::info!("{:>22}: |corr| = {:.4}", corr.label, corr.magnitude);
    }
}
