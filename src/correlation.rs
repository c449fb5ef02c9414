use crate::config::CorrelationConfig;
use crate::model::Sample;
use crate::stats::pearson;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// Scalar feature extracted from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFeature {
    DayOfYear,
    DayOfMonth,
    /// Monday is 0.
    DayOfWeek,
    /// ISO 8601 week number.
    WeekOfYear,
    Year,
    Month,
    Quarter,
}

impl DateFeature {
    pub const ALL: [DateFeature; 7] = [
        DateFeature::DayOfYear,
        DateFeature::DayOfMonth,
        DateFeature::DayOfWeek,
        DateFeature::WeekOfYear,
        DateFeature::Year,
        DateFeature::Month,
        DateFeature::Quarter,
    ];

    pub fn value(self, date: NaiveDate) -> f64 {
        match self {
            DateFeature::DayOfYear => date.ordinal() as f64,
            DateFeature::DayOfMonth => date.day() as f64,
            DateFeature::DayOfWeek => date.weekday().num_days_from_monday() as f64,
            DateFeature::WeekOfYear => date.iso_week().week() as f64,
            DateFeature::Year => date.year() as f64,
            DateFeature::Month => date.month() as f64,
            DateFeature::Quarter => quarter(date) as f64,
        }
    }

    /// Whether shifting the date makes sense for this feature.
    ///
    /// The day of the week is unaffected by a whole-season shift and the
    /// shifted year carries no meaning.
    pub fn has_shift(self) -> bool {
        !matches!(self, DateFeature::DayOfWeek | DateFeature::Year)
    }
}

impl fmt::Display for DateFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateFeature::DayOfYear => "day_of_year",
            DateFeature::DayOfMonth => "day_of_month",
            DateFeature::DayOfWeek => "day_of_week",
            DateFeature::WeekOfYear => "week_of_year",
            DateFeature::Year => "year",
            DateFeature::Month => "month",
            DateFeature::Quarter => "quarter",
        };
        f.write_str(name)
    }
}

fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Feature together with whether its date is shifted back by a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    pub feature: DateFeature,
    pub shifted: bool,
}

impl FeatureSpec {
    /// Every feature unshifted, followed by the shifted variants that exist.
    pub fn all() -> Vec<Self> {
        let plain = DateFeature::ALL.into_iter().map(|feature| Self {
            feature,
            shifted: false,
        });
        let shifted = DateFeature::ALL
            .into_iter()
            .filter(|feature| feature.has_shift())
            .map(|feature| Self {
                feature,
                shifted: true,
            });
        plain.chain(shifted).collect()
    }

    pub fn value(&self, date: NaiveDate, cfg: &CorrelationConfig) -> f64 {
        if !self.shifted {
            return self.feature.value(date);
        }
        match self.feature {
            DateFeature::Month => {
                let date = date
                    .checked_sub_months(Months::new(cfg.shift_months))
                    .unwrap_or(date);
                self.feature.value(date)
            }
            DateFeature::Quarter => match quarter(date) - 1 {
                0 => 4.0,
                q => q as f64,
            },
            _ => {
                let shift = Days::new(cfg.shift_days.unsigned_abs());
                let date = date.checked_sub_days(shift).unwrap_or(date);
                self.feature.value(date)
            }
        }
    }

    pub fn label(&self) -> String {
        if self.shifted {
            format!("{} (shifted)", self.feature)
        } else {
            self.feature.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub label: String,
    pub feature: DateFeature,
    pub shifted: bool,
    pub coefficient: f64,
    pub magnitude: f64,
}

/// Correlate every date feature with the computed MPG of `samples`.
///
/// The result is ranked by magnitude, strongest first; undefined
/// coefficients come last.
pub fn correlate_all(samples: &[Sample], cfg: &CorrelationConfig) -> Vec<Correlation> {
    let target: Vec<_> = samples.iter().map(|sample| sample.real_mpg).collect();

    let mut correlations: Vec<_> = FeatureSpec::all()
        .into_iter()
        .map(|spec| {
            let vals: Vec<_> = samples
                .iter()
                .map(|sample| spec.value(sample.date, cfg))
                .collect();
            let coefficient = pearson(&vals, &target);
            Correlation {
                label: spec.label(),
                feature: spec.feature,
                shifted: spec.shifted,
                coefficient,
                magnitude: coefficient.abs(),
            }
        })
        .collect();

    correlations.sort_by(|a, b| rank_magnitude(a.magnitude, b.magnitude));
    correlations
}

fn rank_magnitude(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
