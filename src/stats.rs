use serde::{Deserialize, Serialize};

/// Running summary of a stream of values (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;

        self.min = self.min.min(val);
        self.max = self.max.max(val);
    }

    pub fn report(&self) -> AccumulatorReport {
        let empty = self.n_vals == 0;
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if empty { f64::NAN } else { self.mean },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
            min: if empty { f64::NAN } else { self.min },
            max: if empty { f64::NAN } else { self.max },
        }
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Accumulator::new();
        iter.into_iter().for_each(|val| acc.add(val));
        acc
    }
}

/// Pearson correlation coefficient between two equally long series.
///
/// Returns NaN when the series differ in length, hold fewer than two values,
/// or either of them has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n_vals = xs.len();
    if n_vals != ys.len() || n_vals < 2 {
        return f64::NAN;
    }

    let mean_x = xs.iter().sum::<f64>() / n_vals as f64;
    let mean_y = ys.iter().sum::<f64>() / n_vals as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Equal-width binning shared by several groups of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
}

impl Histogram {
    /// Build `n_bins` equal-width bins spanning the range of `range_vals`.
    ///
    /// Returns `None` if there are no finite values or `n_bins` is zero.
    pub fn new(range_vals: &[f64], n_bins: usize) -> Option<Self> {
        if n_bins == 0 {
            return None;
        }
        let finite = range_vals.iter().copied().filter(|val| val.is_finite());
        let (mut lo, mut hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), val| {
            (lo.min(val), hi.max(val))
        });
        if lo > hi {
            return None;
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / n_bins as f64;
        let mut edges: Vec<_> = (0..n_bins).map(|i| lo + i as f64 * width).collect();
        edges.push(hi);
        Some(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Count `vals` per bin. The last bin is closed on the right;
    /// values outside the range are ignored.
    pub fn count(&self, vals: &[f64]) -> Vec<usize> {
        let n_bins = self.n_bins();
        let lo = self.edges[0];
        let hi = self.edges[n_bins];
        let width = (hi - lo) / n_bins as f64;

        let mut counts = vec![0; n_bins];
        for &val in vals {
            if !(lo..=hi).contains(&val) {
                continue;
            }
            let i_bin = (((val - lo) / width) as usize).min(n_bins - 1);
            counts[i_bin] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_reports_sample_statistics() {
        let acc: Accumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        let report = acc.report();
        assert_eq!(report.n_vals, 8);
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(report.min, 2.0);
        assert_eq!(report.max, 9.0);
    }

    #[test]
    fn accumulator_with_too_few_values() {
        let report = Accumulator::new().report();
        assert_eq!(report.n_vals, 0);
        assert!(report.mean.is_nan());
        assert!(report.min.is_nan());

        let report: AccumulatorReport = [3.0].into_iter().collect::<Accumulator>().report();
        assert_eq!(report.mean, 3.0);
        assert!(report.std_dev.is_nan());
    }

    #[test]
    fn pearson_of_linear_series() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up: Vec<_> = xs.iter().map(|x| 3.0 * x + 1.0).collect();
        let down: Vec<_> = xs.iter().map(|x| -0.5 * x).collect();
        assert!((pearson(&xs, &up) - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &down) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_known_series() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 1.0, 4.0, 3.0];
        assert!((pearson(&xs, &ys) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn pearson_degenerate_inputs_are_nan() {
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_nan());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn histogram_bins_span_the_range() {
        let hist = Histogram::new(&[0.0, 10.0, 4.0], 5).unwrap();
        assert_eq!(hist.edges(), &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(hist.count(&[0.0, 1.9, 2.0, 9.9, 10.0, 11.0]), vec![2, 1, 0, 0, 2]);
    }

    #[test]
    fn histogram_with_degenerate_range() {
        let hist = Histogram::new(&[3.0, 3.0], 2).unwrap();
        assert_eq!(hist.edges(), &[2.5, 3.0, 3.5]);
        assert_eq!(hist.count(&[3.0]), vec![0, 1]);
        assert!(Histogram::new(&[], 4).is_none());
        assert!(Histogram::new(&[1.0], 0).is_none());
    }
}
