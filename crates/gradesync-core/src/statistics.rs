//! Descriptive statistics and the mark distribution.

use serde::{Deserialize, Serialize};

use crate::scoring::MAX_MARK;

/// Number of integer bins on the 0–10 scale.
pub const HISTOGRAM_BINS: usize = 11;

/// Summary statistics over a set of marks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent for fewer than two marks.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl MarkStatistics {
    /// Compute statistics, ignoring non-finite values. `None` if nothing is left.
    pub fn from_marks(marks: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = marks.iter().copied().filter(|m| m.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std_dev = (count > 1).then(|| {
            let var = sorted.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            count,
            mean,
            std_dev,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Count marks per integer bin, rounding half up (`floor(mark + 0.5)`).
pub fn mark_histogram(marks: &[f64]) -> [usize; HISTOGRAM_BINS] {
    let mut bins = [0usize; HISTOGRAM_BINS];
    for &mark in marks {
        let mark = if mark.is_finite() { mark.clamp(0.0, MAX_MARK) } else { 0.0 };
        let bin = (mark + 0.5).floor() as usize;
        bins[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_match_reference_values() {
        let stats = MarkStatistics::from_marks(&[2.0, 4.0, 4.0, 5.0, 10.0]).unwrap();
        assert_eq!(stats.count, 5);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev.unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(
            (stats.min, stats.q1, stats.median, stats.q3, stats.max),
            (2.0, 4.0, 4.0, 5.0, 10.0)
        );
    }

    #[test]
    fn quantiles_interpolate() {
        let stats = MarkStatistics::from_marks(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((stats.q1 - 1.75).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.q3 - 3.25).abs() < 1e-12);
    }

    #[test]
    fn single_mark_has_no_std_dev() {
        let stats = MarkStatistics::from_marks(&[7.0]).unwrap();
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.median, 7.0);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(MarkStatistics::from_marks(&[]).is_none());
        assert!(MarkStatistics::from_marks(&[f64::NAN]).is_none());
    }

    #[test]
    fn histogram_rounds_half_up() {
        let bins = mark_histogram(&[0.0, 0.49, 0.5, 5.5, 9.5, 10.0, 12.0]);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[1], 1);
        assert_eq!(bins[6], 1);
        assert_eq!(bins[10], 3);
        assert_eq!(bins.iter().sum::<usize>(), 7);
    }
}
