//! Descriptive statistics over raw channels and power series.
use serde::Serialize;
use crate::analysis::band_power::PowerSeries;
/// Mean and population standard deviation. Empty input gives `(0.0, 0.0)`.
pub fn mean_std(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let variance = data
        .iter()
        .map(|v| {
            let delta = v - mean;
            delta * delta
        })
        .sum::<f64>()
        / data.len() as f64;
    (mean, variance.sqrt())
}
fn min_max(data: &[f64]) -> (f64, f64) {
    data.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}
/// Amplitude summary of a channel. All zeros for empty input.
pub fn summarize(samples: &[f64]) -> SummaryStats {
    if samples.is_empty() {
        return SummaryStats::default();
    }
    let (mean, std) = mean_std(samples);
    let (min, max) = min_max(samples);
    SummaryStats {
        mean,
        std,
        min,
        max,
        range: max - min,
    }
}
/// Spread of a band-power series, as shown next to the power plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PowerStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub coefficient_of_variation: f64,
    pub window_count: usize,
    pub window_spacing_seconds: f64,
}
impl PowerStatistics {
    pub fn from_series(series: &PowerSeries) -> Self {
        if series.is_empty() {
            return Self::default();
        }
        let (mean, std) = mean_std(&series.powers);
        let (min, max) = min_max(&series.powers);
        let window_spacing_seconds = match (series.times.first(), series.times.get(1)) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        };
        Self {
            mean,
            std,
            min,
            max,
            coefficient_of_variation: if mean > 0.0 { std / mean } else { 0.0 },
            window_count: series.len(),
            window_spacing_seconds,
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn summary_of_known_values() {
        let stats = summarize(&[0.0, 2.0, -2.0, 0.0]);
        assert_eq!(stats.mean, 0.0);
        assert!((stats.std - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.range, 4.0);
        assert_eq!(summarize(&[]), SummaryStats::default());
    }
    #[test]
    fn power_statistics_guard_zero_mean() {
        let series = PowerSeries {
            times: vec![1.0, 1.5, 2.0],
            powers: vec![2.0, 4.0, 6.0],
        };
        let stats = PowerStatistics::from_series(&series);
        assert_eq!(stats.window_count, 3);
        assert_eq!(stats.window_spacing_seconds, 0.5);
        assert!((stats.coefficient_of_variation - (8.0f64 / 3.0).sqrt() / 4.0).abs() < 1e-12);
        let zeros = PowerSeries {
            times: vec![1.0, 2.0],
            powers: vec![0.0, 0.0],
        };
        assert_eq!(PowerStatistics::from_series(&zeros).coefficient_of_variation, 0.0);
    }
}
