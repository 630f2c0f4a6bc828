//! Detrended Fluctuation Analysis.
//!
//! The profile (cumulative sum of the mean-centred signal) is cut into equal segments at
//! each scale, a least-squares line is removed from every segment, and the RMS residual
//! F(s) is collected. The scaling exponent alpha is the slope of log10 F(s) against
//! log10 s.
use serde::Serialize;
use crate::analysis::AnalysisError;
/// Smallest scale, in samples, that is accepted.
pub const MIN_SCALE_FLOOR: usize = 4;
/// Valid (scale, fluctuation) pairs needed before a slope is fitted.
pub const MIN_FIT_POINTS: usize = 3;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DfaRegime {
    AntiCorrelated,
    ShortRangeCorrelated,
    LongRangeCorrelated,
    NonStationary,
    Invalid,
}
impl DfaRegime {
    pub fn from_alpha(alpha: f64) -> Self {
        if alpha.is_nan() {
            DfaRegime::Invalid
        } else if alpha < 0.5 {
            DfaRegime::AntiCorrelated
        } else if alpha < 1.0 {
            DfaRegime::ShortRangeCorrelated
        } else if alpha < 1.5 {
            DfaRegime::LongRangeCorrelated
        } else {
            DfaRegime::NonStationary
        }
    }
    pub fn description(&self) -> &'static str {
        match self {
            DfaRegime::AntiCorrelated => "anti-correlated",
            DfaRegime::ShortRangeCorrelated => "short-range correlated",
            DfaRegime::LongRangeCorrelated => "long-range correlated",
            DfaRegime::NonStationary => "non-stationary",
            DfaRegime::Invalid => "insufficient data",
        }
    }
}
#[derive(Clone, Debug, Serialize)]
pub struct DfaResult {
    pub scales: Vec<usize>,
    pub fluctuations: Vec<f64>,
    /// NaN when too few scales produced a usable fluctuation.
    pub alpha: f64,
    /// log10 intercept of the fit, NaN together with `alpha`.
    pub intercept: f64,
}
impl DfaResult {
    pub fn regime(&self) -> DfaRegime {
        DfaRegime::from_alpha(self.alpha)
    }
    pub fn is_valid(&self) -> bool {
        self.alpha.is_finite()
    }
    /// Smallest and largest retained scale expressed in seconds.
    pub fn time_range_seconds(&self, sample_rate_hz: f64) -> Option<(f64, f64)> {
        let first = *self.scales.first()?;
        let last = *self.scales.last()?;
        Some((first as f64 / sample_rate_hz, last as f64 / sample_rate_hz))
    }
    /// `(scale, fitted F)` at every retained scale; empty when alpha is NaN.
    pub fn fitted_line(&self) -> Vec<(f64, f64)> {
        if !self.is_valid() {
            return Vec::new();
        }
        self.scales
            .iter()
            .map(|&s| {
                let s = s as f64;
                (s, 10f64.powf(self.intercept + self.alpha * s.log10()))
            })
            .collect()
    }
}
/// `n_scales` log-uniform scales from `min_scale` to `max_scale`, rounded.
/// Callers guarantee `n_scales >= 2`.
fn log_scales(min_scale: usize, max_scale: usize, n_scales: usize) -> Vec<usize> {
    let (lo, hi) = ((min_scale as f64).ln(), (max_scale as f64).ln());
    let step = (hi - lo) / (n_scales - 1) as f64;
    (0..n_scales)
        .map(|i| (lo + step * i as f64).exp().round() as usize)
        .collect()
}
/// RMS of the linear-detrended residual over `floor(len/scale)` segments, or `None`
/// when fewer than two segments fit.
fn fluctuation(profile: &[f64], scale: usize) -> Option<f64> {
    let segments = profile.len() / scale;
    if segments < 2 {
        return None;
    }
    let n = scale as f64;
    let x_mean = (n - 1.0) / 2.0;
    let sxx = n * (n * n - 1.0) / 12.0;
    let mut total = 0.0;
    for segment in profile.chunks_exact(scale).take(segments) {
        let y_mean = segment.iter().sum::<f64>() / n;
        let sxy: f64 = segment
            .iter()
            .enumerate()
            .map(|(i, y)| (i as f64 - x_mean) * (y - y_mean))
            .sum();
        let slope = sxy / sxx;
        let residual: f64 = segment
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let r = y - (y_mean + slope * (i as f64 - x_mean));
                r * r
            })
            .sum();
        total += residual / n;
    }
    Some((total / segments as f64).sqrt())
}
/// Ordinary least squares `y = slope·x + intercept`.
fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| {
            (sxy + (xi - x_mean) * (yi - y_mean), sxx + (xi - x_mean).powi(2))
        });
    let slope = sxy / sxx;
    (slope, y_mean - slope * x_mean)
}
/// Estimates the DFA scaling exponent.
///
/// Invalid scale parameters are rejected before any work is done. Too little data is not
/// an error: the result then carries a NaN alpha.
pub fn estimate(
    samples: &[f64],
    sample_rate_hz: f64,
    min_scale: usize,
    max_scale: usize,
    n_scales: usize,
) -> Result<DfaResult, AnalysisError> {
    if min_scale < MIN_SCALE_FLOOR {
        return Err(AnalysisError::ScaleBelowFloor {
            min_scale,
            floor: MIN_SCALE_FLOOR,
        });
    }
    if min_scale >= max_scale {
        return Err(AnalysisError::InvalidScaleRange { min_scale, max_scale });
    }
    if n_scales < 2 {
        return Err(AnalysisError::TooFewScales(n_scales));
    }
    let mean = if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    };
    let profile: Vec<f64> = samples
        .iter()
        .scan(0.0, |acc, x| {
            *acc += x - mean;
            Some(*acc)
        })
        .collect();
    let mut scales = Vec::with_capacity(n_scales);
    let mut fluctuations = Vec::with_capacity(n_scales);
    for scale in log_scales(min_scale, max_scale, n_scales) {
        match fluctuation(&profile, scale) {
            Some(f) if f.is_finite() && f > 0.0 => {
                scales.push(scale);
                fluctuations.push(f);
            }
            _ => {}
        }
    }
    let (alpha, intercept) = if scales.len() < MIN_FIT_POINTS {
        log::warn!(
            "dfa: only {} usable scales out of {n_scales} for {} samples",
            scales.len(),
            samples.len()
        );
        (f64::NAN, f64::NAN)
    } else {
        let log_s: Vec<f64> = scales.iter().map(|&s| (s as f64).log10()).collect();
        let log_f: Vec<f64> = fluctuations.iter().map(|f| f.log10()).collect();
        linear_fit(&log_s, &log_f)
    };
    let result = DfaResult {
        scales,
        fluctuations,
        alpha,
        intercept,
    };
    if let Some((first, last)) = result.time_range_seconds(sample_rate_hz) {
        log::debug!(
            "dfa: alpha {:.3} over {first:.3}-{last:.3} s ({})",
            result.alpha,
            result.regime().description()
        );
    }
    Ok(result)
}
