use serde::{Deserialize, Serialize};
use crate::analysis::bands::FrequencyBand;
use crate::analysis::spectrum::{estimate_psd, periodogram, Psd};
use crate::signal::TimeSpan;
pub const DEFAULT_SEGMENT_LENGTH: usize = 512;
pub const DEFAULT_TOTAL_RANGE: (f64, f64) = (0.5, 40.0);
pub const DOMINANT_SEARCH_RANGE: (f64, f64) = (1.0, 40.0);
/// Display spectrum limits (Hz).
pub const DISPLAY_RANGE: (f64, f64) = (0.1, 40.0);
/// How the PSD behind a band power is estimated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PsdMethod {
    Welch { segment_length: usize },
    Periodogram,
}
impl Default for PsdMethod {
    fn default() -> Self {
        PsdMethod::Welch {
            segment_length: DEFAULT_SEGMENT_LENGTH,
        }
    }
}
impl PsdMethod {
    pub fn estimate(&self, samples: &[f64], sample_rate_hz: f64) -> Psd {
        match *self {
            PsdMethod::Welch { segment_length } => estimate_psd(samples, sample_rate_hz, segment_length),
            PsdMethod::Periodogram => periodogram(samples, sample_rate_hz),
        }
    }
}
/// Sliding-window parameters for [`power_over_time`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub window_seconds: f64,
    pub step_seconds: f64,
    pub method: PsdMethod,
}
impl Default for WindowParams {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            step_seconds: 0.5,
            method: PsdMethod::default(),
        }
    }
}
/// Band power sampled at window midpoints. `times` and `powers` run in parallel.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PowerSeries {
    pub times: Vec<f64>,
    pub powers: Vec<f64>,
}
impl PowerSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.powers.iter().copied())
    }
}
fn trapezoid(points: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut area = 0.0;
    let mut previous: Option<(f64, f64)> = None;
    for (f, p) in points {
        if let Some((f0, p0)) = previous {
            area += 0.5 * (p + p0) * (f - f0);
        }
        previous = Some((f, p));
    }
    area
}
/// Integrates an already estimated PSD over `[low_hz, high_hz]`.
pub fn integrate_band(psd: &Psd, low_hz: f64, high_hz: f64) -> f64 {
    if !(low_hz.is_finite() && high_hz.is_finite()) || low_hz >= high_hz {
        return 0.0;
    }
    trapezoid(psd.bins_within(low_hz, high_hz)).max(0.0)
}
/// Power in `[low_hz, high_hz]`. Degenerate input yields 0.0, never an error.
pub fn band_power(samples: &[f64], sample_rate_hz: f64, low_hz: f64, high_hz: f64, method: PsdMethod) -> f64 {
    if !(low_hz.is_finite() && high_hz.is_finite()) || low_hz >= high_hz {
        return 0.0;
    }
    let psd = method.estimate(samples, sample_rate_hz);
    integrate_band(&psd, low_hz, high_hz)
}
/// Fraction of the power in `total_range` that falls inside the band.
pub fn relative_band_power(
    samples: &[f64],
    sample_rate_hz: f64,
    low_hz: f64,
    high_hz: f64,
    total_range: (f64, f64),
    method: PsdMethod,
) -> f64 {
    let psd = method.estimate(samples, sample_rate_hz);
    let total = integrate_band(&psd, total_range.0, total_range.1);
    if total <= 0.0 {
        return 0.0;
    }
    integrate_band(&psd, low_hz, high_hz) / total
}
/// Scalar power for each band, in the order given.
pub fn band_powers(
    samples: &[f64],
    sample_rate_hz: f64,
    bands: &[FrequencyBand],
    method: PsdMethod,
) -> Vec<(String, f64)> {
    let psd = method.estimate(samples, sample_rate_hz);
    bands
        .iter()
        .map(|band| (band.name.clone(), integrate_band(&psd, band.low_hz, band.high_hz)))
        .collect()
}
/// Frequency of the PSD peak within `range`, or 0.0 when nothing falls inside it.
pub fn dominant_frequency(samples: &[f64], sample_rate_hz: f64, range: (f64, f64), method: PsdMethod) -> f64 {
    let psd = method.estimate(samples, sample_rate_hz);
    psd.bins_within(range.0, range.1)
        .fold(None, |best: Option<(f64, f64)>, (f, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((f, p)),
        })
        .map(|(f, _)| f)
        .unwrap_or(0.0)
}
/// PSD for display, limited to 0.1–40 Hz.
///
/// Welch segments are `min(n/4, 4·fs)` samples so short excerpts still average a few segments.
pub fn display_spectrum(samples: &[f64], sample_rate_hz: f64, method: PsdMethod) -> Psd {
    let psd = match method {
        PsdMethod::Welch { .. } => {
            let segment = (samples.len() / 4).min((4.0 * sample_rate_hz) as usize).max(2);
            estimate_psd(samples, sample_rate_hz, segment)
        }
        PsdMethod::Periodogram => periodogram(samples, sample_rate_hz),
    };
    psd.restricted(DISPLAY_RANGE.0, DISPLAY_RANGE.1)
}
/// Band power over sliding windows of `channel`.
///
/// `span` restricts the analysed part of the channel; reported times stay in absolute
/// recording seconds. Only complete windows are evaluated. A window of one sample or
/// less, a zero step or an unusable span gives an empty series.
pub fn power_over_time(
    channel: &[f64],
    sample_rate_hz: f64,
    low_hz: f64,
    high_hz: f64,
    params: &WindowParams,
    span: &TimeSpan,
) -> PowerSeries {
    let Some((offset, end)) = span.sample_bounds(sample_rate_hz, channel.len()) else {
        return PowerSeries::default();
    };
    let data = &channel[offset..end];
    let window = (params.window_seconds * sample_rate_hz).floor();
    let step = (params.step_seconds * sample_rate_hz).floor();
    if !(window > 1.0 && step >= 1.0) {
        log::debug!(
            "power_over_time: window {} s / step {} s too short at {} Hz",
            params.window_seconds,
            params.step_seconds,
            sample_rate_hz
        );
        return PowerSeries::default();
    }
    let (window, step) = (window as usize, step as usize);
    if data.len() < window {
        return PowerSeries::default();
    }
    let mut series = PowerSeries::default();
    for start in (0..=data.len() - window).step_by(step) {
        let power = band_power(&data[start..start + window], sample_rate_hz, low_hz, high_hz, params.method);
        series
            .times
            .push((offset + start + window / 2) as f64 / sample_rate_hz);
        series.powers.push(power);
    }
    series
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stats::PowerStatistics;
    use crate::signal::synth;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    const FS: f64 = 500.0;
    #[test]
    fn band_power_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = synth::white_noise(&mut rng, 5000, 20.0);
        let sine = synth::sine(FS, 10.0, 6.0, 30.0);
        for signal in [&noise, &sine] {
            for (low, high) in [(0.5, 4.0), (4.0, 8.0), (8.0, 13.0), (13.0, 30.0), (30.0, 40.0), (100.0, 240.0)] {
                for method in [PsdMethod::default(), PsdMethod::Periodogram] {
                    assert!(band_power(signal, FS, low, high, method) >= 0.0);
                }
            }
        }
        assert_eq!(band_power(&noise, FS, 13.0, 8.0, PsdMethod::default()), 0.0);
        assert_eq!(band_power(&[], FS, 8.0, 13.0, PsdMethod::default()), 0.0);
        assert_eq!(band_power(&noise, FS, 300.0, 400.0, PsdMethod::default()), 0.0);
    }
    #[test]
    fn relative_power_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = synth::white_noise(&mut rng, 4000, 5.0);
        for (low, high) in [(0.5, 4.0), (8.0, 13.0), (30.0, 40.0), (0.5, 40.0)] {
            let rel = relative_band_power(&noise, FS, low, high, DEFAULT_TOTAL_RANGE, PsdMethod::default());
            assert!(rel >= 0.0 && rel <= 1.0 + 1e-6, "{low}-{high}: {rel}");
        }
        let flat = vec![3.0; 2000];
        assert_eq!(
            relative_band_power(&flat, FS, 8.0, 13.0, DEFAULT_TOTAL_RANGE, PsdMethod::default()),
            0.0
        );
    }
    #[test]
    fn alpha_sine_dominates_and_is_stable_over_time() {
        let x = synth::sine(FS, 10.0, 10.0, 50.0);
        let method = PsdMethod::default();
        let alpha = band_power(&x, FS, 8.0, 13.0, method);
        let total = band_power(&x, FS, 0.5, 40.0, method);
        assert!(alpha / total > 0.9, "alpha share {}", alpha / total);
        let series = power_over_time(&x, FS, 8.0, 13.0, &WindowParams::default(), &TimeSpan::full());
        assert_eq!(series.len(), 17);
        assert!((series.times[0] - 1.0).abs() < 1e-12);
        let stats = PowerStatistics::from_series(&series);
        assert!(stats.coefficient_of_variation < 0.05);
        assert!((dominant_frequency(&x, FS, DOMINANT_SEARCH_RANGE, method) - 10.0).abs() < 1.0);
    }
    #[test]
    fn windows_keep_absolute_time_and_drop_partials() {
        let x = synth::sine(FS, 10.0, 10.0, 50.0);
        let params = WindowParams::default();
        let series = power_over_time(&x, FS, 8.0, 13.0, &params, &TimeSpan::new(3.0, 7.2));
        // 4.2 s of data: windows start at 3.0, 3.5, ... 5.0; 5.5 would overrun.
        assert_eq!(series.len(), 5);
        assert!((series.times[0] - 4.0).abs() < 1e-12);
        assert!(series.times.windows(2).all(|w| w[1] > w[0]));
        let short = WindowParams {
            window_seconds: 0.001,
            ..params
        };
        assert!(power_over_time(&x, FS, 8.0, 13.0, &short, &TimeSpan::full()).is_empty());
        let no_step = WindowParams {
            step_seconds: 0.0,
            ..params
        };
        assert!(power_over_time(&x, FS, 8.0, 13.0, &no_step, &TimeSpan::full()).is_empty());
        assert!(power_over_time(&x, FS, 8.0, 13.0, &params, &TimeSpan::new(6.0, 2.0)).is_empty());
    }
    #[test]
    fn display_spectrum_is_clipped() {
        let x = synth::sine(FS, 8.0, 12.0, 10.0);
        let psd = display_spectrum(&x, FS, PsdMethod::default());
        assert!(!psd.is_empty());
        assert!(psd.frequencies_hz.iter().all(|&f| (0.1..=40.0).contains(&f)));
        let powers = band_powers(&x, FS, &crate::analysis::STANDARD_BANDS, PsdMethod::default());
        assert_eq!(powers.len(), 5);
        assert_eq!(powers[2].0, "Alpha");
        assert!(powers.iter().all(|(name, p)| name == "Alpha" || *p < powers[2].1));
    }
}
