use std::f64::consts::PI;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;
/// One-sided power spectral density.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Psd {
    pub frequencies_hz: Vec<f64>,
    pub density: Vec<f64>, // units² / Hz
}
impl Psd {
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }
    /// Bins whose frequency lies in `[low_hz, high_hz]`, both edges included.
    pub fn bins_within(&self, low_hz: f64, high_hz: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies_hz
            .iter()
            .copied()
            .zip(self.density.iter().copied())
            .filter(move |(f, _)| *f >= low_hz && *f <= high_hz)
    }
    /// Keeps only the bins within `[low_hz, high_hz]`.
    pub fn restricted(&self, low_hz: f64, high_hz: f64) -> Psd {
        let (frequencies_hz, density) = self.bins_within(low_hz, high_hz).unzip();
        Psd {
            frequencies_hz,
            density,
        }
    }
}
/// Periodic Hann window, matching `scipy.signal.get_window("hann", n)`.
fn hann(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}
/// Welch's averaged periodogram.
///
/// Segments of `min(segment_length, n)` samples overlap by half, are mean-removed and
/// Hann-windowed. Fewer than two samples, or a zero segment length, give an empty PSD.
pub fn estimate_psd(samples: &[f64], sample_rate_hz: f64, segment_length: usize) -> Psd {
    if samples.len() < 2 {
        return Psd::default();
    }
    if segment_length == 0 {
        log::warn!("welch: segment length must be positive, returning an empty spectrum");
        return Psd::default();
    }
    let nperseg = segment_length.min(samples.len());
    let hop = nperseg - nperseg / 2;
    let starts = (0..=samples.len() - nperseg).step_by(hop);
    averaged_density(samples, sample_rate_hz, &hann(nperseg), starts)
}
/// Single-segment periodogram with a boxcar window over the whole input.
pub fn periodogram(samples: &[f64], sample_rate_hz: f64) -> Psd {
    if samples.len() < 2 {
        return Psd::default();
    }
    let window = vec![1.0; samples.len()];
    averaged_density(samples, sample_rate_hz, &window, std::iter::once(0))
}
fn averaged_density(
    samples: &[f64],
    sample_rate_hz: f64,
    window: &[f64],
    starts: impl Iterator<Item = usize>,
) -> Psd {
    let nperseg = window.len();
    let bins = nperseg / 2 + 1;
    let scale = 1.0 / (sample_rate_hz * window.iter().map(|w| w * w).sum::<f64>());
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut density = vec![0.0; bins];
    let mut buffer = vec![Complex64::new(0.0, 0.0); nperseg];
    let mut segments = 0usize;
    for start in starts {
        let segment = &samples[start..start + nperseg];
        let mean = segment.iter().sum::<f64>() / nperseg as f64;
        for ((slot, x), w) in buffer.iter_mut().zip(segment).zip(window) {
            *slot = Complex64::new((x - mean) * w, 0.0);
        }
        fft.process(&mut buffer);
        for (acc, c) in density.iter_mut().zip(&buffer) {
            *acc += c.norm_sqr() * scale;
        }
        segments += 1;
    }
    if segments == 0 {
        return Psd::default();
    }
    let nyquist_bin = (nperseg % 2 == 0).then_some(nperseg / 2);
    for (k, value) in density.iter_mut().enumerate() {
        *value /= segments as f64;
        if k != 0 && Some(k) != nyquist_bin {
            *value *= 2.0;
        }
    }
    let frequencies_hz = (0..bins)
        .map(|k| k as f64 * sample_rate_hz / nperseg as f64)
        .collect();
    Psd {
        frequencies_hz,
        density,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::synth;
    #[test]
    fn welch_layout_and_degenerate_inputs() {
        let x = synth::sine(256.0, 4.0, 16.0, 1.0);
        let psd = estimate_psd(&x, 256.0, 256);
        assert_eq!(psd.len(), 129);
        assert_eq!(psd.frequencies_hz[1], 1.0);
        assert_eq!(psd.frequencies_hz[128], 128.0);
        assert!(estimate_psd(&[1.0], 256.0, 256).is_empty());
        assert!(estimate_psd(&x, 256.0, 0).is_empty());
        // Segment length is clamped to the input.
        assert_eq!(estimate_psd(&x[..100], 256.0, 512).len(), 51);
    }
    #[test]
    fn welch_peak_and_parseval() {
        let fs = 256.0;
        let x = synth::sine(fs, 8.0, 16.0, 2.0);
        let psd = estimate_psd(&x, fs, 256);
        let (peak_idx, _) = psd
            .density
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(psd.frequencies_hz[peak_idx], 16.0);
        // Total power equals the signal variance (A²/2 for a sine).
        let df = psd.frequencies_hz[1];
        let total: f64 = psd.density.iter().sum::<f64>() * df;
        assert!((total - 2.0).abs() < 0.05, "total = {total}");
    }
    #[test]
    fn periodogram_matches_variance() {
        let fs = 100.0;
        let x = synth::sine(fs, 2.0, 10.0, 3.0);
        let psd = periodogram(&x, fs);
        assert_eq!(psd.len(), 101);
        let df = psd.frequencies_hz[1];
        let total: f64 = psd.density.iter().sum::<f64>() * df;
        assert!((total - 4.5).abs() < 1e-6, "total = {total}");
        let restricted = psd.restricted(9.0, 11.0);
        assert_eq!(restricted.frequencies_hz, vec![9.0, 9.5, 10.0, 10.5, 11.0]);
    }
}
