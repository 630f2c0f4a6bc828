use std::f64::consts::PI;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};
use crate::signal::SignalError;
/// Length factor of a Hamming-windowed FIR relative to its transition band.
const HAMMING_LENGTH_FACTOR: f64 = 3.3;
const NOTCH_TRANSITION_HZ: f64 = 1.0;
/// Longest kernel a stage may use.
const MAX_FILTER_TAPS: usize = 1 << 20;
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterKind {
    Bandpass { low_hz: f64, high_hz: f64 },
    Notch { freq_hz: f64 },
}
/// One linear-phase FIR stage, odd length, symmetric taps.
#[derive(Clone, Debug)]
struct FirStage {
    kind: FilterKind,
    taps: Vec<f64>,
}
/// Ordered chain of zero-phase FIR filters applied before analysis.
#[derive(Clone, Debug, Default)]
pub struct FilterChain {
    stages: Vec<FirStage>,
}
impl FilterChain {
    pub fn empty() -> Self {
        Self { stages: vec![] }
    }
    pub fn from_kinds(sample_rate_hz: f64, kinds: &[FilterKind]) -> Result<Self, SignalError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(SignalError::InvalidSampleRate);
        }
        let mut stages = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let taps = design_stage(sample_rate_hz, *kind)?;
            log::debug!("designed {kind:?}: {} taps", taps.len());
            stages.push(FirStage { kind: *kind, taps });
        }
        Ok(Self { stages })
    }
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
    pub fn kinds(&self) -> Vec<FilterKind> {
        self.stages.iter().map(|s| s.kind).collect()
    }
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let mut output = samples.to_vec();
        for stage in &self.stages {
            if stage.taps.len() > output.len() {
                log::warn!(
                    "{:?}: filter length {} exceeds signal length {}, edges will be distorted",
                    stage.kind,
                    stage.taps.len(),
                    output.len()
                );
            }
            output = zero_phase_convolve(&output, &stage.taps);
        }
        output
    }
}
fn design_stage(sample_rate_hz: f64, kind: FilterKind) -> Result<Vec<f64>, SignalError> {
    let nyquist = sample_rate_hz * 0.5;
    match kind {
        FilterKind::Bandpass { low_hz, high_hz } => {
            if !(low_hz.is_finite() && high_hz.is_finite()) || low_hz <= 0.0 {
                return Err(SignalError::InvalidFilter(
                    "low frequency must be positive".into(),
                ));
            }
            if high_hz >= nyquist {
                return Err(SignalError::InvalidFilter(format!(
                    "high frequency must be below Nyquist ({nyquist} Hz)"
                )));
            }
            if low_hz >= high_hz {
                return Err(SignalError::InvalidFilter(
                    "low frequency must be below high frequency".into(),
                ));
            }
            let low_transition = (0.25 * low_hz).max(2.0).min(low_hz);
            let high_transition = (0.25 * high_hz).max(2.0).min(nyquist - high_hz);
            let len = filter_length(sample_rate_hz, low_transition.min(high_transition))?;
            let low_cut = (low_hz - low_transition / 2.0).max(0.0);
            let high_cut = high_hz + high_transition / 2.0;
            Ok(bandpass(len, low_cut, high_cut, sample_rate_hz))
        }
        FilterKind::Notch { freq_hz } => {
            let width = freq_hz / 200.0;
            let low_cut = freq_hz - width / 2.0 - NOTCH_TRANSITION_HZ / 2.0;
            let high_cut = freq_hz + width / 2.0 + NOTCH_TRANSITION_HZ / 2.0;
            if !freq_hz.is_finite() || low_cut <= 0.0 || high_cut >= nyquist {
                return Err(SignalError::InvalidFilter(format!(
                    "notch at {freq_hz} Hz does not fit below Nyquist ({nyquist} Hz)"
                )));
            }
            let len = filter_length(sample_rate_hz, NOTCH_TRANSITION_HZ)?;
            Ok(bandstop(len, low_cut, high_cut, sample_rate_hz))
        }
    }
}
fn filter_length(sample_rate_hz: f64, transition_hz: f64) -> Result<usize, SignalError> {
    let taps = (HAMMING_LENGTH_FACTOR * sample_rate_hz / transition_hz).ceil();
    if !taps.is_finite() || taps > MAX_FILTER_TAPS as f64 {
        return Err(SignalError::InvalidFilter(format!(
            "a {transition_hz} Hz transition at {sample_rate_hz} Hz needs more than {MAX_FILTER_TAPS} taps"
        )));
    }
    let len = (taps as usize).max(3);
    Ok(if len % 2 == 0 { len + 1 } else { len })
}
/// Ideal low-pass impulse response centred at `(len - 1) / 2`.
fn ideal_lowpass(len: usize, cutoff_hz: f64, sample_rate_hz: f64) -> Vec<f64> {
    let fc = cutoff_hz / sample_rate_hz;
    let centre = (len - 1) as f64 / 2.0;
    (0..len)
        .map(|i| {
            let x = i as f64 - centre;
            if x == 0.0 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * x).sin() / (PI * x)
            }
        })
        .collect()
}
fn hamming(len: usize) -> impl Iterator<Item = f64> {
    let denom = (len - 1) as f64;
    (0..len).map(move |i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
}
fn bandpass(len: usize, low_cut: f64, high_cut: f64, sample_rate_hz: f64) -> Vec<f64> {
    let high = ideal_lowpass(len, high_cut, sample_rate_hz);
    let mut taps: Vec<f64> = if low_cut > 0.0 {
        let low = ideal_lowpass(len, low_cut, sample_rate_hz);
        high.iter().zip(&low).map(|(h, l)| h - l).collect()
    } else {
        high
    };
    for (tap, w) in taps.iter_mut().zip(hamming(len)) {
        *tap *= w;
    }
    // Unity gain at the passband centre.
    let centre_hz = (low_cut + high_cut) / 2.0;
    let gain = response_at(&taps, centre_hz, sample_rate_hz);
    if gain.abs() > f64::EPSILON {
        taps.iter_mut().for_each(|t| *t /= gain);
    }
    taps
}
fn bandstop(len: usize, low_cut: f64, high_cut: f64, sample_rate_hz: f64) -> Vec<f64> {
    let low = ideal_lowpass(len, low_cut, sample_rate_hz);
    let high = ideal_lowpass(len, high_cut, sample_rate_hz);
    let centre = (len - 1) / 2;
    let mut taps: Vec<f64> = low
        .iter()
        .zip(&high)
        .enumerate()
        .map(|(i, (l, h))| {
            let delta = if i == centre { 1.0 } else { 0.0 };
            delta + l - h
        })
        .collect();
    for (tap, w) in taps.iter_mut().zip(hamming(len)) {
        *tap *= w;
    }
    let dc_gain: f64 = taps.iter().sum();
    if dc_gain.abs() > f64::EPSILON {
        taps.iter_mut().for_each(|t| *t /= dc_gain);
    }
    taps
}
/// Magnitude of a symmetric FIR at `freq_hz`.
fn response_at(taps: &[f64], freq_hz: f64, sample_rate_hz: f64) -> f64 {
    let centre = (taps.len() - 1) as f64 / 2.0;
    let w = 2.0 * PI * freq_hz / sample_rate_hz;
    taps.iter()
        .enumerate()
        .map(|(i, t)| t * (w * (i as f64 - centre)).cos())
        .sum()
}
/// Reflection padding that stops at the signal edges and continues with zeros.
fn reflect_pad(samples: &[f64], pad: usize) -> Vec<f64> {
    let n = samples.len();
    let mirror = |k: usize, from_end: bool| -> f64 {
        if k >= n {
            0.0
        } else if from_end {
            samples[n - 1 - k]
        } else {
            samples[k]
        }
    };
    let mut padded = Vec::with_capacity(n + 2 * pad);
    padded.extend((1..=pad).rev().map(|k| mirror(k, false)));
    padded.extend_from_slice(samples);
    padded.extend((1..=pad).map(|k| mirror(k, true)));
    padded
}
/// Convolves with a symmetric kernel and re-centres the output, so no phase shift remains.
fn zero_phase_convolve(samples: &[f64], taps: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n == 0 || taps.is_empty() {
        return samples.to_vec();
    }
    let half = taps.len() / 2;
    let padded = reflect_pad(samples, half);
    let fft_len = (padded.len() + taps.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);
    let to_buffer = |values: &[f64]| -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        buffer.resize(fft_len, Complex64::new(0.0, 0.0));
        buffer
    };
    let mut signal = to_buffer(&padded);
    let mut kernel = to_buffer(taps);
    forward.process(&mut signal);
    forward.process(&mut kernel);
    for (s, k) in signal.iter_mut().zip(&kernel) {
        *s *= *k;
    }
    inverse.process(&mut signal);
    let scale = 1.0 / fft_len as f64;
    (0..n).map(|i| signal[i + 2 * half].re * scale).collect()
}
