// Synthetic EEG-like signals for the demo command and for tests.
use std::f64::consts::PI;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use crate::signal::{Signal, SignalError};
/// `amplitude * sin(2π f t)` sampled for `duration_seconds`.
pub fn sine(sample_rate_hz: f64, duration_seconds: f64, freq_hz: f64, amplitude: f64) -> Vec<f64> {
    let n = (sample_rate_hz * duration_seconds).round() as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / sample_rate_hz).sin())
        .collect()
}
/// Gaussian white noise with standard deviation `std_dev`.
pub fn white_noise<R: Rng + ?Sized>(rng: &mut R, n: usize, std_dev: f64) -> Vec<f64> {
    (0..n)
        .map(|_| std_dev * rng.sample::<f64, _>(StandardNormal))
        .collect()
}
/// Cumulative sum of unit Gaussian steps (a random walk, DFA α ≈ 1.5).
pub fn brownian<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    let mut acc = 0.0;
    (0..n)
        .map(|_| {
            acc += rng.sample::<f64, _>(StandardNormal);
            acc
        })
        .collect()
}
/// Four-channel recording with a known structure:
///
/// - `O1`: 10 Hz alpha at 40 µV plus 5 µV noise
/// - `C3`: 20 Hz beta bursts (one second on, one second off) plus noise
/// - `Fz`: slow random walk
/// - `Pz`: 10 µV white noise
pub fn demo_recording(sample_rate_hz: f64, seconds: f64, seed: u64) -> Result<Signal, SignalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (sample_rate_hz * seconds).round() as usize;
    let alpha = sine(sample_rate_hz, seconds, 10.0, 40.0);
    let o1: Vec<f64> = alpha
        .iter()
        .zip(white_noise(&mut rng, n, 5.0))
        .map(|(a, b)| a + b)
        .collect();
    let beta = sine(sample_rate_hz, seconds, 20.0, 25.0);
    let c3: Vec<f64> = beta
        .iter()
        .zip(white_noise(&mut rng, n, 5.0))
        .enumerate()
        .map(|(i, (b, noise))| {
            let on = ((i as f64 / sample_rate_hz) as u64) % 2 == 0;
            if on {
                b + noise
            } else {
                noise
            }
        })
        .collect();
    let fz = brownian(&mut rng, n);
    let pz = white_noise(&mut rng, n, 10.0);
    let names = ["O1", "C3", "Fz", "Pz"].iter().map(|s| s.to_string()).collect();
    Ok(Signal::from_rows(vec![o1, c3, fz, pz], sample_rate_hz, names)?.with_source("demo"))
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn demo_is_reproducible() {
        let a = demo_recording(250.0, 4.0, 7).unwrap();
        let b = demo_recording(250.0, 4.0, 7).unwrap();
        assert_eq!(a.sample_count(), 1000);
        assert_eq!(a.channel_names(), ["O1", "C3", "Fz", "Pz"]);
        assert_eq!(a.channel(2).unwrap(), b.channel(2).unwrap());
    }
    #[test]
    fn white_noise_has_requested_spread() {
        let mut rng = StdRng::seed_from_u64(1);
        let x = white_noise(&mut rng, 20_000, 3.0);
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / x.len() as f64;
        assert!(mean.abs() < 0.1);
        assert!((var.sqrt() - 3.0).abs() < 0.1);
    }
}
