use serde::Serialize;
use crate::analysis::band_power::PowerSeries;
use crate::analysis::stats::mean_std;
pub const DEFAULT_THRESHOLD_SIGMA: f64 = 2.0;
pub const DEFAULT_MIN_SEPARATION_SECONDS: f64 = 0.5;
/// A window whose band power rose above the adaptive threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpikeEvent {
    pub time_seconds: f64,
    pub power: f64,
}
/// `mean + sigma * std` of the series powers, or `None` for an empty series.
pub fn adaptive_threshold(series: &PowerSeries, threshold_sigma: f64) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let (mean, std) = mean_std(&series.powers);
    Some(mean + threshold_sigma * std)
}
/// Flags windows whose power is strictly above the adaptive threshold, then keeps only
/// the first event of every burst.
pub fn detect(series: &PowerSeries, threshold_sigma: f64, min_separation_seconds: f64) -> Vec<SpikeEvent> {
    let Some(threshold) = adaptive_threshold(series, threshold_sigma) else {
        return Vec::new();
    };
    let candidates = series
        .iter()
        .filter(|&(_, power)| power > threshold)
        .map(|(time_seconds, power)| SpikeEvent { time_seconds, power });
    let events = coalesce(candidates, min_separation_seconds);
    log::debug!(
        "spike detection: threshold {threshold:.4}, {} events from {} windows",
        events.len(),
        series.len()
    );
    events
}
/// Drops every event closer than `min_separation_seconds` to the last kept one.
/// Input must be ordered by time.
pub fn coalesce(events: impl IntoIterator<Item = SpikeEvent>, min_separation_seconds: f64) -> Vec<SpikeEvent> {
    let mut kept: Vec<SpikeEvent> = Vec::new();
    for event in events {
        match kept.last() {
            Some(last) if event.time_seconds - last.time_seconds < min_separation_seconds => {}
            _ => kept.push(event),
        }
    }
    kept
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    fn noisy_series(seed: u64, n: usize) -> PowerSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let times = (0..n).map(|i| 1.0 + 0.25 * i as f64).collect();
        let powers = (0..n)
            .map(|_| {
                let base: f64 = rng.gen_range(0.5..1.5);
                if rng.gen_bool(0.05) {
                    base * 8.0
                } else {
                    base
                }
            })
            .collect();
        PowerSeries { times, powers }
    }
    #[test]
    fn higher_sigma_never_finds_more_spikes() {
        for seed in 0..5 {
            let series = noisy_series(seed, 400);
            let mut previous = usize::MAX;
            for step in 0..=20 {
                let sigma = -1.0 + 0.3 * step as f64;
                let count = detect(&series, sigma, DEFAULT_MIN_SEPARATION_SECONDS).len();
                assert!(count <= previous, "seed {seed}, sigma {sigma}");
                previous = count;
            }
        }
    }
    #[test]
    fn coalescing_is_idempotent() {
        let series = noisy_series(42, 400);
        let events = detect(&series, 0.0, 1.0);
        assert!(!events.is_empty());
        assert!(events
            .windows(2)
            .all(|w| w[1].time_seconds - w[0].time_seconds >= 1.0));
        assert_eq!(coalesce(events.clone(), 1.0), events);
        // Detecting again on the merged events keeps every one of them.
        let merged = PowerSeries {
            times: events.iter().map(|e| e.time_seconds).collect(),
            powers: events.iter().map(|e| e.power).collect(),
        };
        assert_eq!(detect(&merged, -100.0, 1.0), events);
    }
    #[test]
    fn bursts_collapse_to_their_first_window() {
        let series = PowerSeries {
            times: vec![0.0, 0.1, 0.2, 0.3, 1.0, 1.1, 2.0],
            powers: vec![1.0, 9.0, 9.5, 9.0, 1.0, 8.0, 1.0],
        };
        let events = detect(&series, 0.5, 0.5);
        let times: Vec<f64> = events.iter().map(|e| e.time_seconds).collect();
        assert_eq!(times, vec![0.1, 1.1]);
        assert_eq!(events[0].power, 9.0);
        assert!(detect(&PowerSeries::default(), 2.0, 0.5).is_empty());
    }
}
