use serde::Serialize;
use crate::analysis::band_power::{power_over_time, WindowParams};
use crate::analysis::bands::FrequencyBand;
use crate::signal::TimeSpan;
/// One band's power series, min-max scaled to `[0, 1]` unless it was constant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedBand {
    pub name: String,
    pub values: Vec<f64>,
    pub normalized: bool,
}
/// Several bands over one shared time axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BandComparison {
    pub times: Vec<f64>,
    pub bands: Vec<NormalizedBand>,
}
impl BandComparison {
    pub fn get(&self, name: &str) -> Option<&NormalizedBand> {
        self.bands.iter().find(|b| b.name == name)
    }
}
/// Min-max scales `values` into `[0, 1]`.
///
/// Returns the values unchanged and `false` when they are constant.
pub fn normalize_min_max(values: &[f64]) -> (Vec<f64>, bool) {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if values.is_empty() || hi == lo {
        return (values.to_vec(), false);
    }
    let span = hi - lo;
    (values.iter().map(|v| (v - lo) / span).collect(), true)
}
/// Runs [`power_over_time`] for every band with identical parameters and normalizes each
/// series on its own range. Bands that produce no windows are left out.
pub fn compare(
    channel: &[f64],
    sample_rate_hz: f64,
    bands: &[FrequencyBand],
    params: &WindowParams,
    span: &TimeSpan,
) -> BandComparison {
    let mut comparison = BandComparison::default();
    for band in bands {
        let series = power_over_time(channel, sample_rate_hz, band.low_hz, band.high_hz, params, span);
        if series.is_empty() {
            continue;
        }
        if comparison.times.is_empty() {
            comparison.times = series.times;
        }
        let (values, normalized) = normalize_min_max(&series.powers);
        comparison.bands.push(NormalizedBand {
            name: band.name.clone(),
            values,
            normalized,
        });
    }
    comparison
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::STANDARD_BANDS;
    use crate::signal::synth;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    #[test]
    fn normalized_series_span_unit_interval() {
        let (scaled, normalized) = normalize_min_max(&[3.0, 5.0, 4.0, 7.0]);
        assert!(normalized);
        assert_eq!(scaled, vec![0.0, 0.5, 0.25, 1.0]);
        let flat = [2.5, 2.5, 2.5];
        let (same, normalized) = normalize_min_max(&flat);
        assert!(!normalized);
        assert_eq!(same, flat.to_vec());
    }
    #[test]
    fn compares_all_standard_bands_on_one_axis() {
        let fs = 250.0;
        let mut rng = StdRng::seed_from_u64(5);
        let noise = synth::white_noise(&mut rng, 2500, 10.0);
        let comparison = compare(&noise, fs, &STANDARD_BANDS, &WindowParams::default(), &TimeSpan::full());
        let names: Vec<&str> = comparison.bands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Delta", "Theta", "Alpha", "Beta", "Gamma"]);
        for band in &comparison.bands {
            assert_eq!(band.values.len(), comparison.times.len());
            assert!(band.normalized);
            let lo = band.values.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = band.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(lo.abs() < 1e-12 && (hi - 1.0).abs() < 1e-12);
        }
        let short = compare(&noise[..100], fs, &STANDARD_BANDS, &WindowParams::default(), &TimeSpan::full());
        assert!(short.bands.is_empty() && short.times.is_empty());
    }
}
