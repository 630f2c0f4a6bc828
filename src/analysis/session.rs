use std::sync::Arc;
use crate::analysis::band_power::{self, PowerSeries, DOMINANT_SEARCH_RANGE};
use crate::analysis::bands::BandRegistry;
use crate::analysis::compare::{self, BandComparison};
use crate::analysis::dfa::{self, DfaResult};
use crate::analysis::spectrum::Psd;
use crate::analysis::spikes::{self, SpikeEvent};
use crate::analysis::stats::{self, PowerStatistics, SummaryStats};
use crate::analysis::AnalysisError;
use crate::config::{AnalysisSettings, DfaSettings};
use crate::signal::{Signal, TimeSpan};
/// Spikes found in one band together with the series and threshold they came from.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SpikeReport {
    pub band: String,
    pub threshold: Option<f64>,
    pub series: PowerSeries,
    pub events: Vec<SpikeEvent>,
}
/// Binds a loaded recording to a band registry and settings.
///
/// Holds no selection state: every call names its channel, band and time range.
#[derive(Clone, Debug)]
pub struct AnalysisSession {
    signal: Arc<Signal>,
    bands: BandRegistry,
    settings: AnalysisSettings,
}
impl AnalysisSession {
    pub fn new(signal: Arc<Signal>, bands: BandRegistry, settings: AnalysisSettings) -> Self {
        Self {
            signal,
            bands,
            settings,
        }
    }
    pub fn signal(&self) -> &Arc<Signal> {
        &self.signal
    }
    pub fn bands(&self) -> &BandRegistry {
        &self.bands
    }
    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }
    fn channel(&self, index: usize) -> Result<&[f64], AnalysisError> {
        self.signal
            .channel(index)
            .ok_or(AnalysisError::ChannelOutOfRange {
                index,
                count: self.signal.channel_count(),
            })
    }
    /// Channel samples inside `span`; empty when the span selects nothing.
    fn excerpt(&self, index: usize, span: &TimeSpan) -> Result<&[f64], AnalysisError> {
        let channel = self.channel(index)?;
        Ok(match span.sample_bounds(self.signal.sample_rate_hz(), channel.len()) {
            Some((first, last)) => &channel[first..last],
            None => &[],
        })
    }
    pub fn power_over_time(&self, channel: usize, band: &str, span: &TimeSpan) -> Result<PowerSeries, AnalysisError> {
        let samples = self.channel(channel)?;
        let band = self.bands.resolve(band);
        Ok(band_power::power_over_time(
            samples,
            self.signal.sample_rate_hz(),
            band.low_hz,
            band.high_hz,
            &self.settings.window_params(),
            span,
        ))
    }
    /// Power series for `band` and the events above `sigma` standard deviations.
    pub fn detect_spikes(
        &self,
        channel: usize,
        band: &str,
        span: &TimeSpan,
        sigma: f64,
    ) -> Result<SpikeReport, AnalysisError> {
        let series = self.power_over_time(channel, band, span)?;
        let events = spikes::detect(&series, sigma, self.settings.spike_min_separation_seconds);
        Ok(SpikeReport {
            band: self.bands.resolve(band).name.clone(),
            threshold: spikes::adaptive_threshold(&series, sigma),
            series,
            events,
        })
    }
    /// Compares the standard bands.
    pub fn compare_bands(&self, channel: usize, span: &TimeSpan) -> Result<BandComparison, AnalysisError> {
        let samples = self.channel(channel)?;
        Ok(compare::compare(
            samples,
            self.signal.sample_rate_hz(),
            self.bands.standard(),
            &self.settings.window_params(),
            span,
        ))
    }
    /// DFA over the selected stretch of a channel.
    ///
    /// `max_scale` is lowered to a quarter of the excerpt length when that still leaves
    /// it above `min_scale`.
    pub fn dfa(&self, channel: usize, span: &TimeSpan, params: &DfaSettings) -> Result<DfaResult, AnalysisError> {
        let samples = self.excerpt(channel, span)?;
        let quarter = samples.len() / 4;
        let max_scale = if params.max_scale > quarter && quarter > params.min_scale {
            log::info!("dfa: max_scale {} clamped to {quarter}", params.max_scale);
            quarter
        } else {
            params.max_scale
        };
        dfa::estimate(
            samples,
            self.signal.sample_rate_hz(),
            params.min_scale,
            max_scale,
            params.n_scales,
        )
    }
    /// Scalar power for every registered band, standard bands first.
    pub fn band_powers(&self, channel: usize, span: &TimeSpan) -> Result<Vec<(String, f64)>, AnalysisError> {
        let samples = self.excerpt(channel, span)?;
        let bands: Vec<_> = self
            .bands
            .standard()
            .iter()
            .chain(self.bands.custom())
            .cloned()
            .collect();
        Ok(band_power::band_powers(
            samples,
            self.signal.sample_rate_hz(),
            &bands,
            self.settings.psd_method,
        ))
    }
    pub fn relative_band_power(&self, channel: usize, band: &str, span: &TimeSpan) -> Result<f64, AnalysisError> {
        let samples = self.excerpt(channel, span)?;
        let band = self.bands.resolve(band);
        Ok(band_power::relative_band_power(
            samples,
            self.signal.sample_rate_hz(),
            band.low_hz,
            band.high_hz,
            self.settings.total_range,
            self.settings.psd_method,
        ))
    }
    pub fn spectrum(&self, channel: usize, span: &TimeSpan) -> Result<Psd, AnalysisError> {
        let samples = self.excerpt(channel, span)?;
        Ok(band_power::display_spectrum(
            samples,
            self.signal.sample_rate_hz(),
            self.settings.psd_method,
        ))
    }
    pub fn dominant_frequency(&self, channel: usize, span: &TimeSpan) -> Result<f64, AnalysisError> {
        let samples = self.excerpt(channel, span)?;
        Ok(band_power::dominant_frequency(
            samples,
            self.signal.sample_rate_hz(),
            DOMINANT_SEARCH_RANGE,
            self.settings.psd_method,
        ))
    }
    pub fn channel_stats(&self, channel: usize, span: &TimeSpan) -> Result<SummaryStats, AnalysisError> {
        Ok(stats::summarize(self.excerpt(channel, span)?))
    }
    pub fn power_statistics(&self, channel: usize, band: &str, span: &TimeSpan) -> Result<PowerStatistics, AnalysisError> {
        let series = self.power_over_time(channel, band, span)?;
        Ok(PowerStatistics::from_series(&series))
    }
}
