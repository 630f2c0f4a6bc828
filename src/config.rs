// 分析参数：JSON 文件中缺失的键使用默认值
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::analysis::band_power::{PsdMethod, WindowParams, DEFAULT_TOTAL_RANGE};
use crate::analysis::bands::{BandRegistry, FrequencyBand};
use crate::analysis::spikes::{DEFAULT_MIN_SEPARATION_SECONDS, DEFAULT_THRESHOLD_SIGMA};
use crate::analysis::AnalysisError;
use crate::signal::{FilterChain, FilterKind, SignalError};
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid custom band: {0}")]
    Band(#[from] AnalysisError),
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfaSettings {
    pub min_scale: usize,
    pub max_scale: usize,
    pub n_scales: usize,
}
impl Default for DfaSettings {
    fn default() -> Self {
        Self {
            min_scale: 4,
            max_scale: 1000,
            n_scales: 20,
        }
    }
}
/// Pre-processing applied to a recording before analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub enabled: bool,
    pub low_hz: f64,
    pub high_hz: f64,
    /// Mains frequency; `null` disables the notch.
    pub notch_hz: Option<f64>,
}
impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            low_hz: 0.1,
            high_hz: 40.0,
            notch_hz: Some(50.0),
        }
    }
}
impl FilterSettings {
    pub fn kinds(&self) -> Vec<FilterKind> {
        if !self.enabled {
            return Vec::new();
        }
        let mut kinds = vec![FilterKind::Bandpass {
            low_hz: self.low_hz,
            high_hz: self.high_hz,
        }];
        if let Some(freq_hz) = self.notch_hz {
            kinds.push(FilterKind::Notch { freq_hz });
        }
        kinds
    }
    pub fn chain(&self, sample_rate_hz: f64) -> Result<FilterChain, SignalError> {
        FilterChain::from_kinds(sample_rate_hz, &self.kinds())
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub window_seconds: f64,
    pub step_seconds: f64,
    pub psd_method: PsdMethod,
    pub total_range: (f64, f64),
    pub spike_sigma: f64,
    pub spike_min_separation_seconds: f64,
    pub dfa: DfaSettings,
    pub filter: FilterSettings,
    /// Longest stretch fed to a background analysis when no time range is given.
    pub max_analysis_seconds: f64,
    pub default_band: String,
    pub custom_bands: Vec<FrequencyBand>,
}
impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            step_seconds: 0.5,
            psd_method: PsdMethod::default(),
            total_range: DEFAULT_TOTAL_RANGE,
            spike_sigma: DEFAULT_THRESHOLD_SIGMA,
            spike_min_separation_seconds: DEFAULT_MIN_SEPARATION_SECONDS,
            dfa: DfaSettings::default(),
            filter: FilterSettings::default(),
            max_analysis_seconds: 300.0,
            default_band: "Alpha".to_string(),
            custom_bands: Vec::new(),
        }
    }
}
impl AnalysisSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded analysis settings from {}", path.display());
        Ok(settings)
    }
    /// Defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            window_seconds: self.window_seconds,
            step_seconds: self.step_seconds,
            method: self.psd_method,
        }
    }
    pub fn band_registry(&self) -> Result<BandRegistry, ConfigError> {
        Ok(BandRegistry::with_custom(self.custom_bands.iter().cloned())?)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeg_settings.json");
        fs::write(
            &path,
            r##"{
                "window_seconds": 4.0,
                "psd_method": { "kind": "periodogram" },
                "dfa": { "max_scale": 200 },
                "filter": { "notch_hz": 60.0 },
                "custom_bands": [{ "name": "Mu", "low_hz": 8.0, "high_hz": 12.0 }]
            }"##,
        )
        .unwrap();
        let settings = AnalysisSettings::load(&path).unwrap();
        assert_eq!(settings.window_seconds, 4.0);
        assert_eq!(settings.step_seconds, 0.5);
        assert_eq!(settings.psd_method, PsdMethod::Periodogram);
        assert_eq!(settings.dfa, DfaSettings { max_scale: 200, ..DfaSettings::default() });
        assert_eq!(settings.filter.notch_hz, Some(60.0));
        assert_eq!(settings.filter.low_hz, 0.1);
        let registry = settings.band_registry().unwrap();
        assert_eq!(registry.resolve("Mu").color, "#666666");
    }
    #[test]
    fn reports_unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            AnalysisSettings::load(&missing),
            Err(ConfigError::Read { .. })
        ));
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ window_seconds: ").unwrap();
        assert!(matches!(
            AnalysisSettings::load(&broken),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(
            AnalysisSettings::load_or_default(None).unwrap(),
            AnalysisSettings::default()
        );
    }
    #[test]
    fn filter_settings_build_the_default_chain() {
        let settings = FilterSettings::default();
        assert_eq!(
            settings.kinds(),
            vec![
                FilterKind::Bandpass { low_hz: 0.1, high_hz: 40.0 },
                FilterKind::Notch { freq_hz: 50.0 },
            ]
        );
        let disabled = FilterSettings {
            enabled: false,
            ..FilterSettings::default()
        };
        assert!(disabled.chain(250.0).unwrap().is_empty());
    }
}
