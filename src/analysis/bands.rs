use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use crate::analysis::AnalysisError;
/// A named frequency interval `[low_hz, high_hz)` with a display color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f64,
    pub high_hz: f64,
    #[serde(default = "default_custom_color")]
    pub color: String,
}
pub const CUSTOM_BAND_COLOR: &str = "#666666";
pub const FALLBACK_BAND: &str = "Alpha";
fn default_custom_color() -> String {
    CUSTOM_BAND_COLOR.to_string()
}
impl FrequencyBand {
    pub fn new(name: impl Into<String>, low_hz: f64, high_hz: f64, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            low_hz,
            high_hz,
            color: color.into(),
        }
    }
    pub fn range(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }
    /// Color as RGB bytes; unparsable colors come back as the custom-band gray.
    pub fn rgb(&self) -> (u8, u8, u8) {
        parse_hex(&self.color).unwrap_or((0x66, 0x66, 0x66))
    }
    fn validate(&self) -> Result<(), AnalysisError> {
        let reason = if self.name.trim().is_empty() {
            Some("name is empty")
        } else if !(self.low_hz.is_finite() && self.high_hz.is_finite()) {
            Some("edges must be finite")
        } else if self.low_hz < 0.0 {
            Some("low edge is negative")
        } else if self.low_hz >= self.high_hz {
            Some("low edge must be below high edge")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(AnalysisError::InvalidBand {
                name: self.name.clone(),
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }
}
fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
/// Delta, Theta, Alpha, Beta and Gamma, in ascending order.
pub static STANDARD_BANDS: Lazy<Vec<FrequencyBand>> = Lazy::new(|| {
    vec![
        FrequencyBand::new("Delta", 0.5, 4.0, "#ff4444"),
        FrequencyBand::new("Theta", 4.0, 8.0, "#44ff44"),
        FrequencyBand::new("Alpha", 8.0, 13.0, "#ff9800"),
        FrequencyBand::new("Beta", 13.0, 30.0, "#8844ff"),
        FrequencyBand::new("Gamma", 30.0, 40.0, "#ff44ff"),
    ]
});
const FALLBACK_INDEX: usize = 2;
/// The standard bands plus any custom ones registered at runtime.
///
/// Names are matched without regard to ASCII case.
#[derive(Clone, Debug)]
pub struct BandRegistry {
    custom: Vec<FrequencyBand>,
}
impl Default for BandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
impl BandRegistry {
    pub fn new() -> Self {
        Self { custom: Vec::new() }
    }
    pub fn with_custom(bands: impl IntoIterator<Item = FrequencyBand>) -> Result<Self, AnalysisError> {
        let mut registry = Self::new();
        for band in bands {
            registry.add_custom(band)?;
        }
        Ok(registry)
    }
    pub fn standard(&self) -> &[FrequencyBand] {
        &STANDARD_BANDS
    }
    pub fn custom(&self) -> &[FrequencyBand] {
        &self.custom
    }
    /// Strict lookup.
    pub fn get(&self, name: &str) -> Option<&FrequencyBand> {
        STANDARD_BANDS
            .iter()
            .chain(self.custom.iter())
            .find(|band| band.name.eq_ignore_ascii_case(name))
    }
    /// Lookup that falls back to Alpha for unknown names.
    pub fn resolve(&self, name: &str) -> &FrequencyBand {
        match self.get(name) {
            Some(band) => band,
            None => {
                log::warn!("unknown band `{name}`, falling back to {FALLBACK_BAND}");
                &STANDARD_BANDS[FALLBACK_INDEX]
            }
        }
    }
    /// Registers a custom band, replacing a custom band of the same name.
    /// Standard bands cannot be redefined.
    pub fn add_custom(&mut self, band: FrequencyBand) -> Result<(), AnalysisError> {
        band.validate()?;
        if STANDARD_BANDS
            .iter()
            .any(|b| b.name.eq_ignore_ascii_case(&band.name))
        {
            return Err(AnalysisError::InvalidBand {
                name: band.name,
                reason: "standard bands cannot be redefined".into(),
            });
        }
        match self
            .custom
            .iter_mut()
            .find(|b| b.name.eq_ignore_ascii_case(&band.name))
        {
            Some(existing) => *existing = band,
            None => self.custom.push(band),
        }
        Ok(())
    }
    /// All band names, sorted.
    pub fn available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = STANDARD_BANDS
            .iter()
            .chain(self.custom.iter())
            .map(|b| b.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn standard_bands_are_contiguous() {
        let bands = BandRegistry::new();
        let std = bands.standard();
        assert_eq!(std.len(), 5);
        for pair in std.windows(2) {
            assert_eq!(pair[0].high_hz, pair[1].low_hz);
        }
        assert_eq!(bands.get("beta").map(|b| b.range()), Some((13.0, 30.0)));
        assert_eq!(std[0].rgb(), (0xff, 0x44, 0x44));
    }
    #[test]
    fn unknown_names_fall_back_to_alpha() {
        let bands = BandRegistry::new();
        assert!(bands.get("Mu").is_none());
        assert_eq!(bands.resolve("Mu").name, "Alpha");
        assert_eq!(bands.resolve("Theta").name, "Theta");
    }
    #[test]
    fn custom_bands_register_and_validate() {
        let mut bands = BandRegistry::new();
        bands
            .add_custom(FrequencyBand::new("Mu", 8.0, 12.0, CUSTOM_BAND_COLOR))
            .unwrap();
        bands
            .add_custom(FrequencyBand::new("mu", 9.0, 11.0, "#123456"))
            .unwrap();
        assert_eq!(bands.custom().len(), 1);
        assert_eq!(bands.resolve("MU").range(), (9.0, 11.0));
        assert!(bands
            .add_custom(FrequencyBand::new("Alpha", 7.0, 12.0, "#000000"))
            .is_err());
        assert!(bands
            .add_custom(FrequencyBand::new("Bad", 12.0, 7.0, "#000000"))
            .is_err());
        assert_eq!(
            bands.available(),
            vec!["Alpha", "Beta", "Delta", "Gamma", "Theta", "mu"]
        );
    }
}
