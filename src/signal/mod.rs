// Recording model shared by the loaders, the filters and the analysis engine.
pub mod error;
pub mod filter;
pub mod loader;
pub mod synth;
pub use error::SignalError;
pub use filter::{FilterChain, FilterKind};
pub use loader::{load_file, EdfLoader, SignalLoader, TextLoader};
use std::collections::HashSet;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
/// Immutable multichannel recording in microvolts (channels x samples).
#[derive(Clone, Debug)]
pub struct Signal {
    data: Array2<f64>,
    sample_rate_hz: f64,
    channel_names: Vec<String>,
    source: Option<String>,
}
/// Summary of a loaded recording, ready to print.
#[derive(Clone, Debug, Serialize)]
pub struct SignalInfo {
    pub source: Option<String>,
    pub channel_count: usize,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
    pub duration_seconds: f64,
    pub channel_names: Vec<String>,
}
impl Signal {
    pub fn new(
        data: Array2<f64>,
        sample_rate_hz: f64,
        channel_names: Vec<String>,
    ) -> Result<Self, SignalError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(SignalError::InvalidSampleRate);
        }
        if data.nrows() != channel_names.len() {
            return Err(SignalError::ChannelMismatch {
                expected: channel_names.len(),
                actual: data.nrows(),
            });
        }
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(SignalError::Empty);
        }
        let mut seen = HashSet::with_capacity(channel_names.len());
        for name in &channel_names {
            if !seen.insert(name.as_str()) {
                return Err(SignalError::DuplicateChannel(name.clone()));
            }
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self {
            data,
            sample_rate_hz,
            channel_names,
            source: None,
        })
    }
    /// Builds a signal from one vector per channel.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        sample_rate_hz: f64,
        channel_names: Vec<String>,
    ) -> Result<Self, SignalError> {
        let expected = rows.first().map(|r| r.len()).unwrap_or(0);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(SignalError::RaggedChannels {
                    index,
                    expected,
                    actual: row.len(),
                });
            }
        }
        let channel_count = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((channel_count, expected), flat)?;
        Self::new(data, sample_rate_hz, channel_names)
    }
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }
    pub fn channel_count(&self) -> usize {
        self.data.nrows()
    }
    pub fn sample_count(&self) -> usize {
        self.data.ncols()
    }
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate_hz
    }
    /// Samples of one channel, or `None` when `index` is out of range.
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        if index >= self.channel_count() {
            return None;
        }
        self.data.row(index).to_slice()
    }
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names.iter().position(|n| n == name)
    }
    /// Copy of the recording restricted to `span`. `None` when the span selects nothing.
    pub fn window(&self, span: &TimeSpan) -> Option<Signal> {
        let (first, last) = span.sample_bounds(self.sample_rate_hz, self.sample_count())?;
        Some(Signal {
            data: self.data.slice(s![.., first..last]).to_owned(),
            sample_rate_hz: self.sample_rate_hz,
            channel_names: self.channel_names.clone(),
            source: self.source.clone(),
        })
    }
    /// Runs every channel through `chain`. Shape, names and rate are preserved.
    pub fn filtered(&self, chain: &FilterChain) -> Signal {
        let mut data = self.data.clone();
        if !chain.is_empty() {
            for mut row in data.rows_mut() {
                let input = row.to_vec();
                let output = chain.apply(&input);
                row.iter_mut().zip(output).for_each(|(dst, v)| *dst = v);
            }
        }
        Signal {
            data,
            sample_rate_hz: self.sample_rate_hz,
            channel_names: self.channel_names.clone(),
            source: self.source.clone(),
        }
    }
    pub fn info(&self) -> SignalInfo {
        SignalInfo {
            source: self.source.clone(),
            channel_count: self.channel_count(),
            sample_rate_hz: self.sample_rate_hz,
            sample_count: self.sample_count(),
            duration_seconds: self.duration_seconds(),
            channel_names: self.channel_names.clone(),
        }
    }
}
/// Optional `[start, end)` restriction in seconds of recording time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: Option<f64>,
    pub end: Option<f64>,
}
impl TimeSpan {
    pub fn full() -> Self {
        Self::default()
    }
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
    /// Sample bounds `[first, last)` within a recording of `sample_count` samples.
    ///
    /// Returns `None` for a malformed span (negative or non-finite start, end not after
    /// start) or one that selects no samples. An end past the recording is clamped.
    pub fn sample_bounds(&self, sample_rate_hz: f64, sample_count: usize) -> Option<(usize, usize)> {
        let start = self.start.unwrap_or(0.0);
        if !start.is_finite() || start < 0.0 {
            return None;
        }
        let first = (start * sample_rate_hz).floor() as usize;
        let last = match self.end {
            Some(end) => {
                if !end.is_finite() || end <= start {
                    return None;
                }
                ((end * sample_rate_hz).floor() as usize).min(sample_count)
            }
            None => sample_count,
        };
        if first >= last {
            None
        } else {
            Some((first, last))
        }
    }
}
