//! EEG band-power, spike and DFA analysis.
//!
//! A [`signal::Signal`] is loaded from EDF or delimited text, optionally filtered, and
//! handed to an [`analysis::AnalysisSession`]. Long analyses can run on the background
//! worker in [`engine`].
pub mod analysis;
pub mod config;
pub mod engine;
pub mod signal;
pub mod types;
pub use analysis::{AnalysisError, AnalysisSession};
pub use config::AnalysisSettings;
pub use signal::{Signal, SignalError, TimeSpan};
