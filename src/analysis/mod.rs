// src/analysis/mod.rs
// 分析引擎：功率谱、频段功率、尖峰检测、频段对比与 DFA
pub mod band_power;
pub mod bands;
pub mod compare;
pub mod dfa;
pub mod error;
pub mod plot;
pub mod session;
pub mod spectrum;
pub mod spikes;
pub mod stats;
// 公开导出常用类型，方便外部调用
pub use band_power::{
    band_power, band_powers, display_spectrum, dominant_frequency, power_over_time,
    relative_band_power, PowerSeries, PsdMethod, WindowParams,
};
pub use bands::{BandRegistry, FrequencyBand, STANDARD_BANDS};
pub use compare::{compare, BandComparison, NormalizedBand};
pub use dfa::{DfaRegime, DfaResult};
pub use error::AnalysisError;
pub use plot::{render_band_comparison_png, render_dfa_png, render_power_series_png, PlotStyle};
pub use session::{AnalysisSession, SpikeReport};
pub use spectrum::{estimate_psd, periodogram, Psd};
pub use spikes::{adaptive_threshold, SpikeEvent};
pub use stats::{summarize, PowerStatistics, SummaryStats};
