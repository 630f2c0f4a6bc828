// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use eegan::analysis::{
    render_band_comparison_png, render_dfa_png, render_power_series_png, AnalysisSession,
    PlotStyle, PowerStatistics,
};
use eegan::config::{AnalysisSettings, DfaSettings};
use eegan::engine::spawn_worker;
use eegan::signal::{load_file, synth, Signal, TimeSpan};
use eegan::types::{AnalysisCommand, AnalysisMessage};

// DFA 在后台线程运行时的最长等待时间
const DFA_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Parser, Debug)]
#[command(author, version, about = "EEG band power, spike and DFA analysis", long_about = None)]
struct Cli {
    /// Sample rate in Hz for text files without a time column (default 250 for `demo`)
    #[arg(long, global = true)]
    sample_rate: Option<f64>,
    /// JSON settings file; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Channel index or name
    #[arg(long, global = true, default_value = "0")]
    channel: String,
    /// Frequency band (Delta, Theta, Alpha, Beta, Gamma or a custom band)
    #[arg(long, global = true)]
    band: Option<String>,
    /// Start of the analysed range in seconds
    #[arg(long, global = true)]
    start: Option<f64>,
    /// End of the analysed range in seconds
    #[arg(long, global = true)]
    end: Option<f64>,
    /// Skip the bandpass / notch pre-processing
    #[arg(long, global = true)]
    no_filter: bool,
    /// Also render the result to this PNG file
    #[arg(long, global = true)]
    plot: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recording metadata and amplitude statistics per channel
    Info { file: PathBuf },
    /// Band power over sliding windows
    Power { file: PathBuf },
    /// Windows whose band power exceeds mean + sigma * std
    Spikes {
        file: PathBuf,
        /// Threshold in standard deviations
        #[arg(long)]
        sigma: Option<f64>,
    },
    /// Normalized power of all standard bands on one time axis
    Compare { file: PathBuf },
    /// Detrended fluctuation analysis
    Dfa {
        file: PathBuf,
        #[arg(long)]
        min_scale: Option<usize>,
        #[arg(long)]
        max_scale: Option<usize>,
        #[arg(long)]
        n_scales: Option<usize>,
    },
    /// Power spectral density (0.1 - 40 Hz), band powers and dominant frequency
    Spectrum { file: PathBuf },
    /// Run every analysis on a synthetic recording
    Demo {
        #[arg(long, default_value = "60")]
        seconds: f64,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = AnalysisSettings::load_or_default(cli.config.as_deref())
        .context("could not load settings")?;

    // 1. 读取信号
    let signal = match &cli.command {
        Command::Demo { seconds, seed } => {
            synth::demo_recording(cli.sample_rate.unwrap_or(250.0), *seconds, *seed)
                .context("could not build the demo recording")?
        }
        Command::Info { file }
        | Command::Power { file }
        | Command::Spikes { file, .. }
        | Command::Compare { file }
        | Command::Dfa { file, .. }
        | Command::Spectrum { file } => load_file(file, cli.sample_rate)
            .with_context(|| format!("could not load {}", file.display()))?,
    };

    // 2. 预处理 (带通 + 陷波)
    let signal = if cli.no_filter || !settings.filter.enabled {
        signal
    } else {
        let chain = settings
            .filter
            .chain(signal.sample_rate_hz())
            .context("invalid filter settings")?;
        signal.filtered(&chain)
    };

    let bands = settings.band_registry()?;
    let channel = resolve_channel(&signal, &cli.channel)?;
    let band = cli.band.clone().unwrap_or_else(|| settings.default_band.clone());
    let span = TimeSpan {
        start: cli.start,
        end: cli.end,
    };
    let session = AnalysisSession::new(Arc::new(signal), bands, settings);

    // 3. 分析并输出 JSON
    match &cli.command {
        Command::Info { .. } => {
            let stats = (0..session.signal().channel_count())
                .map(|idx| session.channel_stats(idx, &span))
                .collect::<Result<Vec<_>, _>>()?;
            let selection = if span.is_full() {
                None
            } else {
                let part = session
                    .signal()
                    .window(&span)
                    .context("the selected time range contains no samples")?;
                Some(part.info())
            };
            print_json(&json!({
                "recording": session.signal().info(),
                "selection": selection,
                "channels": stats,
            }))?;
        }
        Command::Power { .. } => {
            let series = session.power_over_time(channel, &band, &span)?;
            let stats = PowerStatistics::from_series(&series);
            let relative = session.relative_band_power(channel, &band, &span)?;
            if let Some(path) = &cli.plot {
                let png = render_power_series_png(&series, &[], None, &band, PlotStyle::default())?;
                write_png(path, &png)?;
            }
            print_json(&json!({
                "band": session.bands().resolve(&band).name,
                "relative_power": relative,
                "statistics": stats,
                "series": series,
            }))?;
        }
        Command::Spikes { sigma, .. } => {
            let sigma = sigma.unwrap_or(session.settings().spike_sigma);
            let report = session.detect_spikes(channel, &band, &span, sigma)?;
            if let Some(path) = &cli.plot {
                let png = render_power_series_png(
                    &report.series,
                    &report.events,
                    report.threshold,
                    &format!("{} spikes", report.band),
                    PlotStyle::default(),
                )?;
                write_png(path, &png)?;
            }
            print_json(&report)?;
        }
        Command::Compare { .. } => {
            let comparison = session.compare_bands(channel, &span)?;
            if let Some(path) = &cli.plot {
                let png = render_band_comparison_png(&comparison, session.bands(), PlotStyle::default())?;
                write_png(path, &png)?;
            }
            print_json(&comparison)?;
        }
        Command::Dfa {
            min_scale,
            max_scale,
            n_scales,
            ..
        } => {
            let defaults = session.settings().dfa;
            let params = DfaSettings {
                min_scale: min_scale.unwrap_or(defaults.min_scale),
                max_scale: max_scale.unwrap_or(defaults.max_scale),
                n_scales: n_scales.unwrap_or(defaults.n_scales),
            };
            run_dfa(session, channel, span, params, cli.plot.as_deref())?;
        }
        Command::Spectrum { .. } => {
            let spectrum = session.spectrum(channel, &span)?;
            let band_powers = session.band_powers(channel, &span)?;
            let dominant = session.dominant_frequency(channel, &span)?;
            print_json(&json!({
                "dominant_frequency_hz": dominant,
                "band_powers": band_powers,
                "spectrum": spectrum,
            }))?;
        }
        Command::Demo { .. } => {
            let o1 = resolve_channel(session.signal(), "O1")?;
            let c3 = resolve_channel(session.signal(), "C3")?;
            let fz = resolve_channel(session.signal(), "Fz")?;
            let alpha = session.power_statistics(o1, "Alpha", &span)?;
            let spikes = session.detect_spikes(c3, "Beta", &span, session.settings().spike_sigma)?;
            let comparison = session.compare_bands(o1, &span)?;
            print_json(&json!({
                "recording": session.signal().info(),
                "o1_alpha": alpha,
                "o1_dominant_frequency_hz": session.dominant_frequency(o1, &span)?,
                "c3_beta_spike_count": spikes.events.len(),
                "o1_bands": comparison.bands.iter().map(|b| &b.name).collect::<Vec<_>>(),
            }))?;
            let params = session.settings().dfa;
            run_dfa(session, fz, span, params, cli.plot.as_deref())?;
        }
    }
    Ok(())
}

// DFA 交给后台线程执行，主线程等待结果
fn run_dfa(
    session: AnalysisSession,
    channel: usize,
    span: TimeSpan,
    params: DfaSettings,
    plot: Option<&Path>,
) -> Result<()> {
    let sample_rate_hz = session.signal().sample_rate_hz();
    let mut worker = spawn_worker(session);
    let id = worker.submit(AnalysisCommand::Dfa {
        channel,
        span,
        params,
    });
    let result = match worker.wait_for(id, DFA_TIMEOUT) {
        Some(AnalysisMessage::Dfa { result, .. }) => result?,
        _ => bail!("DFA did not finish within {} s", DFA_TIMEOUT.as_secs()),
    };
    worker.shutdown();
    if let Some(path) = plot {
        if result.scales.is_empty() {
            log::warn!("no valid DFA scales, skipping plot");
        } else {
            write_png(path, &render_dfa_png(&result, PlotStyle::default())?)?;
        }
    }
    print_json(&json!({
        "alpha": result.alpha,
        "regime": result.regime().description(),
        "time_range_seconds": result.time_range_seconds(sample_rate_hz),
        "result": result,
    }))
}

fn resolve_channel(signal: &Signal, selector: &str) -> Result<usize> {
    if let Some(idx) = signal.channel_index(selector) {
        return Ok(idx);
    }
    match selector.parse::<usize>() {
        Ok(idx) if idx < signal.channel_count() => Ok(idx),
        _ => bail!(
            "unknown channel `{selector}`; available: {}",
            signal.channel_names().join(", ")
        ),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    fs::write(path, png).with_context(|| format!("could not write {}", path.display()))?;
    log::info!("plot written to {}", path.display());
    Ok(())
}
