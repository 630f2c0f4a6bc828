use std::fs;
use std::path::Path;
use edfplus::EdfReader;
use crate::signal::{Signal, SignalError};
/// Anything that can turn a file on disk into a [`Signal`].
pub trait SignalLoader {
    fn load(&self, path: &Path) -> Result<Signal, SignalError>;
}
/// Picks a loader from the file extension.
///
/// `.edf` goes to [`EdfLoader`]; `.txt`, `.csv`, `.tsv` and `.dat` go to [`TextLoader`],
/// which uses `sample_rate_hz` when the file itself does not say.
pub fn load_file(path: &Path, sample_rate_hz: Option<f64>) -> Result<Signal, SignalError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let signal = match extension.as_str() {
        "edf" => EdfLoader.load(path)?,
        "txt" | "csv" | "tsv" | "dat" => TextLoader { sample_rate_hz }.load(path)?,
        _ => return Err(SignalError::UnsupportedFormat(path.to_path_buf())),
    };
    log::info!(
        "loaded {}: {} channels, {} samples at {} Hz",
        path.display(),
        signal.channel_count(),
        signal.sample_count(),
        signal.sample_rate_hz()
    );
    Ok(signal)
}
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
/// Delimited text: one row per sample, one column per channel.
///
/// - `#` lines are comments; `# sample_rate: 250` sets the rate.
/// - The delimiter (tab, comma, semicolon or whitespace) is taken from the first row.
/// - A non-numeric first row is a header of channel names. A first header column named
///   `time`, `t`, `timestamp` or `time_s` is a time axis the rate can be inferred from.
#[derive(Clone, Debug, Default)]
pub struct TextLoader {
    pub sample_rate_hz: Option<f64>,
}
#[derive(Clone, Copy, Debug, PartialEq)]
enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Whitespace,
}
impl Delimiter {
    fn detect(line: &str) -> Self {
        if line.contains('\t') {
            Delimiter::Tab
        } else if line.contains(',') {
            Delimiter::Comma
        } else if line.contains(';') {
            Delimiter::Semicolon
        } else {
            Delimiter::Whitespace
        }
    }
    fn split<'a>(self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Tab => line.split('\t').map(str::trim).collect(),
            Delimiter::Comma => line.split(',').map(str::trim).collect(),
            Delimiter::Semicolon => line.split(';').map(str::trim).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}
const TIME_COLUMN_NAMES: [&str; 4] = ["time", "t", "timestamp", "time_s"];
const RATE_KEYS: [&str; 3] = ["sample_rate", "sampling_rate", "sfreq"];
fn rate_from_comment(comment: &str) -> Option<f64> {
    let comment = comment.trim().to_ascii_lowercase();
    let key = RATE_KEYS.iter().find(|k| comment.starts_with(**k))?;
    let value = comment[key.len()..].trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace());
    let value = value.trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
    value.parse::<f64>().ok()
}
impl TextLoader {
    pub fn with_sample_rate(sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz: Some(sample_rate_hz),
        }
    }
    pub fn parse(&self, text: &str) -> Result<Signal, SignalError> {
        let mut delimiter = None;
        let mut header: Option<Vec<String>> = None;
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut comment_rate = None;
        let mut seen_first_row = false;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(rate) = rate_from_comment(comment) {
                    comment_rate = Some(rate);
                }
                continue;
            }
            let delim = *delimiter.get_or_insert_with(|| Delimiter::detect(line));
            let fields = delim.split(line);
            if !seen_first_row {
                seen_first_row = true;
                if fields.iter().any(|f| f.parse::<f64>().is_err()) {
                    header = Some(fields.iter().map(|f| f.to_string()).collect());
                    columns = vec![Vec::new(); fields.len()];
                    continue;
                }
                columns = vec![Vec::new(); fields.len()];
            }
            if fields.len() != columns.len() {
                return Err(SignalError::Parse {
                    line: line_no,
                    message: format!("expected {} columns, found {}", columns.len(), fields.len()),
                });
            }
            for (column, field) in columns.iter_mut().zip(&fields) {
                let value = field.parse::<f64>().map_err(|_| SignalError::Parse {
                    line: line_no,
                    message: format!("`{field}` is not a number"),
                })?;
                column.push(value);
            }
        }
        let has_time = header
            .as_ref()
            .and_then(|h| h.first())
            .map(|first| TIME_COLUMN_NAMES.contains(&first.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        let time_column = if has_time && !columns.is_empty() {
            Some(columns.remove(0))
        } else {
            None
        };
        if columns.is_empty() || columns[0].is_empty() {
            return Err(SignalError::Empty);
        }
        let sample_rate_hz = self
            .sample_rate_hz
            .or(comment_rate)
            .or_else(|| time_column.as_deref().and_then(rate_from_time_axis))
            .ok_or(SignalError::MissingSampleRate)?;
        let names: Vec<String> = match header {
            Some(mut names) => {
                if has_time {
                    names.remove(0);
                }
                names
            }
            None => (1..=columns.len()).map(|i| format!("Ch{i}")).collect(),
        };
        Signal::from_rows(columns, sample_rate_hz, names)
    }
}
fn rate_from_time_axis(times: &[f64]) -> Option<f64> {
    let (first, last) = (times.first()?, times.last()?);
    if times.len() < 2 {
        return None;
    }
    let dt = (last - first) / (times.len() - 1) as f64;
    (dt > 0.0).then(|| 1.0 / dt)
}
impl SignalLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Signal, SignalError> {
        let text = fs::read_to_string(path)?;
        Ok(self.parse(&text)?.with_source(source_name(path)))
    }
}
/// European Data Format (EDF/EDF+) reader backed by [`edfplus::EdfReader`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EdfLoader;
const EDF_ANNOTATIONS: &str = "EDF Annotations";
/// EDF time fields count in units of 100 ns.
const EDF_TIME_UNITS_PER_SECOND: f64 = 10_000_000.0;
struct EdfChannel {
    index: usize,
    label: String,
    scale: f64,
    samples_per_record: usize,
}
fn microvolt_scale(dimension: &str) -> f64 {
    match dimension.trim().to_ascii_lowercase().as_str() {
        "v" => 1.0e6,
        "mv" => 1.0e3,
        "nv" => 1.0e-3,
        _ => 1.0,
    }
}
fn edf_error(err: impl std::fmt::Display) -> SignalError {
    SignalError::Edf(err.to_string())
}
impl SignalLoader for EdfLoader {
    fn load(&self, path: &Path) -> Result<Signal, SignalError> {
        let mut reader = EdfReader::open(path).map_err(edf_error)?;
        // 先取出头部信息，读取样本需要可变借用
        let header = reader.header();
        let records = header.datarecords_in_file.max(0) as usize;
        let record_seconds = header.datarecord_duration as f64 / EDF_TIME_UNITS_PER_SECOND;
        let channels: Vec<EdfChannel> = header
            .signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.label.trim() != EDF_ANNOTATIONS)
            .map(|(index, s)| EdfChannel {
                index,
                label: s.label.trim().to_string(),
                scale: microvolt_scale(&s.physical_dimension),
                samples_per_record: s.samples_per_record as usize,
            })
            .collect();
        if !(record_seconds > 0.0) {
            return Err(SignalError::Edf("record duration must be positive".into()));
        }
        if channels.is_empty() || records == 0 {
            return Err(SignalError::Empty);
        }
        let rates: Vec<usize> = channels.iter().map(|c| c.samples_per_record).collect();
        if rates.iter().any(|&r| r != rates[0]) {
            return Err(SignalError::MixedSampleRates(rates));
        }
        let mut rows = Vec::with_capacity(channels.len());
        for channel in &channels {
            let samples = reader
                .read_physical_samples(channel.index, records * channel.samples_per_record)
                .map_err(edf_error)?;
            rows.push(samples.into_iter().map(|v| v * channel.scale).collect());
        }
        let names = channels.into_iter().map(|c| c.label).collect();
        let sample_rate_hz = rates[0] as f64 / record_seconds;
        Ok(Signal::from_rows(rows, sample_rate_hz, names)?.with_source(source_name(path)))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    fn pad(text: &str, width: usize) -> Vec<u8> {
        let mut field = text.as_bytes().to_vec();
        field.resize(width, b' ');
        field
    }
    const TAL_SAMPLES: usize = 8;
    /// EDF+C file with one-second records, digital == physical and a trailing
    /// annotation signal carrying only the record time stamps.
    fn edf_bytes(labels: &[&str], samples_per_record: &[usize], records: &[Vec<Vec<i16>>]) -> Vec<u8> {
        let ns = labels.len() + 1;
        let mut spr: Vec<usize> = samples_per_record.to_vec();
        spr.push(TAL_SAMPLES);
        let mut all_labels: Vec<&str> = labels.to_vec();
        all_labels.push(EDF_ANNOTATIONS);
        let mut out = Vec::new();
        out.extend(pad("0", 8));
        out.extend(pad("X X X X", 80));
        out.extend(pad("Startdate 01-JAN-2024 X X X", 80));
        out.extend(pad("01.01.24", 8));
        out.extend(pad("00.00.00", 8));
        out.extend(pad(&(256 * (ns + 1)).to_string(), 8));
        out.extend(pad("EDF+C", 44));
        out.extend(pad(&records.len().to_string(), 8));
        out.extend(pad("1", 8));
        out.extend(pad(&ns.to_string(), 4));
        for l in &all_labels {
            out.extend(pad(l, 16));
        }
        for _ in 0..ns {
            out.extend(pad("AgAgCl", 80));
        }
        for l in &all_labels {
            out.extend(pad(if *l == EDF_ANNOTATIONS { "" } else { "uV" }, 8));
        }
        for _ in 0..ns {
            out.extend(pad("-32768", 8));
        }
        for _ in 0..ns {
            out.extend(pad("32767", 8));
        }
        for _ in 0..ns {
            out.extend(pad("-32768", 8));
        }
        for _ in 0..ns {
            out.extend(pad("32767", 8));
        }
        for _ in 0..ns {
            out.extend(pad("", 80));
        }
        for n in &spr {
            out.extend(pad(&n.to_string(), 8));
        }
        for _ in 0..ns {
            out.extend(pad("", 32));
        }
        for (idx, record) in records.iter().enumerate() {
            for signal in record {
                for v in signal {
                    out.extend(v.to_le_bytes());
                }
            }
            let mut tal = format!("+{idx}\u{14}\u{14}\u{0}").into_bytes();
            tal.resize(2 * TAL_SAMPLES, 0);
            out.extend(tal);
        }
        out
    }
    fn write_edf(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }
    #[test]
    fn parses_text_with_header_and_time_column() {
        let text = "time,Fp1,Fp2\n0.000,1.0,2.0\n0.004,3.0,4.0\n0.008,5.0,6.0\n";
        let signal = TextLoader::default().parse(text).unwrap();
        assert_eq!(signal.channel_names(), ["Fp1", "Fp2"]);
        assert!((signal.sample_rate_hz() - 250.0).abs() < 1e-6);
        assert_eq!(signal.channel(1).unwrap(), [2.0, 4.0, 6.0]);
    }
    #[test]
    fn comment_rate_and_default_names() {
        let text = "# recorded at the lab\n# sample_rate: 128 Hz\n1 2\n3 4\n";
        let signal = TextLoader::default().parse(text).unwrap();
        assert_eq!(signal.sample_rate_hz(), 128.0);
        assert_eq!(signal.channel_names(), ["Ch1", "Ch2"]);
        assert_eq!(signal.channel(0).unwrap(), [1.0, 3.0]);
    }
    #[test]
    fn text_errors_are_reported_with_line_numbers() {
        assert!(matches!(
            TextLoader::default().parse("1\t2\n3\t4\n"),
            Err(SignalError::MissingSampleRate)
        ));
        let err = TextLoader::with_sample_rate(100.0)
            .parse("1,2\n3\n")
            .unwrap_err();
        assert!(matches!(err, SignalError::Parse { line: 2, .. }));
        let err = TextLoader::with_sample_rate(100.0)
            .parse("a,b\n1,x\n")
            .unwrap_err();
        assert!(matches!(err, SignalError::Parse { line: 2, .. }));
    }
    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_eeg.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Cz;Pz").unwrap();
        writeln!(file, "1.5;2.5").unwrap();
        writeln!(file, "3.5;4.5").unwrap();
        drop(file);
        let signal = load_file(&path, Some(500.0)).unwrap();
        assert_eq!(signal.info().source.as_deref(), Some("sample_eeg.txt"));
        assert_eq!(signal.sample_count(), 2);
        let other = dir.path().join("recording.xyz");
        fs::write(&other, b"").unwrap();
        assert!(matches!(
            load_file(&other, None),
            Err(SignalError::UnsupportedFormat(_))
        ));
    }
    #[test]
    fn parses_edf_records_and_skips_annotations() {
        let records = vec![
            vec![vec![1, 2, 3, 4], vec![10, 20, 30, 40]],
            vec![vec![5, 6, 7, 8], vec![50, 60, 70, 80]],
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = write_edf(&dir, "two_records.edf", &edf_bytes(&["Fz", "Cz"], &[4, 4], &records));
        let signal = load_file(&path, None).unwrap();
        assert_eq!(signal.channel_names(), ["Fz", "Cz"]);
        assert!((signal.sample_rate_hz() - 4.0).abs() < 1e-9);
        assert_eq!(signal.info().source.as_deref(), Some("two_records.edf"));
        let fz = signal.channel(0).unwrap();
        assert_eq!(fz.len(), 8);
        for (got, want) in fz.iter().zip([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]) {
            assert!((got - want).abs() < 1e-6);
        }
        assert!((signal.channel(1).unwrap()[7] - 80.0).abs() < 1e-6);
    }
    #[test]
    fn edf_rejects_mixed_rates_and_truncated_headers() {
        let dir = tempfile::tempdir().unwrap();
        let truncated = write_edf(&dir, "truncated.edf", &[0u8; 100]);
        assert!(matches!(EdfLoader.load(&truncated), Err(SignalError::Edf(_))));
        let mixed = edf_bytes(&["Fz", "Cz"], &[2, 1], &[vec![vec![1, 2], vec![3]]]);
        let mixed = write_edf(&dir, "mixed.edf", &mixed);
        assert!(matches!(
            EdfLoader.load(&mixed),
            Err(SignalError::MixedSampleRates(_))
        ));
    }
    #[test]
    fn dimensions_scale_to_microvolts() {
        assert_eq!(microvolt_scale("uV"), 1.0);
        assert_eq!(microvolt_scale("mV"), 1.0e3);
        assert_eq!(microvolt_scale(" V "), 1.0e6);
        assert_eq!(microvolt_scale(""), 1.0);
    }
}
