// src/types.rs
use crate::analysis::{AnalysisError, BandComparison, DfaResult, PowerSeries, SpikeReport};
use crate::config::DfaSettings;
use crate::signal::TimeSpan;

// 每个请求的编号，回复中原样带回，前台据此丢弃过期结果
pub type RequestId = u64;

// 前台发给分析线程的命令
#[derive(Clone, Debug)]
pub enum AnalysisCommand {
    PowerOverTime {
        channel: usize,
        band: String,
        span: TimeSpan,
    },
    DetectSpikes {
        channel: usize,
        band: String,
        span: TimeSpan,
        sigma: f64,
    },
    CompareBands {
        channel: usize,
        span: TimeSpan,
    },
    Dfa {
        channel: usize,
        span: TimeSpan,
        params: DfaSettings,
    },
    Shutdown,
}

// 分析线程发回前台的消息
#[derive(Debug)]
pub enum AnalysisMessage {
    Log(String),
    PowerSeries {
        id: RequestId,
        result: Result<PowerSeries, AnalysisError>,
    },
    Spikes {
        id: RequestId,
        result: Result<SpikeReport, AnalysisError>,
    },
    Comparison {
        id: RequestId,
        result: Result<BandComparison, AnalysisError>,
    },
    Dfa {
        id: RequestId,
        result: Result<DfaResult, AnalysisError>,
    },
}

impl AnalysisMessage {
    // 日志消息没有编号
    pub fn id(&self) -> Option<RequestId> {
        match self {
            AnalysisMessage::Log(_) => None,
            AnalysisMessage::PowerSeries { id, .. }
            | AnalysisMessage::Spikes { id, .. }
            | AnalysisMessage::Comparison { id, .. }
            | AnalysisMessage::Dfa { id, .. } => Some(*id),
        }
    }
}
