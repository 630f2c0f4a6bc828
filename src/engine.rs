// src/engine.rs
use crate::analysis::AnalysisSession;
use crate::signal::TimeSpan;
use crate::types::*;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// 后台分析线程的句柄：提交命令、读取结果
pub struct AnalysisWorker {
    tx_cmd: Sender<(RequestId, AnalysisCommand)>,
    rx: Receiver<AnalysisMessage>,
    next_id: RequestId,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_worker(session: AnalysisSession) -> AnalysisWorker {
    let (tx_cmd, rx_cmd) = mpsc::channel::<(RequestId, AnalysisCommand)>();
    let (tx, rx) = mpsc::channel::<AnalysisMessage>();
    let handle = thread::spawn(move || run(session, tx, rx_cmd));
    AnalysisWorker {
        tx_cmd,
        rx,
        next_id: 1,
        handle: Some(handle),
    }
}

fn run(session: AnalysisSession, tx: Sender<AnalysisMessage>, rx_cmd: Receiver<(RequestId, AnalysisCommand)>) {
    // 发送启动日志
    let info = session.signal().info();
    tx.send(AnalysisMessage::Log(format!(
        "analysis worker ready: {} channels, {:.1} s",
        info.channel_count, info.duration_seconds
    )))
    .ok();

    // 一次只处理一个命令；前台关闭通道或发送 Shutdown 时退出
    for (id, cmd) in rx_cmd {
        let reply = match cmd {
            AnalysisCommand::PowerOverTime { channel, band, span } => AnalysisMessage::PowerSeries {
                id,
                result: session.power_over_time(channel, &band, &span),
            },
            AnalysisCommand::DetectSpikes {
                channel,
                band,
                span,
                sigma,
            } => AnalysisMessage::Spikes {
                id,
                result: session.detect_spikes(channel, &band, &span, sigma),
            },
            AnalysisCommand::CompareBands { channel, span } => AnalysisMessage::Comparison {
                id,
                result: session.compare_bands(channel, &span),
            },
            AnalysisCommand::Dfa { channel, span, params } => {
                // 未指定时间范围时只分析前 max_analysis_seconds 秒，保证交互响应
                let limit = session.settings().max_analysis_seconds;
                let span = if span.is_full() && session.signal().duration_seconds() > limit {
                    let note = format!("DFA limited to the first {limit:.0} s of the recording");
                    log::info!("{note}");
                    tx.send(AnalysisMessage::Log(note)).ok();
                    TimeSpan::new(0.0, limit)
                } else {
                    span
                };
                AnalysisMessage::Dfa {
                    id,
                    result: session.dfa(channel, &span, &params),
                }
            }
            AnalysisCommand::Shutdown => break,
        };
        if tx.send(reply).is_err() {
            // 前台已经丢弃接收端
            break;
        }
    }
    log::debug!("analysis worker stopped");
}

impl AnalysisWorker {
    // 提交命令，返回本次请求的编号
    pub fn submit(&mut self, cmd: AnalysisCommand) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        if self.tx_cmd.send((id, cmd)).is_err() {
            log::warn!("analysis worker is gone, request {id} dropped");
        }
        id
    }

    pub fn try_recv(&self) -> Option<AnalysisMessage> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<AnalysisMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    // 等待指定编号的结果，途中的日志和其他回复被丢弃
    pub fn wait_for(&self, id: RequestId, timeout: Duration) -> Option<AnalysisMessage> {
        while let Some(msg) = self.recv_timeout(timeout) {
            match msg {
                AnalysisMessage::Log(line) => log::info!("{line}"),
                msg if msg.id() == Some(id) => return Some(msg),
                _ => {}
            }
        }
        None
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.tx_cmd.send((0, AnalysisCommand::Shutdown)).ok();
            if handle.join().is_err() {
                log::error!("analysis worker panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, BandRegistry};
    use crate::config::{AnalysisSettings, DfaSettings};
    use crate::signal::synth;
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(30);

    fn worker(settings: AnalysisSettings) -> AnalysisWorker {
        let signal = synth::demo_recording(250.0, 20.0, 3).unwrap();
        spawn_worker(AnalysisSession::new(Arc::new(signal), BandRegistry::new(), settings))
    }

    #[test]
    fn replies_carry_the_request_id() {
        let mut worker = worker(AnalysisSettings::default());
        let first = worker.submit(AnalysisCommand::PowerOverTime {
            channel: 0,
            band: "Alpha".into(),
            span: TimeSpan::full(),
        });
        let second = worker.submit(AnalysisCommand::CompareBands {
            channel: 9,
            span: TimeSpan::full(),
        });
        assert_ne!(first, second);
        match worker.wait_for(first, WAIT) {
            Some(AnalysisMessage::PowerSeries { result: Ok(series), .. }) => assert_eq!(series.len(), 37),
            other => panic!("unexpected reply: {other:?}"),
        }
        match worker.wait_for(second, WAIT) {
            Some(AnalysisMessage::Comparison {
                result: Err(AnalysisError::ChannelOutOfRange { index: 9, count: 4 }),
                ..
            }) => {}
            other => panic!("unexpected reply: {other:?}"),
        }
        worker.shutdown();
    }

    #[test]
    fn long_dfa_requests_are_capped() {
        let settings = AnalysisSettings {
            max_analysis_seconds: 10.0,
            ..AnalysisSettings::default()
        };
        let mut worker = worker(settings);
        let id = worker.submit(AnalysisCommand::Dfa {
            channel: 2,
            span: TimeSpan::full(),
            params: DfaSettings::default(),
        });
        let mut capped = false;
        let mut result = None;
        while let Some(msg) = worker.recv_timeout(WAIT) {
            match msg {
                AnalysisMessage::Log(line) => capped |= line.contains("limited"),
                AnalysisMessage::Dfa { id: got, result: r } if got == id => {
                    result = Some(r);
                    break;
                }
                _ => {}
            }
        }
        assert!(capped);
        let result = result.unwrap().unwrap();
        // 10 s at 250 Hz: max_scale is clamped to 2500 / 4.
        assert!(result.scales.iter().all(|&s| s <= 625));
        assert!(result.alpha.is_finite());
    }
}
