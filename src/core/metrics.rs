//! Per-transfer delay, jitter and throughput accounting.
//!
//! 每次传输的延迟、抖动与吞吐量统计。

use std::{fmt, time::Duration};
use tokio::time::Instant;

/// Accumulates samples while a transfer runs.
///
/// 在传输过程中累积样本。
#[derive(Debug)]
pub struct MetricsCollector {
    started_at: Instant,
    total_bytes_sent: u64,
    rtt_samples: Vec<Duration>,
    jitter_samples: Vec<Duration>,
    segments_sent: u64,
    retransmissions: u64,
    timeouts: u64,
    fast_retransmits: u64,
}

impl MetricsCollector {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            total_bytes_sent: 0,
            rtt_samples: Vec::new(),
            jitter_samples: Vec::new(),
            segments_sent: 0,
            retransmissions: 0,
            timeouts: 0,
            fast_retransmits: 0,
        }
    }

    /// Counts a datagram put on the wire.
    pub fn record_send(&mut self, bytes: usize, retransmission: bool) {
        self.total_bytes_sent += bytes as u64;
        self.segments_sent += 1;
        if retransmission {
            self.retransmissions += 1;
        }
    }

    /// Appends a delay sample and, from the second one on, the jitter
    /// against its predecessor.
    ///
    /// 追加一个延迟样本；从第二个样本起，同时追加与前一样本的抖动。
    pub fn record_rtt(&mut self, sample: Duration) {
        if let Some(&previous) = self.rtt_samples.last() {
            self.jitter_samples.push(previous.abs_diff(sample));
        }
        self.rtt_samples.push(sample);
    }

    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    pub fn record_fast_retransmit(&mut self) {
        self.fast_retransmits += 1;
    }

    pub fn rtt_samples(&self) -> &[Duration] {
        &self.rtt_samples
    }

    pub fn jitter_samples(&self) -> &[Duration] {
        &self.jitter_samples
    }

    /// Computes the final figures.
    ///
    /// 计算最终指标。
    pub fn finish(self, finished_at: Instant) -> TransferReport {
        let elapsed = finished_at.saturating_duration_since(self.started_at);
        let throughput = if elapsed.is_zero() {
            0.0
        } else {
            self.total_bytes_sent as f64 / elapsed.as_secs_f64()
        };
        let avg_delay = mean_secs(&self.rtt_samples);
        let avg_jitter = mean_secs(&self.jitter_samples);

        TransferReport {
            bytes_sent: self.total_bytes_sent,
            elapsed,
            throughput,
            avg_delay,
            avg_jitter,
            performance_score: performance_score(throughput, avg_jitter, avg_delay),
            rtt_sample_count: self.rtt_samples.len(),
            segments_sent: self.segments_sent,
            retransmissions: self.retransmissions,
            timeouts: self.timeouts,
            fast_retransmits: self.fast_retransmits,
            closed_cleanly: false,
        }
    }
}

fn mean_secs(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(Duration::as_secs_f64).sum::<f64>() / samples.len() as f64
}

/// `0.2·(throughput/2000) + 0.1/avg_jitter + 0.8/avg_delay`, where a zero
/// average leaves its term at the bare numerator.
///
/// 平均值为零时，对应项只取分子。
pub fn performance_score(throughput: f64, avg_jitter: f64, avg_delay: f64) -> f64 {
    let jitter_term = if avg_jitter > 0.0 { 0.1 / avg_jitter } else { 0.1 };
    let delay_term = if avg_delay > 0.0 { 0.8 / avg_delay } else { 0.8 };
    0.2 * (throughput / 2000.0) + jitter_term + delay_term
}

/// The read-only summary of a finished transfer.
///
/// 已完成传输的只读摘要。
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    /// Datagram bytes put on the wire for data segments, retransmissions included.
    /// 数据段发送到线上的字节数（包含重传）。
    pub bytes_sent: u64,
    pub elapsed: Duration,
    /// Bytes per second.
    pub throughput: f64,
    /// Mean send-to-ACK delay, in seconds.
    pub avg_delay: f64,
    /// Mean absolute difference of consecutive delays, in seconds.
    pub avg_jitter: f64,
    pub performance_score: f64,
    pub rtt_sample_count: usize,
    pub segments_sent: u64,
    pub retransmissions: u64,
    pub timeouts: u64,
    pub fast_retransmits: u64,
    /// Whether the receiver completed the FIN exchange.
    /// 接收端是否完成了 FIN 交换。
    pub closed_cleanly: bool,
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Throughput: {:.7} bytes/second", self.throughput)?;
        writeln!(f, "Average Packet Delay: {:.7} seconds", self.avg_delay)?;
        writeln!(f, "Average Jitter: {:.7} seconds", self.avg_jitter)?;
        write!(f, "Performance Metric: {:.7}", self.performance_score)
    }
}
