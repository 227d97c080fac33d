//! 定义了发送端和协议的可配置参数。
//! Defines configurable parameters for the sender and the protocol.

use crate::{
    congestion::CongestionAlgorithm,
    error::{Error, Result},
    packet::{MAX_PACKET_SIZE, SEQUENCE_ID_SIZE},
};
use std::time::Duration;

/// A structure containing all configurable parameters for a transfer.
///
/// 包含一次传输所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Reliability-related parameters.
    /// 可靠性相关参数。
    pub reliability: ReliabilityConfig,

    /// Congestion control-related parameters.
    /// 拥塞控制相关参数。
    pub congestion_control: CongestionControlConfig,

    /// Datagram sizing parameters.
    /// 数据报尺寸相关参数。
    pub connection: ConnectionConfig,
}

/// Reliability-related parameters.
///
/// 可靠性相关参数。
#[derive(Debug, Clone)]
pub struct ReliabilityConfig {
    /// How long the sender waits for the window base to advance before it
    /// declares a retransmission timeout.
    /// 发送端在宣告重传超时之前等待窗口基址前移的时长。
    pub ack_timeout: Duration,
    /// The number of identical consecutive ACK ids that triggers a fast retransmit.
    /// 触发快速重传所需的连续相同ACK序号数量。
    pub fast_retx_threshold: usize,
    /// Gives up with `Error::ConnectionTimeout` after this many timeouts in a
    /// row. `None` retries forever.
    /// 连续超时达到该次数后以 `Error::ConnectionTimeout` 放弃。`None` 表示无限重试。
    pub max_consecutive_timeouts: Option<u32>,
    /// Maximum number of times the end-of-stream sentinel is resent while
    /// waiting for the receiver's FIN.
    /// 等待接收端FIN时，流结束标记的最大重发次数。
    pub fin_max_retries: u8,
    /// How long to wait for the receiver's FIN after each sentinel.
    /// 每次发送结束标记后等待接收端FIN的时长。
    pub fin_retry_interval: Duration,
}

/// Congestion control-related parameters.
///
/// 拥塞控制相关参数。
#[derive(Debug, Clone)]
pub struct CongestionControlConfig {
    /// Which window strategy drives the transfer.
    /// 驱动传输的窗口策略。
    pub algorithm: CongestionAlgorithm,
    /// The constant window used by `CongestionAlgorithm::FixedWindow`, in packets.
    /// `CongestionAlgorithm::FixedWindow` 使用的固定窗口（以包为单位）。
    pub fixed_window_packets: u32,
    /// The initial congestion window size in packets.
    /// 初始拥塞窗口大小（以包为单位）。
    pub initial_cwnd_packets: u32,
    /// The initial slow start threshold in packets.
    /// 初始慢启动阈值（以包为单位）。
    pub initial_ssthresh: u32,
    /// The slow start threshold never drops below this value.
    /// 慢启动阈值不会低于该值。
    pub min_ssthresh: u32,
}

/// Datagram sizing parameters.
///
/// 数据报尺寸相关参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// The maximum size for a single datagram, sequence id included.
    /// 单个数据报的最大大小（包含序列号）。
    pub max_packet_size: usize,
}

impl ConnectionConfig {
    /// The payload budget of a single data segment.
    ///
    /// 单个数据段的载荷上限。
    pub fn max_payload_size(&self) -> usize {
        self.max_packet_size.saturating_sub(SEQUENCE_ID_SIZE)
    }
}

impl Config {
    /// Creates the default configuration for the given algorithm.
    ///
    /// 为给定算法创建默认配置。
    pub fn with_algorithm(algorithm: CongestionAlgorithm) -> Self {
        let mut config = Self::default();
        config.congestion_control.algorithm = algorithm;
        config
    }

    /// Rejects parameter combinations the sender cannot run with.
    ///
    /// 拒绝发送端无法运行的参数组合。
    pub fn validate(&self) -> Result<()> {
        if self.connection.max_payload_size() == 0 {
            return Err(Error::InvalidConfig(format!(
                "max_packet_size must exceed the {SEQUENCE_ID_SIZE}-byte sequence id"
            )));
        }
        let cc = &self.congestion_control;
        if cc.fixed_window_packets == 0 || cc.initial_cwnd_packets == 0 {
            return Err(Error::InvalidConfig(
                "window sizes must be at least one packet".into(),
            ));
        }
        if cc.min_ssthresh < 2 || cc.initial_ssthresh < cc.min_ssthresh {
            return Err(Error::InvalidConfig(format!(
                "initial_ssthresh ({}) must be at least min_ssthresh ({}), which must be at least 2",
                cc.initial_ssthresh, cc.min_ssthresh
            )));
        }
        if self.reliability.fast_retx_threshold == 0 {
            return Err(Error::InvalidConfig(
                "fast_retx_threshold must be non-zero".into(),
            ));
        }
        if self.reliability.ack_timeout.is_zero() {
            return Err(Error::InvalidConfig("ack_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(1),
            fast_retx_threshold: 3,
            max_consecutive_timeouts: None,
            fin_max_retries: 5,
            fin_retry_interval: Duration::from_secs(1),
        }
    }
}

impl Default for CongestionControlConfig {
    fn default() -> Self {
        Self {
            algorithm: CongestionAlgorithm::Reno,
            fixed_window_packets: 100,
            initial_cwnd_packets: 1,
            initial_ssthresh: 1000,
            min_ssthresh: 2,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}
