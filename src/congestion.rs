//! Defines the pluggable congestion control interface.
//! 定义了可插拔的拥塞控制接口。

pub mod fixed;
pub mod reno;
pub mod state;
pub mod tahoe;

use crate::{
    config::CongestionControlConfig,
    error::{Error, Result},
};
use std::{fmt, str::FromStr};

pub use fixed::{FixedWindow, StopAndWait};
pub use reno::Reno;
pub use state::{CongestionState, Mode};
pub use tahoe::Tahoe;

/// A trait for congestion control algorithms.
///
/// 拥塞控制算法的 trait。
pub trait CongestionControl: Send + Sync + 'static {
    /// Called once for every ACK that advances the window base.
    ///
    /// 每当一个ACK推进窗口基址时调用一次。
    fn on_ack_advance(&mut self);

    /// Called when the ACK stream completed a run of identical ids.
    /// Returns whether the segment at `sequence_id` should be resent now.
    ///
    /// 当ACK流出现一组连续相同的序号时调用。
    /// 返回是否应立即重发 `sequence_id` 处的数据段。
    fn on_duplicate_ack(&mut self, sequence_id: i32) -> bool;

    /// Called when the window base did not move for a whole ACK wait.
    ///
    /// 当整个ACK等待期间窗口基址都没有前移时调用。
    fn on_timeout(&mut self);

    /// Gets the current congestion window size in packets.
    ///
    /// 获取当前的拥塞窗口大小（以包为单位）。
    fn congestion_window(&self) -> u32;

    /// The strategy this controller implements.
    fn algorithm(&self) -> CongestionAlgorithm;
}

/// The window strategies a transfer can be configured with.
///
/// 传输可配置的窗口策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CongestionAlgorithm {
    /// One segment in flight at a time.
    StopAndWait,
    /// A constant number of segments in flight.
    FixedWindow,
    /// Slow start and congestion avoidance, window collapse on loss.
    Tahoe,
    /// Tahoe plus fast recovery after a fast retransmit.
    Reno,
}

impl CongestionAlgorithm {
    pub const ALL: [CongestionAlgorithm; 4] = [
        CongestionAlgorithm::StopAndWait,
        CongestionAlgorithm::FixedWindow,
        CongestionAlgorithm::Tahoe,
        CongestionAlgorithm::Reno,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            CongestionAlgorithm::StopAndWait => "stop-and-wait",
            CongestionAlgorithm::FixedWindow => "fixed-window",
            CongestionAlgorithm::Tahoe => "tahoe",
            CongestionAlgorithm::Reno => "reno",
        }
    }
}

impl fmt::Display for CongestionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CongestionAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == normalized)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown congestion algorithm `{s}`")))
    }
}

/// Builds the controller selected by `config.algorithm`.
///
/// 根据 `config.algorithm` 构建拥塞控制器。
pub fn build(config: &CongestionControlConfig) -> Box<dyn CongestionControl> {
    match config.algorithm {
        CongestionAlgorithm::StopAndWait => Box::new(StopAndWait),
        CongestionAlgorithm::FixedWindow => Box::new(FixedWindow::new(config.fixed_window_packets)),
        CongestionAlgorithm::Tahoe => Box::new(Tahoe::new(config)),
        CongestionAlgorithm::Reno => Box::new(Reno::new(config)),
    }
}
