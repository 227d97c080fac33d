//! The slow start / congestion avoidance state shared by Tahoe and Reno.
//!
//! Tahoe 与 Reno 共享的慢启动 / 拥塞避免状态。

use crate::config::CongestionControlConfig;
use tracing::{debug, trace};

/// The phase of the window, derived from `cwnd` and `ssthresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SlowStart,
    CongestionAvoidance,
}

/// Window size and threshold of a loss-based controller.
///
/// `cwnd` never drops below 1 and `ssthresh` never below the configured floor,
/// which is at least 2.
///
/// 基于丢包的控制器的窗口大小与阈值。
#[derive(Debug, Clone)]
pub struct CongestionState {
    pub(super) cwnd: u32,
    pub(super) ssthresh: u32,
    min_ssthresh: u32,
}

impl CongestionState {
    pub fn new(config: &CongestionControlConfig) -> Self {
        let min_ssthresh = config.min_ssthresh.max(2);
        Self {
            cwnd: config.initial_cwnd_packets.max(1),
            ssthresh: config.initial_ssthresh.max(min_ssthresh),
            min_ssthresh,
        }
    }

    pub fn cwnd(&self) -> u32 {
        self.cwnd
    }

    pub fn ssthresh(&self) -> u32 {
        self.ssthresh
    }

    pub fn mode(&self) -> Mode {
        if self.cwnd < self.ssthresh {
            Mode::SlowStart
        } else {
            Mode::CongestionAvoidance
        }
    }

    /// Doubles the window in slow start, adds one packet otherwise.
    ///
    /// 慢启动阶段窗口翻倍，否则增加一个包。
    pub fn grow(&mut self) {
        match self.mode() {
            Mode::SlowStart => {
                self.cwnd = self.cwnd.saturating_mul(2);
                trace!(cwnd = self.cwnd, "Slow Start: cwnd doubled");
            }
            Mode::CongestionAvoidance => {
                self.cwnd = self.cwnd.saturating_add(1);
                trace!(cwnd = self.cwnd, "Congestion Avoidance: cwnd increased");
            }
        }
    }

    /// Halves the threshold and restarts from a single packet.
    ///
    /// 阈值减半，窗口从单个包重新开始。
    pub fn collapse(&mut self) {
        self.ssthresh = self.halved();
        self.cwnd = 1;
        debug!(
            ssthresh = self.ssthresh,
            cwnd = self.cwnd,
            "Window collapsed, back to slow start"
        );
    }

    /// Halves the threshold and resumes at it, skipping slow start.
    ///
    /// 阈值减半并以该阈值继续，跳过慢启动。
    pub fn halve(&mut self) {
        self.ssthresh = self.halved();
        self.cwnd = self.ssthresh;
        debug!(
            ssthresh = self.ssthresh,
            cwnd = self.cwnd,
            "Window halved, entering congestion avoidance"
        );
    }

    fn halved(&self) -> u32 {
        (self.cwnd / 2).max(self.min_ssthresh)
    }
}
