//! A TCP Reno-style controller.
//!
//! 一个类 TCP Reno 的拥塞控制器。

use super::{CongestionAlgorithm, CongestionControl, CongestionState};
use crate::config::CongestionControlConfig;
use tracing::debug;

/// Tahoe's behaviour plus fast recovery: a fast retransmit halves the window
/// and continues in congestion avoidance instead of restarting slow start.
///
/// 在 Tahoe 的基础上增加快速恢复：快速重传将窗口减半，
/// 并在拥塞避免阶段继续，而不是重新慢启动。
#[derive(Debug)]
pub struct Reno {
    pub(super) state: CongestionState,
}

impl Reno {
    pub fn new(config: &CongestionControlConfig) -> Self {
        Self {
            state: CongestionState::new(config),
        }
    }

    pub fn state(&self) -> &CongestionState {
        &self.state
    }
}

impl CongestionControl for Reno {
    fn on_ack_advance(&mut self) {
        self.state.grow();
    }

    fn on_duplicate_ack(&mut self, sequence_id: i32) -> bool {
        debug!(seq = sequence_id, "Reno: fast retransmit, fast recovery");
        self.state.halve();
        true
    }

    fn on_timeout(&mut self) {
        self.state.collapse();
    }

    fn congestion_window(&self) -> u32 {
        self.state.cwnd()
    }

    fn algorithm(&self) -> CongestionAlgorithm {
        CongestionAlgorithm::Reno
    }
}
