//! A TCP Tahoe-style controller.
//!
//! 一个类 TCP Tahoe 的拥塞控制器。

use super::{CongestionAlgorithm, CongestionControl, CongestionState};
use crate::config::CongestionControlConfig;
use tracing::debug;

/// Slow start, congestion avoidance, and a full window collapse on timeout.
/// A fast retransmit resends the segment but leaves the window alone.
///
/// 慢启动、拥塞避免，超时时窗口完全收缩。
/// 快速重传只重发数据段，不改变窗口。
#[derive(Debug)]
pub struct Tahoe {
    pub(super) state: CongestionState,
}

impl Tahoe {
    pub fn new(config: &CongestionControlConfig) -> Self {
        Self {
            state: CongestionState::new(config),
        }
    }

    pub fn state(&self) -> &CongestionState {
        &self.state
    }
}

impl CongestionControl for Tahoe {
    fn on_ack_advance(&mut self) {
        self.state.grow();
    }

    fn on_duplicate_ack(&mut self, sequence_id: i32) -> bool {
        debug!(
            seq = sequence_id,
            cwnd = self.state.cwnd(),
            "Tahoe: fast retransmit"
        );
        true
    }

    fn on_timeout(&mut self) {
        self.state.collapse();
    }

    fn congestion_window(&self) -> u32 {
        self.state.cwnd()
    }

    fn algorithm(&self) -> CongestionAlgorithm {
        CongestionAlgorithm::Tahoe
    }
}
