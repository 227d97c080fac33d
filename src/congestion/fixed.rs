//! Controllers whose window never changes.
//!
//! 窗口大小恒定的控制器。

use super::{CongestionAlgorithm, CongestionControl};

/// Keeps exactly one segment in flight.
///
/// 始终只有一个数据段在途。
#[derive(Debug, Clone, Copy, Default)]
pub struct StopAndWait;

impl CongestionControl for StopAndWait {
    fn on_ack_advance(&mut self) {}

    fn on_duplicate_ack(&mut self, _sequence_id: i32) -> bool {
        false
    }

    fn on_timeout(&mut self) {}

    fn congestion_window(&self) -> u32 {
        1
    }

    fn algorithm(&self) -> CongestionAlgorithm {
        CongestionAlgorithm::StopAndWait
    }
}

/// Keeps a constant number of segments in flight. Loss is only repaired by
/// timeout.
///
/// 保持固定数量的数据段在途，丢包只通过超时修复。
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    window: u32,
}

impl FixedWindow {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl CongestionControl for FixedWindow {
    fn on_ack_advance(&mut self) {}

    fn on_duplicate_ack(&mut self, _sequence_id: i32) -> bool {
        false
    }

    fn on_timeout(&mut self) {}

    fn congestion_window(&self) -> u32 {
        self.window
    }

    fn algorithm(&self) -> CongestionAlgorithm {
        CongestionAlgorithm::FixedWindow
    }
}
