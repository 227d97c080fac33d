//! ACK 处理器 - 处理确认数据报
//! ACK Processor - Handles acknowledgment datagrams
//!
//! 该模块解析入站确认、推进传输窗口、产生 RTT 样本，
//! 并检测用于快速重传的重复 ACK 序列。
//!
//! This module parses inbound acknowledgments, advances the transmission
//! window, yields RTT samples, and detects duplicate-ACK runs for fast
//! retransmit.

use super::window::TransmissionWindow;
use crate::{error::Result, packet::Ack};
use std::{collections::VecDeque, time::Duration};
use tokio::time::Instant;
use tracing::{debug, trace};

/// What a single inbound acknowledgment did.
///
/// 单个入站确认产生的效果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckOutcome {
    /// The id carried by the datagram.
    pub sequence_id: i32,
    /// Set when the id acknowledged a segment for the first time.
    /// 当该序号首次确认某个数据段时设置。
    pub rtt: Option<Duration>,
    /// Whether the window base moved.
    pub advanced: bool,
    /// Set exactly once per run of identical ids reaching the threshold.
    /// 每组连续相同序号达到阈值时恰好设置一次。
    pub fast_retransmit: bool,
}

impl AckOutcome {
    /// Whether the ACK was stale, out of range, or a duplicate.
    pub fn is_ignored(&self) -> bool {
        self.rtt.is_none()
    }
}

/// Remembers the last `threshold` ids and reports when they are all equal.
///
/// A run fires once; more copies of the same id stay silent until a
/// different id breaks the run.
///
/// 记录最近 `threshold` 个序号，并在它们全部相同时报告。
/// 每组只触发一次；在出现不同序号之前，相同序号的更多副本不会再次触发。
#[derive(Debug, Clone)]
pub struct DuplicateAckTracker {
    history: VecDeque<i32>,
    threshold: usize,
    fired: bool,
}

impl DuplicateAckTracker {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            history: VecDeque::with_capacity(threshold),
            threshold,
            fired: false,
        }
    }

    /// Records `sequence_id` and returns `true` if it completes a run.
    ///
    /// 记录 `sequence_id`，如果它完成了一组重复序列则返回 `true`。
    pub fn observe(&mut self, sequence_id: i32) -> bool {
        if self.history.back() != Some(&sequence_id) {
            self.fired = false;
        }
        self.history.push_back(sequence_id);
        if self.history.len() > self.threshold {
            self.history.pop_front();
        }

        let complete = self.history.len() == self.threshold
            && self.history.iter().all(|&id| id == sequence_id);
        if complete && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    /// The number of identical ids at the end of the history.
    pub fn run_length(&self) -> usize {
        match self.history.back() {
            Some(last) => self.history.iter().rev().take_while(|id| *id == last).count(),
            None => 0,
        }
    }
}

/// Routes inbound acknowledgments into the transmission window.
///
/// 将入站确认路由到传输窗口。
#[derive(Debug)]
pub struct AckProcessor {
    duplicates: DuplicateAckTracker,
}

impl AckProcessor {
    pub fn new(fast_retx_threshold: usize) -> Self {
        Self {
            duplicates: DuplicateAckTracker::new(fast_retx_threshold),
        }
    }

    /// Decodes `datagram` and applies it to `window`.
    ///
    /// Datagrams shorter than a sequence id are rejected with
    /// `Error::InvalidPacket`. Ids outside the window, negative ids and
    /// already acknowledged ids change nothing but still count towards a
    /// duplicate run.
    ///
    /// 解码 `datagram` 并将其应用到 `window`。
    /// 短于序列号长度的数据报会以 `Error::InvalidPacket` 拒绝。
    /// 窗口之外、为负数或已确认的序号不会改变任何状态，但仍计入重复序列。
    pub fn process(
        &mut self,
        datagram: &[u8],
        window: &mut TransmissionWindow,
        now: Instant,
    ) -> Result<AckOutcome> {
        let ack = Ack::decode(datagram)?;
        Ok(self.apply(&ack, window, now))
    }

    /// Applies an already decoded acknowledgment.
    pub fn apply(&mut self, ack: &Ack, window: &mut TransmissionWindow, now: Instant) -> AckOutcome {
        let acknowledgement = ack
            .offset()
            .and_then(|offset| window.acknowledge(offset, now));
        let fast_retransmit = self.duplicates.observe(ack.sequence_id);

        match &acknowledgement {
            Some(a) => trace!(
                seq = ack.sequence_id,
                rtt_ms = a.rtt.as_secs_f64() * 1000.0,
                advanced = a.advanced,
                base = window.base_id(),
                "ACK accepted"
            ),
            None => trace!(
                seq = ack.sequence_id,
                base = window.base_id(),
                next = window.next_send_id(),
                run = self.duplicates.run_length(),
                "ACK ignored"
            ),
        }
        if fast_retransmit {
            debug!(seq = ack.sequence_id, "Duplicate ACK run detected");
        }

        AckOutcome {
            sequence_id: ack.sequence_id,
            rtt: acknowledgement.map(|a| a.rtt),
            advanced: acknowledgement.is_some_and(|a| a.advanced),
            fast_retransmit,
        }
    }
}
