//! 传输窗口 - 在途数据段的簿记
//! Transmission window - bookkeeping for in-flight segments
//!
//! 职责：
//! - 按序列号记录已发送的数据段及其发送时间
//! - 按连续确认前缀推进窗口基址
//! - 标记需要重传的数据段
//!
//! Responsibilities:
//! - Record sent segments and their send times by sequence id
//! - Advance the window base over the contiguous acknowledged prefix
//! - Flag segments that need to be resent

use super::segmenter::Segmenter;
use bytes::Bytes;
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, trace};

/// A segment that has been admitted to the window.
///
/// 已进入窗口的数据段。
#[derive(Debug, Clone)]
pub struct Segment {
    /// Byte offset of the first payload byte.
    /// 首个载荷字节的偏移量。
    pub sequence_id: u32,
    pub payload: Bytes,
    /// Time of the most recent transmission.
    /// 最近一次发送的时间。
    pub sent_at: Instant,
    /// Number of times the segment was put on the wire.
    /// 数据段被发送的次数。
    pub transmissions: u32,
    pub acknowledged: bool,
}

impl Segment {
    /// The sequence id right after this segment.
    pub fn end(&self) -> u32 {
        self.sequence_id + self.payload.len() as u32
    }
}

/// A segment handed to the driver for transmission.
///
/// 交给驱动器发送的数据段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub sequence_id: u32,
    pub payload: Bytes,
    /// Whether the segment had been sent before.
    pub retransmission: bool,
}

/// The result of acknowledging a segment for the first time.
///
/// 首次确认一个数据段的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    /// Time between the segment's latest transmission and the ACK.
    /// 数据段最近一次发送与ACK之间的时间。
    pub rtt: Duration,
    /// Whether the window base moved.
    /// 窗口基址是否前移。
    pub advanced: bool,
}

/// Tracks in-flight segments between `base_id` and `next_send_id`.
///
/// Every stored sequence id lies in `[base_id, next_send_id)`. Segments are
/// evicted once the base moves past them.
///
/// 跟踪位于 `base_id` 与 `next_send_id` 之间的在途数据段。
/// 所有存储的序列号都位于 `[base_id, next_send_id)` 区间内，
/// 基址越过数据段后该数据段即被移除。
#[derive(Debug)]
pub struct TransmissionWindow {
    segmenter: Segmenter,
    base_id: u32,
    next_send_id: u32,
    segments: BTreeMap<u32, Segment>,
    resend: BTreeSet<u32>,
}

impl TransmissionWindow {
    /// Creates a window over the segmenter's buffer. The buffer length must
    /// fit the sequence space.
    pub fn new(segmenter: Segmenter) -> Self {
        Self {
            segmenter,
            base_id: 0,
            next_send_id: 0,
            segments: BTreeMap::new(),
            resend: BTreeSet::new(),
        }
    }

    /// The smallest unacknowledged sequence id.
    pub fn base_id(&self) -> u32 {
        self.base_id
    }

    /// The next offset that has never been sent.
    pub fn next_send_id(&self) -> u32 {
        self.next_send_id
    }

    /// The sequence id one past the last payload byte.
    pub fn end_id(&self) -> u32 {
        self.segmenter.len() as u32
    }

    /// Whether every byte has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base_id >= self.end_id()
    }

    /// The number of admitted, not yet acknowledged segments.
    ///
    /// 已进入窗口但尚未确认的数据段数量。
    pub fn in_flight(&self) -> usize {
        self.segments.values().filter(|s| !s.acknowledged).count()
    }

    /// Whether a retransmission pass is pending.
    pub fn has_pending_resends(&self) -> bool {
        !self.resend.is_empty()
    }

    pub fn get(&self, sequence_id: u32) -> Option<&Segment> {
        self.segments.get(&sequence_id)
    }

    /// The highest sequence id a window of `capacity` segments may admit up
    /// to (exclusive), measured from the base.
    ///
    /// 容量为 `capacity` 个数据段的窗口可以进入的最高序列号（不含），从基址起算。
    pub fn limit_for(&self, capacity: u32) -> u32 {
        let stride = self.segmenter.max_payload_size() as u64;
        let limit = self.base_id as u64 + capacity as u64 * stride;
        limit.min(self.end_id() as u64) as u32
    }

    /// Whether new data may be admitted under `capacity`.
    pub fn has_room(&self, capacity: u32) -> bool {
        self.next_send_id < self.limit_for(capacity)
    }

    /// Admits every segment starting in `[next_send_id, max_sequence_id)` and
    /// returns what has to go on the wire this round: pending resends first,
    /// then the new admissions. Send timestamps are set to `now`.
    ///
    /// 接纳起始位置在 `[next_send_id, max_sequence_id)` 内的所有数据段，
    /// 并返回本轮需要发送的内容：先是待重传的数据段，然后是新接纳的数据段。
    pub fn admit(&mut self, max_sequence_id: u32, now: Instant) -> Vec<Outbound> {
        let mut outbound = Vec::new();

        for seq in std::mem::take(&mut self.resend) {
            if let Some(segment) = self.segments.get_mut(&seq) {
                if segment.acknowledged {
                    continue;
                }
                segment.sent_at = now;
                segment.transmissions += 1;
                outbound.push(Outbound {
                    sequence_id: seq,
                    payload: segment.payload.clone(),
                    retransmission: true,
                });
            }
        }

        let limit = max_sequence_id.min(self.end_id());
        while self.next_send_id < limit {
            let Some((offset, payload)) = self.segmenter.segment_at(self.next_send_id as usize)
            else {
                break;
            };
            let sequence_id = offset as u32;
            let segment = Segment {
                sequence_id,
                payload: payload.clone(),
                sent_at: now,
                transmissions: 1,
                acknowledged: false,
            };
            self.next_send_id = segment.end();
            self.segments.insert(sequence_id, segment);
            trace!(seq = sequence_id, len = payload.len(), "Admitted segment");
            outbound.push(Outbound {
                sequence_id,
                payload,
                retransmission: false,
            });
        }

        outbound
    }

    /// Marks `sequence_id` acknowledged and moves the base over the
    /// contiguous acknowledged prefix. Returns `None` for ids outside
    /// `[base_id, next_send_id)`, ids that are not a segment start, and
    /// segments that were already acknowledged.
    ///
    /// 将 `sequence_id` 标记为已确认，并把基址推进到连续已确认前缀之后。
    /// 对于 `[base_id, next_send_id)` 之外的序列号、非数据段起点的序列号
    /// 以及已确认的数据段，返回 `None`。
    pub fn acknowledge(&mut self, sequence_id: u32, now: Instant) -> Option<Acknowledgement> {
        if sequence_id < self.base_id || sequence_id >= self.next_send_id {
            return None;
        }
        let segment = self.segments.get_mut(&sequence_id)?;
        if segment.acknowledged {
            return None;
        }
        segment.acknowledged = true;
        let rtt = now.saturating_duration_since(segment.sent_at);
        self.resend.remove(&sequence_id);

        let before = self.base_id;
        while let Some(segment) = self.segments.get(&self.base_id) {
            if !segment.acknowledged {
                break;
            }
            let next = segment.end();
            self.segments.remove(&self.base_id);
            self.base_id = next;
        }
        let advanced = self.base_id > before;
        if advanced {
            debug!(from = before, to = self.base_id, "Window base advanced");
        }
        Some(Acknowledgement { rtt, advanced })
    }

    /// Flags every unacknowledged segment for the next `admit`. Nothing is
    /// discarded.
    ///
    /// 将所有未确认的数据段标记为在下一次 `admit` 时重发。不会丢弃任何数据段。
    pub fn mark_all_unacked_for_resend(&mut self) -> usize {
        self.resend.extend(
            self.segments
                .values()
                .filter(|s| !s.acknowledged)
                .map(|s| s.sequence_id),
        );
        self.resend.len()
    }

    /// The segment `retransmit` would resend for `sequence_id`, if any.
    ///
    /// `retransmit` 针对 `sequence_id` 将会重发的数据段（如果有）。
    pub fn retransmit_target(&self, sequence_id: u32) -> Option<u32> {
        [sequence_id, self.base_id].into_iter().find(|seq| {
            self.segments
                .get(seq)
                .is_some_and(|segment| !segment.acknowledged)
        })
    }

    /// Takes a single unacknowledged segment out for an immediate resend,
    /// updating its send time. Falls back to the window base when
    /// `sequence_id` is not an outstanding segment.
    ///
    /// 取出单个未确认的数据段立即重发并更新其发送时间。
    /// 如果 `sequence_id` 不是未确认的数据段，则退而使用窗口基址。
    pub fn retransmit(&mut self, sequence_id: u32, now: Instant) -> Option<Outbound> {
        let seq = self.retransmit_target(sequence_id)?;
        let segment = self.segments.get_mut(&seq)?;
        segment.sent_at = now;
        segment.transmissions += 1;
        self.resend.remove(&seq);
        Some(Outbound {
            sequence_id: seq,
            payload: segment.payload.clone(),
            retransmission: true,
        })
    }
}
