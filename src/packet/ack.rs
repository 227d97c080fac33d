//! 定义了接收端发回的确认数据报。
//! Defines the acknowledgment datagram sent back by the receiver.

use super::{FIN_PAYLOAD, SEQUENCE_ID_SIZE};
use crate::error::{Error, Result};
use bytes::{Buf, BufMut, Bytes};

/// An inbound acknowledgment.
///
/// Only the leading sequence id carries meaning for the sender. Anything after
/// it is an optional echo that is kept for logging and FIN detection.
///
/// 一个入站确认。
///
/// 对发送端而言只有开头的序列号有意义，其后的内容是可选的回显，
/// 仅用于日志和 FIN 检测。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// The acknowledged sequence id, as signed on the wire.
    /// 被确认的序列号（线上为有符号数）。
    pub sequence_id: i32,
    /// Trailing bytes after the id.
    /// 序列号之后的尾随字节。
    pub payload: Bytes,
}

impl Ack {
    /// Creates an acknowledgment with an empty echo.
    pub fn new(sequence_id: i32) -> Self {
        Self {
            sequence_id,
            payload: Bytes::new(),
        }
    }

    /// Whether this datagram is the receiver's FIN.
    ///
    /// 该数据报是否为接收端的 FIN。
    pub fn is_fin(&self) -> bool {
        self.payload.starts_with(FIN_PAYLOAD)
    }

    /// The id as an offset into the payload, if it can be one.
    ///
    /// 如果序列号可以作为载荷偏移量，则返回该偏移量。
    pub fn offset(&self) -> Option<u32> {
        u32::try_from(self.sequence_id).ok()
    }

    /// 从缓冲区解码确认。
    /// Decodes an acknowledgment from a datagram.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < SEQUENCE_ID_SIZE {
            return Err(Error::InvalidPacket);
        }
        let sequence_id = buf.get_i32();
        Ok(Self {
            sequence_id,
            payload: Bytes::copy_from_slice(buf),
        })
    }

    /// 将确认编码到缓冲区。
    /// Encodes the acknowledgment into a buffer.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32(self.sequence_id);
        buf.put_slice(&self.payload);
    }
}
