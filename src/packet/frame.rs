//! 定义了发送端可以在网络上传输的数据帧。
//! Defines the frames the sender puts on the wire.

use super::{END_OF_STREAM_ID, FIN_ACK_PAYLOAD, SEQUENCE_ID_SIZE};
use bytes::{Buf, BufMut, Bytes};

/// A frame sent from the sender to the receiver.
/// 从发送端发往接收端的帧。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A data segment addressed by the byte offset of its first payload byte.
    /// 以首个载荷字节的偏移量寻址的数据段。
    Data { sequence_id: u32, payload: Bytes },
    /// The end-of-stream sentinel: id `-1` and no payload.
    /// 流结束标记：序列号为 `-1` 且没有载荷。
    EndOfStream,
    /// The sender's acknowledgment of the receiver's FIN.
    /// 发送端对接收端 FIN 的确认。
    FinAck { sequence_id: u32 },
}

impl Frame {
    /// The number of bytes `encode` writes.
    ///
    /// `encode` 写入的字节数。
    pub fn encoded_len(&self) -> usize {
        SEQUENCE_ID_SIZE
            + match self {
                Frame::Data { payload, .. } => payload.len(),
                Frame::EndOfStream => 0,
                Frame::FinAck { .. } => FIN_ACK_PAYLOAD.len(),
            }
    }

    /// 将帧编码到缓冲区。
    /// Encodes the frame into a buffer.
    ///
    /// Sequence ids are written as signed 32-bit integers; the driver refuses
    /// payloads whose offsets would not fit.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            Frame::Data {
                sequence_id,
                payload,
            } => {
                buf.put_i32(*sequence_id as i32);
                buf.put_slice(payload);
            }
            Frame::EndOfStream => buf.put_i32(END_OF_STREAM_ID),
            Frame::FinAck { sequence_id } => {
                buf.put_i32(*sequence_id as i32);
                buf.put_slice(FIN_ACK_PAYLOAD);
            }
        }
    }

    /// 从缓冲区解码帧。
    /// Decodes a frame, as a receiver would.
    pub fn decode(mut buf: &[u8]) -> Option<Self> {
        if buf.remaining() < SEQUENCE_ID_SIZE {
            return None;
        }
        let id = buf.get_i32();
        if id == END_OF_STREAM_ID && buf.is_empty() {
            return Some(Frame::EndOfStream);
        }
        let sequence_id = u32::try_from(id).ok()?;
        if buf == FIN_ACK_PAYLOAD {
            return Some(Frame::FinAck { sequence_id });
        }
        Some(Frame::Data {
            sequence_id,
            payload: Bytes::copy_from_slice(buf),
        })
    }
}
