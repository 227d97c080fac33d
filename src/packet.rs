//! The packet module, containing the datagram layout shared by the sender and
//! its receiver.
//! packet 模块，包含发送端与接收端共享的数据报布局。
//!
//! Every datagram is `[4-byte big-endian signed sequence id][payload]`.
//! 每个数据报的格式为 `[4字节大端有符号序列号][载荷]`。

pub mod ack;
pub mod frame;

/// The largest datagram the sender emits.
/// 发送端发出的最大数据报。
pub const MAX_PACKET_SIZE: usize = 1024;

/// Bytes reserved at the front of every datagram for the sequence id.
/// 每个数据报开头为序列号保留的字节数。
pub const SEQUENCE_ID_SIZE: usize = 4;

/// The payload budget of a default-sized data segment.
/// 默认大小数据段的载荷上限。
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - SEQUENCE_ID_SIZE;

/// The sequence id of the end-of-stream sentinel.
/// 流结束标记的序列号。
pub const END_OF_STREAM_ID: i32 = -1;

/// The payload the sender uses to acknowledge the receiver's FIN.
/// 发送端用于确认接收端 FIN 的载荷。
pub const FIN_ACK_PAYLOAD: &[u8] = b"==FINACK";

/// The payload prefix the receiver uses for its FIN.
/// 接收端 FIN 使用的载荷前缀。
pub const FIN_PAYLOAD: &[u8] = b"fin";

pub use ack::Ack;
pub use frame::Frame;
