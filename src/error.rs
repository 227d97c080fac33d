//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the windowed ARQ sender.
/// 窗口化 ARQ 发送端的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying datagram channel reported a fault. This always ends the
    /// transfer.
    /// 底层数据报通道报告了故障，传输将因此终止。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A received datagram was too short or carried an unusable sequence id.
    /// 接收到的数据报过短或携带了无法使用的序列号。
    #[error("Invalid packet received")]
    InvalidPacket,

    /// The payload cannot be addressed by the 4-byte signed sequence id.
    /// 载荷过大，无法用4字节有符号序列号寻址。
    #[error("payload of {0} bytes exceeds the addressable sequence space")]
    PayloadTooLarge(usize),

    /// The configuration is inconsistent.
    /// 配置不一致。
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured budget of consecutive retransmission timeouts ran out.
    /// 连续重传超时次数超过了配置的上限。
    #[error("Connection timed out after {0} consecutive retransmission timeouts")]
    ConnectionTimeout(u32),

    /// The transfer was cancelled by its owner.
    /// 传输被其所有者取消。
    #[error("Transfer cancelled")]
    Cancelled,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::InvalidPacket => ErrorKind::InvalidData.into(),
            Error::PayloadTooLarge(_) => ErrorKind::InvalidInput.into(),
            Error::InvalidConfig(msg) => std::io::Error::new(ErrorKind::InvalidInput, msg),
            Error::ConnectionTimeout(_) => ErrorKind::TimedOut.into(),
            Error::Cancelled => ErrorKind::Interrupted.into(),
        }
    }
}
