//! The datagram channel the sender runs over.
//!
//! 发送端所使用的数据报通道。

pub mod traits;

pub use traits::{AsyncUdpSocket, BindableUdpSocket};

use crate::{config::Config, core::driver::TransferDriver, error::Result};
use std::net::SocketAddr;
use tracing::debug;

/// Binds a socket of type `S` on `local_addr` and returns a driver that sends
/// to `peer`.
///
/// 在 `local_addr` 上绑定类型为 `S` 的套接字，并返回向 `peer` 发送数据的驱动器。
pub async fn bind_sender<S: BindableUdpSocket>(
    local_addr: SocketAddr,
    peer: SocketAddr,
    config: Config,
) -> Result<TransferDriver<S>> {
    let socket = S::bind(local_addr).await?;
    debug!(local = %socket.local_addr()?, %peer, "Sender socket bound");
    TransferDriver::new(socket, peer, config)
}
