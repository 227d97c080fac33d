//! The transfer driver: the sender's control loop.
//!
//! Each iteration fills the window up to the congestion controller's capacity,
//! sends, then waits a bounded time for ACKs. A wait during which the window
//! base never moves is a retransmission timeout. Once every byte is
//! acknowledged the driver sends the end-of-stream sentinel and completes the
//! FIN exchange.
//!
//! 传输驱动器：发送端的控制循环。
//!
//! 每次迭代按拥塞控制器给出的容量填充窗口并发送，然后在有限时间内等待ACK。
//! 如果整个等待期间窗口基址都没有前移，即视为重传超时。
//! 所有字节都被确认后，驱动器发送流结束标记并完成 FIN 交换。

use crate::{
    config::Config,
    congestion::{self, CongestionControl},
    core::{
        metrics::{MetricsCollector, TransferReport},
        reliability::{
            ack_processor::AckProcessor,
            segmenter::Segmenter,
            window::{Outbound, TransmissionWindow},
        },
    },
    error::{Error, Result},
    packet::{Ack, Frame},
    socket::AsyncUdpSocket,
};
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use tokio::{
    sync::watch,
    time::{Instant, timeout_at},
};
use tracing::{Instrument, debug, info, info_span, trace, warn};

/// The phase the driver is in.
///
/// 驱动器所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No transfer has started yet.
    Idle,
    /// Admitting and sending new segments.
    Sending,
    /// Blocked on the channel, waiting for ACKs.
    AwaitingAcks,
    /// An ACK moved the window base.
    Advancing,
    /// Resending every unacknowledged segment after a timeout.
    Retransmitting,
    /// All data acknowledged, closing the stream.
    Draining,
    /// The last transfer ended, successfully or not.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Progress,
    TimedOut,
}

/// State owned by a single transfer.
struct Transfer {
    window: TransmissionWindow,
    acks: AckProcessor,
    metrics: MetricsCollector,
}

/// Sends a byte buffer reliably to a single peer over an unreliable channel.
///
/// A driver can run several transfers one after another; every transfer gets
/// a fresh window, ACK processor, congestion controller and metrics.
///
/// 通过不可靠通道将字节缓冲区可靠地发送给单个对端。
/// 一个驱动器可以依次运行多次传输；每次传输都有全新的窗口、ACK处理器、
/// 拥塞控制器和统计。
pub struct TransferDriver<S> {
    socket: S,
    peer: SocketAddr,
    config: Config,
    congestion_control: Box<dyn CongestionControl>,
    cancel: Option<watch::Receiver<bool>>,
    state: DriverState,
    send_buf: BytesMut,
    recv_buf: Vec<u8>,
}

impl<S: AsyncUdpSocket> TransferDriver<S> {
    /// Creates a driver with the controller selected by the configuration.
    ///
    /// 使用配置选定的拥塞控制器创建驱动器。
    pub fn new(socket: S, peer: SocketAddr, config: Config) -> Result<Self> {
        config.validate()?;
        let congestion_control = congestion::build(&config.congestion_control);
        Ok(Self {
            socket,
            peer,
            send_buf: BytesMut::with_capacity(config.connection.max_packet_size),
            recv_buf: vec![0; config.connection.max_packet_size],
            config,
            congestion_control,
            cancel: None,
            state: DriverState::Idle,
        })
    }

    /// Ends the transfer with `Error::Cancelled` once `cancel` reads `true`.
    /// The signal is checked at the top of every iteration and while waiting
    /// for ACKs.
    ///
    /// 当 `cancel` 为 `true` 时以 `Error::Cancelled` 结束传输。
    /// 每次迭代开始时以及等待ACK期间都会检查该信号。
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn congestion_control(&self) -> &dyn CongestionControl {
        self.congestion_control.as_ref()
    }

    /// Transfers `data` and returns the transfer's metrics.
    ///
    /// Timeouts and malformed or duplicate ACKs are handled internally; only a
    /// failing channel, cancellation, or an exhausted timeout budget end the
    /// transfer early.
    ///
    /// 传输 `data` 并返回本次传输的统计。
    /// 超时以及格式错误或重复的ACK都在内部处理；只有通道故障、取消
    /// 或超时预算耗尽才会提前结束传输。
    pub async fn run(&mut self, data: impl Into<Bytes>) -> Result<TransferReport> {
        let data = data.into();
        let span = info_span!(
            "transfer",
            algorithm = %self.congestion_control.algorithm(),
            peer = %self.peer,
            bytes = data.len(),
        );
        let result = self.transfer(data).instrument(span).await;
        self.state = DriverState::Closed;
        result
    }

    async fn transfer(&mut self, data: Bytes) -> Result<TransferReport> {
        if data.len() > i32::MAX as usize {
            return Err(Error::PayloadTooLarge(data.len()));
        }

        self.congestion_control = congestion::build(&self.config.congestion_control);
        let segmenter = Segmenter::new(data, self.config.connection.max_payload_size());
        let mut transfer = Transfer {
            window: TransmissionWindow::new(segmenter),
            acks: AckProcessor::new(self.config.reliability.fast_retx_threshold),
            metrics: MetricsCollector::new(Instant::now()),
        };
        info!(end = transfer.window.end_id(), "Transfer started");

        let mut consecutive_timeouts = 0u32;
        while !transfer.window.is_complete() {
            self.check_cancelled()?;

            self.state = if transfer.window.has_pending_resends() {
                DriverState::Retransmitting
            } else {
                DriverState::Sending
            };
            let capacity = self.capacity();
            let limit = transfer.window.limit_for(capacity);
            for segment in transfer.window.admit(limit, Instant::now()) {
                self.send_segment(&segment, &mut transfer.metrics).await?;
            }

            self.state = DriverState::AwaitingAcks;
            match self.await_acks(&mut transfer).await? {
                WaitOutcome::Progress => consecutive_timeouts = 0,
                WaitOutcome::TimedOut => {
                    consecutive_timeouts += 1;
                    transfer.metrics.record_timeout();
                    self.congestion_control.on_timeout();
                    let pending = transfer.window.mark_all_unacked_for_resend();
                    warn!(
                        base = transfer.window.base_id(),
                        pending,
                        cwnd = self.congestion_control.congestion_window(),
                        "ACK timeout, resending unacknowledged segments"
                    );
                    if let Some(max) = self.config.reliability.max_consecutive_timeouts {
                        if consecutive_timeouts >= max {
                            return Err(Error::ConnectionTimeout(consecutive_timeouts));
                        }
                    }
                }
            }
        }

        let end_id = transfer.window.end_id();
        let mut report = transfer.metrics.finish(Instant::now());
        info!(
            bytes_sent = report.bytes_sent,
            elapsed_ms = report.elapsed.as_millis() as u64,
            retransmissions = report.retransmissions,
            timeouts = report.timeouts,
            "All data acknowledged"
        );

        report.closed_cleanly = self.drain(end_id).await?;
        Ok(report)
    }

    fn capacity(&self) -> u32 {
        self.congestion_control.congestion_window().max(1)
    }

    /// Waits for ACKs until the window can take new data, the transfer is
    /// complete, or the deadline passes.
    ///
    /// 等待ACK，直到窗口可以接纳新数据、传输完成或超过截止时间。
    async fn await_acks(&mut self, transfer: &mut Transfer) -> Result<WaitOutcome> {
        let deadline = Instant::now() + self.config.reliability.ack_timeout;
        let mut advanced = false;

        while let Some(len) = self.recv_until(deadline).await? {
            let now = Instant::now();
            let outcome =
                match transfer
                    .acks
                    .process(&self.recv_buf[..len], &mut transfer.window, now)
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(len, error = %e, "Discarding malformed ACK");
                        continue;
                    }
                };

            if let Some(rtt) = outcome.rtt {
                transfer.metrics.record_rtt(rtt);
            }
            if outcome.advanced {
                advanced = true;
                self.state = DriverState::Advancing;
                self.congestion_control.on_ack_advance();
            }
            if outcome.fast_retransmit {
                self.fast_retransmit(transfer, outcome.sequence_id).await?;
            }

            if transfer.window.is_complete() {
                return Ok(WaitOutcome::Progress);
            }
            if advanced && transfer.window.has_room(self.capacity()) {
                return Ok(WaitOutcome::Progress);
            }
            self.state = DriverState::AwaitingAcks;
        }

        Ok(if advanced {
            WaitOutcome::Progress
        } else {
            WaitOutcome::TimedOut
        })
    }

    /// Resends the segment a duplicate-ACK run points at. The controller is
    /// only told about the run when there is a data segment to resend, so
    /// negative ids such as stray FIN replies never touch the window.
    ///
    /// 重发重复ACK序列所指向的数据段。只有存在可重发的数据段时才通知控制器，
    /// 因此负序号（例如残留的 FIN 回复）不会影响窗口。
    async fn fast_retransmit(&mut self, transfer: &mut Transfer, sequence_id: i32) -> Result<()> {
        let Some(target) = u32::try_from(sequence_id)
            .ok()
            .and_then(|id| transfer.window.retransmit_target(id))
        else {
            trace!(seq = sequence_id, "Duplicate ACK run with nothing to resend");
            return Ok(());
        };
        if !self.congestion_control.on_duplicate_ack(sequence_id) {
            return Ok(());
        }
        if let Some(segment) = transfer.window.retransmit(target, Instant::now()) {
            debug!(
                seq = segment.sequence_id,
                cwnd = self.congestion_control.congestion_window(),
                "Fast retransmit"
            );
            transfer.metrics.record_fast_retransmit();
            self.send_segment(&segment, &mut transfer.metrics).await?;
        }
        Ok(())
    }

    /// Sends the end-of-stream sentinel until the receiver answers with its
    /// FIN, then acknowledges it with `==FINACK`. Returns whether the
    /// exchange completed.
    ///
    /// 重复发送流结束标记直到接收端回复 FIN，然后用 `==FINACK` 确认。
    /// 返回交换是否完成。
    async fn drain(&mut self, end_id: u32) -> Result<bool> {
        self.state = DriverState::Draining;
        let retries = self.config.reliability.fin_max_retries;

        for attempt in 0..=retries {
            self.check_cancelled()?;
            self.send_frame(&Frame::EndOfStream).await?;
            debug!(attempt, "End-of-stream sentinel sent");

            let deadline = Instant::now() + self.config.reliability.fin_retry_interval;
            while let Some(len) = self.recv_until(deadline).await? {
                let decoded = Ack::decode(&self.recv_buf[..len]);
                match decoded {
                    Ok(ack) if ack.is_fin() => {
                        self.send_frame(&Frame::FinAck {
                            sequence_id: end_id,
                        })
                        .await?;
                        info!("Receiver closed the stream, FINACK sent");
                        return Ok(true);
                    }
                    Ok(ack) => trace!(seq = ack.sequence_id, "Ignoring ACK while draining"),
                    Err(_) => warn!(len, "Discarding malformed datagram while draining"),
                }
            }
        }

        warn!(
            attempts = u32::from(retries) + 1,
            "Receiver never answered the end-of-stream sentinel"
        );
        Ok(false)
    }

    async fn send_segment(
        &mut self,
        segment: &Outbound,
        metrics: &mut MetricsCollector,
    ) -> Result<()> {
        let frame = Frame::Data {
            sequence_id: segment.sequence_id,
            payload: segment.payload.clone(),
        };
        let len = self.send_frame(&frame).await?;
        metrics.record_send(len, segment.retransmission);
        trace!(
            seq = segment.sequence_id,
            len,
            retx = segment.retransmission,
            "Segment sent"
        );
        Ok(())
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send_buf.clear();
        frame.encode(&mut self.send_buf);
        self.socket.send_to(&self.send_buf, self.peer).await?;
        Ok(self.send_buf.len())
    }

    /// Receives one datagram from the peer into `recv_buf`, or `None` once
    /// `deadline` passes. Datagrams from other addresses are dropped.
    ///
    /// 从对端接收一个数据报到 `recv_buf`；超过 `deadline` 时返回 `None`。
    /// 来自其他地址的数据报会被丢弃。
    async fn recv_until(&mut self, deadline: Instant) -> Result<Option<usize>> {
        loop {
            let received = tokio::select! {
                received = timeout_at(deadline, self.socket.recv_from(&mut self.recv_buf)) => received,
                _ = cancelled(&mut self.cancel) => return Err(Error::Cancelled),
            };
            match received {
                Err(_elapsed) => return Ok(None),
                Ok(Err(e)) => return Err(e),
                Ok(Ok((len, from))) if from == self.peer => return Ok(Some(len)),
                Ok(Ok((len, from))) => {
                    trace!(%from, len, "Ignoring datagram from unexpected address");
                }
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(cancel) if *cancel.borrow() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Resolves once the cancellation signal reads `true`. Never resolves without
/// a signal, or after its sender is gone.
async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    let Some(cancel) = cancel else {
        return std::future::pending::<()>().await;
    };
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return std::future::pending::<()>().await;
        }
    }
}
