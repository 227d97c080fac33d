//! 测试辅助工具模块
//! Test utilities module
//!
//! A simulated receiver behind the `AsyncUdpSocket` interface. Every datagram
//! the sender emits is handed to an in-memory receiver which can drop data,
//! drop or delay ACKs, and repeat its last in-order ACK when it sees a gap.

#![cfg(test)]

use crate::{
    error::{Error, Result},
    packet::{Ack, END_OF_STREAM_ID, Frame},
    socket::AsyncUdpSocket,
};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    collections::{BTreeMap, HashMap},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::{Mutex as AsyncMutex, mpsc};

pub const TEST_SENDER_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5002);
pub const TEST_RECEIVER_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5001);

/// How the simulated receiver acknowledges data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Every arriving segment is acknowledged with its own id.
    Selective,
    /// In-order segments are acknowledged with their own id. A segment beyond
    /// a gap is buffered and answered with a repeat of the last in-order id.
    DuplicateOnGap,
}

/// Knobs for the simulated link and receiver.
#[derive(Debug, Clone)]
pub struct LinkBehavior {
    pub ack_mode: AckMode,
    /// Drops the first `n` transmissions of the data segment at an offset.
    pub drop_data: HashMap<u32, u32>,
    /// Drops the first `n` ACKs for an offset.
    pub drop_acks: HashMap<u32, u32>,
    /// Probability of losing any data segment.
    pub loss_rate: f64,
    pub seed: u64,
    /// Fixed delay before an ACK reaches the sender.
    pub ack_delay: Duration,
    /// Extra random delay added on top of `ack_delay`.
    pub ack_jitter: Duration,
    /// Whether the receiver answers the end-of-stream sentinel.
    pub answer_fin: bool,
    /// Sends fail once this many datagrams went through.
    pub fail_after_sends: Option<usize>,
}

impl Default for LinkBehavior {
    fn default() -> Self {
        Self {
            ack_mode: AckMode::Selective,
            drop_data: HashMap::new(),
            drop_acks: HashMap::new(),
            loss_rate: 0.0,
            seed: 7,
            ack_delay: Duration::ZERO,
            ack_jitter: Duration::ZERO,
            answer_fin: true,
            fail_after_sends: None,
        }
    }
}

/// Everything the receiver observed.
#[derive(Debug, Default)]
pub struct ReceiverLog {
    /// Offsets in the order they were put on the wire, dropped ones included.
    pub wire_order: Vec<u32>,
    pub transmissions: HashMap<u32, u32>,
    pub delivered: BTreeMap<u32, Bytes>,
    pub end_of_stream: usize,
    pub fin_acks: Vec<u32>,
    pub datagrams: usize,
}

impl ReceiverLog {
    /// The delivered segments glued back together.
    pub fn reassembled(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (offset, payload) in &self.delivered {
            assert_eq!(*offset as usize, out.len(), "gap before offset {offset}");
            out.extend_from_slice(payload);
        }
        out
    }
}

struct ReceiverState {
    behavior: LinkBehavior,
    rng: StdRng,
    expected: u32,
    last_in_order: Option<u32>,
    buffered: BTreeMap<u32, Bytes>,
    log: ReceiverLog,
}

/// An `AsyncUdpSocket` whose far end is a simulated receiver.
pub struct SimulatedLink {
    state: Arc<Mutex<ReceiverState>>,
    to_sender: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
    from_receiver: AsyncMutex<mpsc::UnboundedReceiver<(Bytes, SocketAddr)>>,
}

impl SimulatedLink {
    pub fn new(behavior: LinkBehavior) -> Self {
        let (to_sender, from_receiver) = mpsc::unbounded_channel();
        let rng = StdRng::seed_from_u64(behavior.seed);
        Self {
            state: Arc::new(Mutex::new(ReceiverState {
                behavior,
                rng,
                expected: 0,
                last_in_order: None,
                buffered: BTreeMap::new(),
                log: ReceiverLog::default(),
            })),
            to_sender,
            from_receiver: AsyncMutex::new(from_receiver),
        }
    }

    /// Runs `f` against the receiver's log.
    pub fn with_log<R>(&self, f: impl FnOnce(&ReceiverLog) -> R) -> R {
        f(&self.state.lock().unwrap().log)
    }

    /// Delivers a raw datagram to the sender as if it came from `from`.
    pub fn inject(&self, datagram: &[u8], from: SocketAddr) {
        self.to_sender
            .send((Bytes::copy_from_slice(datagram), from))
            .unwrap();
    }

    fn ack_datagram(sequence_id: i32, echo: &'static [u8]) -> Bytes {
        let mut buf = BytesMut::new();
        Ack {
            sequence_id,
            payload: Bytes::from_static(echo),
        }
        .encode(&mut buf);
        buf.freeze()
    }

    fn deliver(&self, state: &mut ReceiverState, datagram: Bytes) {
        let jitter = state.behavior.ack_jitter;
        let delay = if jitter.is_zero() {
            state.behavior.ack_delay
        } else {
            state.behavior.ack_delay + jitter.mul_f64(state.rng.random::<f64>())
        };
        if delay.is_zero() {
            let _ = self.to_sender.send((datagram, TEST_RECEIVER_ADDR));
            return;
        }
        let tx = self.to_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send((datagram, TEST_RECEIVER_ADDR));
        });
    }

    fn ack(&self, state: &mut ReceiverState, offset: u32) {
        if let Some(remaining) = state.behavior.drop_acks.get_mut(&offset) {
            if *remaining > 0 {
                *remaining -= 1;
                return;
            }
        }
        self.deliver(state, Self::ack_datagram(offset as i32, b"ack"));
    }

    fn on_data(&self, state: &mut ReceiverState, offset: u32, payload: Bytes) {
        state.log.wire_order.push(offset);
        *state.log.transmissions.entry(offset).or_default() += 1;

        if let Some(remaining) = state.behavior.drop_data.get_mut(&offset) {
            if *remaining > 0 {
                *remaining -= 1;
                return;
            }
        }
        if state.behavior.loss_rate > 0.0 {
            let loss_rate = state.behavior.loss_rate;
            if state.rng.random_bool(loss_rate) {
                return;
            }
        }

        match state.behavior.ack_mode {
            AckMode::Selective => {
                state.log.delivered.insert(offset, payload);
                self.ack(state, offset);
            }
            AckMode::DuplicateOnGap => {
                if offset < state.expected {
                    self.ack(state, offset);
                } else if offset == state.expected {
                    let mut next = Some((offset, payload));
                    while let Some((seq, payload)) = next {
                        state.expected = seq + payload.len() as u32;
                        state.last_in_order = Some(seq);
                        state.log.delivered.insert(seq, payload);
                        self.ack(state, seq);
                        let expected = state.expected;
                        next = state.buffered.remove(&expected).map(|p| (expected, p));
                    }
                } else {
                    state.buffered.entry(offset).or_insert(payload);
                    if let Some(last) = state.last_in_order {
                        self.ack(state, last);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl AsyncUdpSocket for SimulatedLink {
    async fn send_to(&self, buf: &[u8], _target: SocketAddr) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.behavior.fail_after_sends {
            if state.log.datagrams >= limit {
                return Err(Error::Io(std::io::Error::other("link down")));
            }
        }
        state.log.datagrams += 1;

        match Frame::decode(buf) {
            Some(Frame::Data {
                sequence_id,
                payload,
            }) => self.on_data(&mut state, sequence_id, payload),
            Some(Frame::EndOfStream) => {
                state.log.end_of_stream += 1;
                if state.behavior.answer_fin {
                    self.deliver(&mut state, Self::ack_datagram(END_OF_STREAM_ID, b"ack"));
                    self.deliver(&mut state, Self::ack_datagram(END_OF_STREAM_ID, b"fin"));
                }
            }
            Some(Frame::FinAck { sequence_id }) => state.log.fin_acks.push(sequence_id),
            None => {}
        }
        Ok(buf.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let mut rx = self.from_receiver.lock().await;
        let Some((datagram, from)) = rx.recv().await else {
            return Err(Error::Io(std::io::ErrorKind::BrokenPipe.into()));
        };
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok((len, from))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(TEST_SENDER_ADDR)
    }
}
