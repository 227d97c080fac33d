//! tests/common/harness.rs
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::{
    Arc, Once,
    atomic::{AtomicU16, Ordering},
};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing_subscriber::fmt::format::FmtSpan;
use udp_arq::{Config, CongestionAlgorithm, TransferDriver, socket::bind_sender};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "udp_arq=info,transfer=info".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .try_init();
    });
}

// Use a global atomic to assign a new port for each receiver and sender.
// This avoids port conflicts when running tests in parallel.
static NEXT_PORT: AtomicU16 = AtomicU16::new(41000);

fn next_addr() -> SocketAddr {
    let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);
    format!("127.0.0.1:{}", port).parse().unwrap()
}

/// What the reference receiver saw.
#[derive(Debug, Default)]
pub struct ReceivedStream {
    pub data: Vec<u8>,
    pub finack: Option<i32>,
    pub datagrams: usize,
}

/// A reference receiver: acknowledges every segment with `ack`, answers the
/// end-of-stream sentinel with `ack` and `fin`, then waits for `==FINACK`.
pub struct TestReceiver {
    pub addr: SocketAddr,
    handle: JoinHandle<ReceivedStream>,
}

impl TestReceiver {
    /// Binds a receiver that drops the first transmission of every offset in
    /// `drop_first`.
    pub async fn spawn(drop_first: impl IntoIterator<Item = u32>) -> Self {
        init_tracing();
        let addr = next_addr();
        let socket = Arc::new(UdpSocket::bind(addr).await.unwrap());
        let drop_first: HashSet<u32> = drop_first.into_iter().collect();
        let handle = tokio::spawn(receive(socket, drop_first));
        Self { addr, handle }
    }

    /// Waits for the receiver to see the FINACK, or gives up after a while.
    pub async fn finish(self) -> ReceivedStream {
        tokio::time::timeout(std::time::Duration::from_secs(30), self.handle)
            .await
            .expect("receiver did not finish")
            .unwrap()
    }
}

async fn receive(socket: Arc<UdpSocket>, mut drop_first: HashSet<u32>) -> ReceivedStream {
    let mut segments = BTreeMap::new();
    let mut stream = ReceivedStream::default();
    let mut buf = [0u8; 2048];

    loop {
        let (len, from) = socket.recv_from(&mut buf).await.unwrap();
        stream.datagrams += 1;
        if len < 4 {
            continue;
        }
        let id = i32::from_be_bytes(buf[..4].try_into().unwrap());
        let payload = &buf[4..len];

        if payload == b"==FINACK" {
            stream.finack = Some(id);
            break;
        }
        if id == -1 {
            let mut reply = (-1i32).to_be_bytes().to_vec();
            reply.extend_from_slice(b"ack");
            socket.send_to(&reply, from).await.unwrap();
            let mut fin = (-1i32).to_be_bytes().to_vec();
            fin.extend_from_slice(b"fin");
            socket.send_to(&fin, from).await.unwrap();
            continue;
        }

        let offset = id as u32;
        if drop_first.remove(&offset) {
            continue;
        }
        segments.insert(offset, payload.to_vec());
        let mut ack = id.to_be_bytes().to_vec();
        ack.extend_from_slice(b"ack");
        socket.send_to(&ack, from).await.unwrap();
    }

    for (offset, payload) in segments {
        assert_eq!(offset as usize, stream.data.len(), "gap before offset {offset}");
        stream.data.extend_from_slice(&payload);
    }
    stream
}

/// Binds a sender on a fresh loopback port that talks to `receiver`.
pub async fn sender_for(
    receiver: &TestReceiver,
    algorithm: CongestionAlgorithm,
) -> TransferDriver<UdpSocket> {
    let mut config = Config::with_algorithm(algorithm);
    config.reliability.ack_timeout = std::time::Duration::from_millis(100);
    config.reliability.fin_retry_interval = std::time::Duration::from_millis(100);
    bind_sender::<UdpSocket>(next_addr(), receiver.addr, config)
        .await
        .unwrap()
}

/// A deterministic, non-repeating payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 17 % 253) as u8).collect()
}
