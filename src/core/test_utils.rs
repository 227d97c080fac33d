//! Common testing infrastructure for driver tests.

use crate::{
    config::Config,
    congestion::CongestionAlgorithm,
    core::driver::TransferDriver,
    testing::{LinkBehavior, SimulatedLink, TEST_RECEIVER_ADDR},
};
use std::{sync::Once, time::Duration};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "udp_arq=debug".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A configuration with short timeouts, suitable for paused-time tests.
pub fn test_config(algorithm: CongestionAlgorithm) -> Config {
    let mut config = Config::with_algorithm(algorithm);
    config.reliability.ack_timeout = Duration::from_millis(500);
    config.reliability.fin_retry_interval = Duration::from_millis(500);
    config.reliability.fin_max_retries = 2;
    config
}

/// A driver talking to a simulated receiver.
pub fn driver_with(behavior: LinkBehavior, config: Config) -> TransferDriver<SimulatedLink> {
    init_tracing();
    TransferDriver::new(SimulatedLink::new(behavior), TEST_RECEIVER_ADDR, config).unwrap()
}

/// A deterministic, non-repeating payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
