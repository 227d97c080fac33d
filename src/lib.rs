#![deny(clippy::expect_used, clippy::unwrap_used)]

//! A reliable, congestion-controlled byte-stream sender over UDP.
//! 基于 UDP 的可靠、带拥塞控制的字节流发送端。

pub mod config;
pub mod error;
pub mod packet;
pub mod socket;

pub mod congestion;
pub mod core;

#[cfg(test)]
mod testing;

pub use crate::{
    config::Config,
    congestion::CongestionAlgorithm,
    core::{
        driver::{DriverState, TransferDriver},
        metrics::TransferReport,
    },
    error::{Error, Result},
};
