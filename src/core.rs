//! The windowed ARQ engine.
//! 窗口化 ARQ 引擎。

pub mod driver;
pub mod metrics;
pub mod reliability;

#[cfg(test)]
pub mod test_utils;
