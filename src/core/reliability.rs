//! The reliability layer.
//!
//! This layer is responsible for segmentation, the transmission window,
//! acknowledgments, and duplicate-ACK detection. It holds no I/O; the driver
//! feeds it datagrams and timestamps.
//!
//! 可靠性层。
//!
//! 该层负责分段、传输窗口、确认以及重复ACK检测。它不做任何I/O；
//! 由驱动器向其提供数据报和时间戳。

pub mod ack_processor;
pub mod segmenter;
pub mod window;
