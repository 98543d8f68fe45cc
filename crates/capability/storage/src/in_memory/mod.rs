//! 内存存储实现模块
//!
//! 设备状态缓存的进程内实现，采集链路的权威最近状态来源。

pub mod device_state;

pub use device_state::*;
