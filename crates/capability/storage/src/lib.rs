//! # Meterd Storage 模块
//!
//! 本模块提供设备状态缓存与时序写入两类存储能力。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`DeviceStateStore`（设备最近状态）
//!    与 `MeasurementSink`（时序点写入）的异步 Trait 接口
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **在线判定层** (`online.rs`)：基于 last_seen 年龄的在线/离线派生
//! 4. **实现层**：
//!    - `in_memory/`：设备状态内存缓存（进程内唯一权威数据源）
//!    - `influx.rs`：InfluxDB v2 line protocol 写入实现
//!
//! ## 核心约束
//!
//! - **配对原子性**：设备记录与最近报文成对覆盖，读端看到的要么是
//!   旧对、要么是新对，不会出现新记录配旧报文
//! - **快照读取**：`list_all` 取某一时刻的整表快照，调用方在锁外做
//!   规整与格式化
//! - **写入隔离**：时序后端不可用或写入失败只影响当条数据，不影响
//!   采集链路
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use meterd_storage::{DeviceStateStore, InMemoryDeviceState};
//!
//! let cache = InMemoryDeviceState::new();
//! cache.upsert("th/site001/pg46/001", record, payload).await?;
//! let entries = cache.list_all().await?;
//! ```

pub mod error;
pub mod in_memory;
pub mod influx;
pub mod online;
pub mod traits;

pub use error::*;
pub use influx::{InfluxConfig, InfluxSink, NoopSink};
pub use in_memory::InMemoryDeviceState;
pub use online::{age_seconds, is_online, now_epoch_ms};
pub use traits::*;
