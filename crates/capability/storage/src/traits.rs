//! 存储接口定义。

use crate::error::StorageError;
use domain::{DeviceRecord, RawPayload};

/// 设备状态缓存：设备键 → (元数据记录, 最近原始报文)。
///
/// 单写流（采集）加并发读（HTTP 查询）。记录与报文必须成对可见。
#[async_trait::async_trait]
pub trait DeviceStateStore: Send + Sync {
    /// 原子覆盖一个键的记录与报文对。
    async fn upsert(
        &self,
        key: &str,
        record: DeviceRecord,
        payload: RawPayload,
    ) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<(DeviceRecord, RawPayload)>, StorageError>;

    /// 某一时刻的整表快照；调用方在锁外做逐条规整。
    async fn list_all(&self) -> Result<Vec<(String, DeviceRecord, RawPayload)>, StorageError>;
}

/// 时序写入端。
#[async_trait::async_trait]
pub trait MeasurementSink: Send + Sync {
    async fn write(
        &self,
        record: &DeviceRecord,
        payload: &RawPayload,
        ts_ms: i64,
    ) -> Result<(), StorageError>;
}
