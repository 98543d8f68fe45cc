//! 设备状态内存缓存
//!
//! 使用单把 RwLock 保护记录与报文的配对条目，保证 upsert 的原子性：
//! 读端看到的要么是旧对、要么是新对。

use crate::error::StorageError;
use crate::traits::DeviceStateStore;
use domain::{DeviceRecord, RawPayload};
use std::collections::HashMap;
use std::sync::RwLock;

struct CacheEntry {
    record: DeviceRecord,
    payload: RawPayload,
}

/// 设备状态内存缓存
pub struct InMemoryDeviceState {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryDeviceState {
    /// 创建空缓存
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 当前条目数（用于测试与日志）
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDeviceState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStateStore for InMemoryDeviceState {
    async fn upsert(
        &self,
        key: &str,
        record: DeviceRecord,
        payload: RawPayload,
    ) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.insert(key.to_string(), CacheEntry { record, payload });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<(DeviceRecord, RawPayload)>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(entries
            .get(key)
            .map(|entry| (entry.record.clone(), entry.payload.clone())))
    }

    async fn list_all(&self) -> Result<Vec<(String, DeviceRecord, RawPayload)>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.record.clone(), entry.payload.clone()))
            .collect())
    }
}
