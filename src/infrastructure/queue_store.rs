//! 批量队列持久化 - 基础设施层
//!
//! 队列记录是编排器与协调器之间唯一的持久交接点，两者运行在
//! 相互独立的任务里，不共享内存状态。记录作为一个整体读写，
//! clear 一次性移除全部字段，绝不留下悬空的半截记录。

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::BatchQueue;

/// 队列记录存取能力
pub trait QueueStore: Send + Sync {
    /// 读取当前记录（不存在时返回 None）
    fn load(&self) -> Result<Option<BatchQueue>>;
    /// 整体写入记录
    fn save(&self, queue: &BatchQueue) -> Result<()>;
    /// 整体清除记录（幂等）
    fn clear(&self) -> Result<()>;
}

/// 基于 JSON 文件的队列记录
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QueueStore for FileQueueStore {
    fn load(&self) -> Result<Option<BatchQueue>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("读取队列记录失败: {}", self.path.display()))?;
        let queue = serde_json::from_str(&text)
            .with_context(|| format!("队列记录格式损坏: {}", self.path.display()))?;
        Ok(Some(queue))
    }

    fn save(&self, queue: &BatchQueue) -> Result<()> {
        let text = serde_json::to_string_pretty(queue)?;
        // 先写临时文件再改名，避免写到一半的记录被读到
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, text)
            .with_context(|| format!("写入队列记录失败: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("替换队列记录失败: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("清除队列记录失败: {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// 内存实现（测试用）
#[derive(Default)]
pub struct MemoryQueueStore {
    inner: Mutex<Option<BatchQueue>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> Result<Option<BatchQueue>> {
        let guard = self.inner.lock().map_err(|_| anyhow::anyhow!("队列锁中毒"))?;
        Ok(guard.clone())
    }

    fn save(&self, queue: &BatchQueue) -> Result<()> {
        let mut guard = self.inner.lock().map_err(|_| anyhow::anyhow!("队列锁中毒"))?;
        *guard = Some(queue.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.inner.lock().map_err(|_| anyhow::anyhow!("队列锁中毒"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CarrierMethod;

    fn sample_queue() -> BatchQueue {
        BatchQueue::start(
            vec![
                CarrierMethod {
                    name: "Carrier A".to_string(),
                    pending_count: 5,
                    selector: "100".to_string(),
                },
                CarrierMethod {
                    name: "Carrier B".to_string(),
                    pending_count: 2,
                    selector: "200".to_string(),
                },
            ],
            Some("https://seller.example/portal/sale/mass/ship".to_string()),
        )
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));

        assert!(store.load().unwrap().is_none());

        let queue = sample_queue();
        store.save(&queue).unwrap();
        assert_eq!(store.load().unwrap(), Some(queue));
    }

    #[test]
    fn clear_removes_record_as_a_unit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));

        store.save(&sample_queue()).unwrap();
        store.clear().unwrap();

        // 清除后不应残留任何队列字段
        assert!(store.load().unwrap().is_none());
        assert!(!dir.path().join("queue.json").exists());

        // 幂等
        store.clear().unwrap();
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));

        let mut queue = sample_queue();
        store.save(&queue).unwrap();

        queue.cursor = 1;
        queue.spawned_tab = Some("https://seller.example/print/1".to_string());
        store.save(&queue).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.cursor, 1);
        assert!(loaded.spawned_tab.is_some());
    }

    #[test]
    fn memory_store_matches_contract() {
        let store = MemoryQueueStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&sample_queue()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
