//! 基于 redb 的排队存储层
//!
//! # 表结构
//!
//! | 表 | Key | Value | 用途 |
//! |----|-----|-------|------|
//! | `entries` | `entry_id` | `Entry` (JSON) | 所有未清理的排队记录 |
//! | `sequence_counter` | `"entry_id"` | `u64` | 单调递增 id 分配 |
//! | `service_history` | `(completed_at, entry_id)` | `ServiceRecord` (JSON) | 已完成服务的时长 |
//! | `settings` | `"admin"` | `AdminSettings` (JSON) | 运行时设置 |
//!
//! 删除 entry 不影响历史。每个服务类型只保留最近 `window` 条历史，
//! 更早的在追加时裁掉。
//!
//! # 持久性
//!
//! redb 默认 `Durability::Immediate`：`commit()` 返回后修改即可在崩溃后
//! 保留，文件始终保持一致。

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{AdminSettings, Entry, ServiceRecord};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// entries 表: key = entry id, value = JSON 序列化的 Entry
const ENTRIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("entries");

/// 序列计数表: key = 计数器名, value = 最后分配的值
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

/// 服务历史表: key = (completed_at, entry_id), value = JSON 序列化的 ServiceRecord
const HISTORY_TABLE: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("service_history");

/// 设置表: key = 设置名, value = JSON
const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

const ENTRY_ID_KEY: &str = "entry_id";
const ADMIN_SETTINGS_KEY: &str = "admin";

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// redb 排队存储
#[derive(Clone)]
pub struct QueueStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for QueueStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStorage").finish_non_exhaustive()
    }
}

impl QueueStorage {
    /// 打开或创建数据库
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// 内存数据库（测试和临时实例）
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // 建表（已存在则跳过）
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
            let _ = write_txn.open_table(HISTORY_TABLE)?;
            let _ = write_txn.open_table(SETTINGS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(ENTRY_ID_KEY)?.is_none() {
                seq_table.insert(ENTRY_ID_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// 开启写事务
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// 在事务内递增并返回下一个 entry id
    pub fn next_entry_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(ENTRY_ID_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ENTRY_ID_KEY, next)?;
        Ok(next)
    }

    // ========== Entry Operations ==========

    /// 插入或覆盖 entry
    pub fn store_entry(&self, txn: &WriteTransaction, entry: &Entry) -> StorageResult<()> {
        let mut table = txn.open_table(ENTRIES_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert(entry.id, value.as_slice())?;
        Ok(())
    }

    /// 删除 entry，返回是否存在
    pub fn remove_entry(&self, txn: &WriteTransaction, id: u64) -> StorageResult<bool> {
        let mut table = txn.open_table(ENTRIES_TABLE)?;
        let removed = table.remove(id)?.is_some();
        Ok(removed)
    }

    /// 按 id 顺序加载全部 entry
    pub fn load_entries(&self) -> StorageResult<Vec<Entry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    // ========== Service History ==========

    /// 追加一条历史，并裁掉同服务类型中超出 `window` 的最旧记录
    ///
    /// 返回裁掉的条数。
    pub fn append_history(
        &self,
        txn: &WriteTransaction,
        record: &ServiceRecord,
        window: usize,
    ) -> StorageResult<usize> {
        let mut table = txn.open_table(HISTORY_TABLE)?;
        let value = serde_json::to_vec(record)?;
        table.insert((record.completed_at, record.entry_id), value.as_slice())?;

        let mut same_type: Vec<(i64, u64)> = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let existing: ServiceRecord = serde_json::from_slice(value.value())?;
            if existing.service_type == record.service_type {
                same_type.push(key.value());
            }
        }
        // key 按 completed_at 升序，前面的最旧
        let excess = same_type.len().saturating_sub(window.max(1));
        for key in &same_type[..excess] {
            table.remove(*key)?;
        }
        Ok(excess)
    }

    /// 全部历史记录，按完成时间从旧到新
    pub fn load_history(&self) -> StorageResult<Vec<ServiceRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HISTORY_TABLE)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    // ========== Settings ==========

    pub fn store_settings(&self, txn: &WriteTransaction, settings: &AdminSettings) -> StorageResult<()> {
        let mut table = txn.open_table(SETTINGS_TABLE)?;
        let value = serde_json::to_vec(settings)?;
        table.insert(ADMIN_SETTINGS_KEY, value.as_slice())?;
        Ok(())
    }

    pub fn load_settings(&self) -> StorageResult<Option<AdminSettings>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;
        match table.get(ADMIN_SETTINGS_KEY)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Statistics ==========

    /// 各表行数，供健康检查使用
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        let entries_table = read_txn.open_table(ENTRIES_TABLE)?;
        let history_table = read_txn.open_table(HISTORY_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            entry_count: entries_table.len()?,
            history_count: history_table.len()?,
            last_entry_id: seq_table
                .get(ENTRY_ID_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// 存储统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub entry_count: u64,
    pub history_count: u64,
    pub last_entry_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{EntryStatus, ServiceType};

    fn create_test_entry(id: u64) -> Entry {
        Entry {
            id,
            name: format!("Guest {}", id),
            phone: Some("555-0100".to_string()),
            email: None,
            party_size: 2,
            service_type: ServiceType::DineIn,
            location: "Main Dining".to_string(),
            status: EntryStatus::Waiting,
            notes: None,
            created_at: 1_000 * id as i64,
            updated_at: None,
            serving_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let storage = QueueStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_entry_id(&txn).unwrap(), 1);
        assert_eq!(storage.next_entry_id(&txn).unwrap(), 2);
        txn.commit().unwrap();
        assert_eq!(storage.get_stats().unwrap().last_entry_id, 2);
    }

    #[test]
    fn test_aborted_transaction_leaves_no_trace() {
        let storage = QueueStorage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            let id = storage.next_entry_id(&txn).unwrap();
            storage.store_entry(&txn, &create_test_entry(id)).unwrap();
            // dropped without commit
        }
        assert_eq!(storage.get_stats().unwrap().last_entry_id, 0);
        assert!(storage.load_entries().unwrap().is_empty());
    }

    #[test]
    fn test_store_and_remove_entry() {
        let storage = QueueStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.store_entry(&txn, &create_test_entry(1)).unwrap();
        storage.store_entry(&txn, &create_test_entry(2)).unwrap();
        txn.commit().unwrap();

        let names: Vec<String> = storage.load_entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Guest 1", "Guest 2"]);

        let txn = storage.begin_write().unwrap();
        assert!(storage.remove_entry(&txn, 1).unwrap());
        assert!(!storage.remove_entry(&txn, 99).unwrap());
        txn.commit().unwrap();

        let ids: Vec<u64> = storage.load_entries().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2]);
        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_history_is_ordered_by_completion() {
        let storage = QueueStorage::open_in_memory().unwrap();
        let record = |entry_id: u64, completed_at: i64| ServiceRecord {
            entry_id,
            service_type: ServiceType::Takeout,
            location: "Takeout Counter".to_string(),
            party_size: 1,
            service_minutes: 10.0,
            total_minutes: 20.0,
            created_at: 0,
            completed_at,
        };

        let txn = storage.begin_write().unwrap();
        storage.append_history(&txn, &record(2, 5_000), 10).unwrap();
        storage.append_history(&txn, &record(1, 9_000), 10).unwrap();
        storage.append_history(&txn, &record(3, 1_000), 10).unwrap();
        txn.commit().unwrap();

        let ids: Vec<u64> = storage
            .load_history()
            .unwrap()
            .iter()
            .map(|r| r.entry_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_history_is_trimmed_per_service_type() {
        let storage = QueueStorage::open_in_memory().unwrap();
        let record = |entry_id: u64, service_type: ServiceType, completed_at: i64| ServiceRecord {
            entry_id,
            service_type,
            location: "Main Dining".to_string(),
            party_size: 2,
            service_minutes: entry_id as f64,
            total_minutes: entry_id as f64,
            created_at: 0,
            completed_at,
        };

        let txn = storage.begin_write().unwrap();
        let mut trimmed = 0;
        for id in 1..=5 {
            trimmed += storage
                .append_history(&txn, &record(id, ServiceType::Takeout, id as i64 * 1_000), 3)
                .unwrap();
        }
        // other service types keep their own window
        storage
            .append_history(&txn, &record(6, ServiceType::DineIn, 500), 3)
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(trimmed, 2);
        let kept: Vec<(u64, ServiceType)> = storage
            .load_history()
            .unwrap()
            .iter()
            .map(|r| (r.entry_id, r.service_type))
            .collect();
        assert_eq!(
            kept,
            vec![
                (6, ServiceType::DineIn),
                (3, ServiceType::Takeout),
                (4, ServiceType::Takeout),
                (5, ServiceType::Takeout),
            ]
        );
        assert_eq!(storage.get_stats().unwrap().history_count, 4);
    }

    #[test]
    fn test_settings_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.redb");
        {
            let storage = QueueStorage::open(&path).unwrap();
            assert!(storage.load_settings().unwrap().is_none());
            let settings = AdminSettings {
                max_queue_size: 7,
                ..Default::default()
            };
            let txn = storage.begin_write().unwrap();
            storage.store_settings(&txn, &settings).unwrap();
            txn.commit().unwrap();
        }

        let reopened = QueueStorage::open(&path).unwrap();
        assert_eq!(reopened.load_settings().unwrap().unwrap().max_queue_size, 7);
    }
}
