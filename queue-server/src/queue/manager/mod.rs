//! QueueManager - 串行写入、快照读取的 entry store
//!
//! 本模块负责：
//! - 按服务目录和设置校验取号请求
//! - 状态流转（只进不退）
//! - redb 持久化（每次修改一个事务）
//! - 每次提交后重算快照
//! - 向 [`LiveStatusHub`] 发布事件
//!
//! # 修改流程
//!
//! ```text
//! create / set_status / delete / cleanup / update_settings
//!     ├─ 1. 获取写锁
//!     ├─ 2. 复制已提交状态
//!     ├─ 3. 在副本上校验并修改
//!     ├─ 4. 单个写事务持久化并提交
//!     ├─ 5. 重算快照
//!     ├─ 6. 替换已提交状态（读者看不到中间态）
//!     └─ 7. 发布事件（不阻塞）
//! ```
//!
//! 读者只克隆已提交的 `Arc<QueueState>`，除指针替换外不等待写者。

mod error;
pub use error::*;

use super::analytics;
use super::estimator::ServiceHistory;
use super::ordering;
use super::snapshot::build_snapshot;
use super::storage::{QueueStorage, StorageStats};
use crate::live::LiveStatusHub;
use parking_lot::{Mutex, RwLock};
use redb::WriteTransaction;
use shared::client::{ExportBundle, ReservationDetail};
use shared::message::{QueueEvent, UpdateReason};
use shared::models::{
    AdminSettings, AdminSettingsUpdate, AnalyticsSummary, Entry, EntryDraft, EntryFilter,
    EntryStatus, EntryStatusUpdate, HourlyWait, MAX_PARTY_SIZE, MIN_PARTY_SIZE, PublicEntry,
    QueueSnapshot, ServiceCatalog, ServiceRecord,
};
use shared::util::now_millis;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// 顾客姓名最大长度（字符）
pub const MAX_NAME_LEN: usize = 100;

/// 管理员备注最大长度（字符）
pub const MAX_NOTES_LEN: usize = 500;

/// 已提交的不可变状态
#[derive(Debug, Clone)]
pub struct QueueState {
    pub entries: BTreeMap<u64, Entry>,
    pub history: ServiceHistory,
    pub settings: AdminSettings,
    pub snapshot: QueueSnapshot,
    /// 已分配的最大 `created_at`，时钟回拨时保持 FIFO 稳定
    last_created_at: i64,
}

impl QueueState {
    fn refresh_snapshot(&mut self, catalog: &ServiceCatalog, now: i64) {
        self.snapshot = build_snapshot(
            self.entries.values(),
            catalog,
            &self.history,
            &self.settings,
            now,
        );
    }

    fn waiting_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == EntryStatus::Waiting)
            .count()
    }
}

/// 取号结果
#[derive(Debug, Clone)]
pub struct CreatedEntry {
    pub entry: Entry,
    /// 在所属分区内的位置（从 1 开始）
    pub position: u32,
    pub estimated_wait: f64,
}

/// 修改过程中暂存的事件，提交后发布
enum PendingEvent {
    Status { old: EntryStatus, entry: Entry },
    Queue { reason: UpdateReason, entry_id: Option<u64> },
}

/// 排队记录生命周期与快照管理
pub struct QueueManager {
    storage: QueueStorage,
    catalog: Arc<ServiceCatalog>,
    hub: LiveStatusHub,
    /// 串行化写者；读者使用 `committed`
    writer: Mutex<()>,
    committed: RwLock<Arc<QueueState>>,
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("storage", &"<QueueStorage>")
            .field("hub", &"<LiveStatusHub>")
            .finish()
    }
}

impl QueueManager {
    /// 打开 `db_path` 处的存储并加载已提交状态
    pub fn new(
        db_path: impl AsRef<Path>,
        catalog: ServiceCatalog,
        hub: LiveStatusHub,
        history_window: usize,
    ) -> ManagerResult<Self> {
        let storage = QueueStorage::open(db_path)?;
        Self::with_storage(storage, catalog, hub, history_window)
    }

    /// 使用已有存储创建 QueueManager
    pub fn with_storage(
        storage: QueueStorage,
        catalog: ServiceCatalog,
        hub: LiveStatusHub,
        history_window: usize,
    ) -> ManagerResult<Self> {
        let entries: BTreeMap<u64, Entry> = storage
            .load_entries()?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let records = storage.load_history()?;
        let history = ServiceHistory::from_records(history_window, &records);
        let settings = storage.load_settings()?.unwrap_or_default();
        let last_created_at = entries.values().map(|e| e.created_at).max().unwrap_or(0);

        let mut state = QueueState {
            entries,
            history,
            settings,
            snapshot: QueueSnapshot::default(),
            last_created_at,
        };
        state.refresh_snapshot(&catalog, now_millis());

        tracing::info!(
            entries = state.entries.len(),
            waiting = state.snapshot.total_waiting,
            history = records.len(),
            "QueueManager loaded"
        );

        Ok(Self {
            storage,
            catalog: Arc::new(catalog),
            hub,
            writer: Mutex::new(()),
            committed: RwLock::new(Arc::new(state)),
        })
    }

    // ========== Read path ==========

    /// 最近一次提交的状态
    pub fn state(&self) -> Arc<QueueState> {
        self.committed.read().clone()
    }

    /// 最近一次提交时计算的快照，`last_updated` 为提交时间
    pub fn snapshot(&self) -> QueueSnapshot {
        self.state().snapshot.clone()
    }

    /// 已提交快照，`last_updated` 改为 `now`
    ///
    /// 用于对外推送和查询：时间戳反映的是发出时刻。
    pub fn snapshot_at(&self, now: i64) -> QueueSnapshot {
        let mut snapshot = self.snapshot();
        snapshot.last_updated = now;
        snapshot
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn hub(&self) -> &LiveStatusHub {
        &self.hub
    }

    pub fn settings(&self) -> AdminSettings {
        self.state().settings.clone()
    }

    pub fn get(&self, id: u64) -> ManagerResult<Entry> {
        self.state()
            .entries
            .get(&id)
            .cloned()
            .ok_or(QueueError::EntryNotFound(id))
    }

    /// 符合 `filter` 的 entry，旧的在前
    pub fn list(&self, filter: &EntryFilter) -> Vec<Entry> {
        let state = self.state();
        let mut entries: Vec<Entry> = state
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(ordering::fifo);
        entries
    }

    /// 公开视图的 entry 及其当前位置和预计等待
    pub fn reservation_detail(&self, id: u64) -> ManagerResult<ReservationDetail> {
        let state = self.state();
        let entry = state
            .entries
            .get(&id)
            .map(PublicEntry::from)
            .ok_or(QueueError::EntryNotFound(id))?;
        Ok(ReservationDetail {
            queue_position: state.snapshot.position_of(id),
            estimated_wait: state.snapshot.prediction_for(id).map(|p| p.estimated_wait),
            entry,
        })
    }

    pub fn analytics(&self, now: i64) -> AnalyticsSummary {
        let state = self.state();
        analytics::summarize(state.entries.values(), &state.snapshot, &self.catalog, now)
    }

    pub fn wait_times(&self) -> Vec<HourlyWait> {
        analytics::hourly_waits(self.state().entries.values())
    }

    pub fn export(&self) -> ManagerResult<ExportBundle> {
        let state = self.state();
        Ok(ExportBundle {
            exported_at: now_millis(),
            entries: state.entries.values().cloned().collect(),
            service_history: self.storage.load_history()?,
        })
    }

    pub fn storage_stats(&self) -> ManagerResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    // ========== Write path ==========

    /// 执行一次修改：副本上校验、持久化、替换、发布
    fn apply<T>(
        &self,
        op: impl FnOnce(&QueueStorage, &WriteTransaction, &mut QueueState, &mut Vec<PendingEvent>) -> ManagerResult<T>,
    ) -> ManagerResult<(T, Arc<QueueState>)> {
        let _writer = self.writer.lock();
        let mut next = QueueState::clone(&self.state());
        let mut events = Vec::new();

        let txn = self.storage.begin_write()?;
        let value = op(&self.storage, &txn, &mut next, &mut events)?;
        txn.commit()?;

        next.refresh_snapshot(&self.catalog, now_millis());
        let next = Arc::new(next);
        *self.committed.write() = next.clone();

        for pending in events {
            let event = match pending {
                PendingEvent::Status { old, entry } => QueueEvent::status_update(old, &entry),
                PendingEvent::Queue { reason, entry_id } => {
                    QueueEvent::queue_update(reason, entry_id, next.snapshot.clone())
                }
            };
            self.hub.publish(event);
        }

        Ok((value, next))
    }

    /// 取号，新 entry 为 waiting
    pub fn create(&self, draft: EntryDraft) -> ManagerResult<CreatedEntry> {
        let (entry, state) = self.apply(|storage, txn, state, events| {
            let draft = self.validate_draft(draft)?;

            let max_queue_size = state.settings.max_queue_size;
            if max_queue_size > 0 && state.waiting_count() >= max_queue_size as usize {
                return Err(QueueError::QueueFull(max_queue_size));
            }

            let id = storage.next_entry_id(txn)?;
            let created_at = now_millis().max(state.last_created_at);
            let entry = Entry {
                id,
                name: draft.name,
                phone: draft.phone,
                email: draft.email,
                party_size: draft.party_size,
                service_type: draft.service_type,
                location: draft.location.unwrap_or_default(),
                status: EntryStatus::Waiting,
                notes: None,
                created_at,
                updated_at: None,
                serving_at: None,
                resolved_at: None,
            };
            storage.store_entry(txn, &entry)?;

            state.last_created_at = created_at;
            state.entries.insert(id, entry.clone());
            events.push(PendingEvent::Queue {
                reason: UpdateReason::Created,
                entry_id: Some(id),
            });
            Ok(entry)
        })?;

        let position = state.snapshot.position_of(entry.id).unwrap_or(1);
        let estimated_wait = state
            .snapshot
            .prediction_for(entry.id)
            .map(|p| p.estimated_wait)
            .unwrap_or(0.0);

        tracing::info!(
            entry_id = entry.id,
            service_type = %entry.service_type,
            location = %entry.location,
            position,
            "Queue entry created"
        );

        Ok(CreatedEntry {
            entry,
            position,
            estimated_wait,
        })
    }

    /// 规范化取号请求并按服务目录校验
    fn validate_draft(&self, mut draft: EntryDraft) -> ManagerResult<EntryDraft> {
        draft.name = draft.name.trim().to_string();
        if draft.name.is_empty() {
            return Err(QueueError::validation("name", "name must not be empty"));
        }
        if draft.name.chars().count() > MAX_NAME_LEN {
            return Err(QueueError::validation(
                "name",
                format!("name must be at most {} characters", MAX_NAME_LEN),
            ));
        }
        draft.phone = normalize_optional(draft.phone);
        draft.email = normalize_optional(draft.email);

        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&draft.party_size) {
            return Err(QueueError::validation(
                "party_size",
                format!(
                    "party_size must be between {} and {}",
                    MIN_PARTY_SIZE, MAX_PARTY_SIZE
                ),
            ));
        }

        let service = self
            .catalog
            .get(draft.service_type)
            .ok_or(QueueError::UnknownServiceType(draft.service_type))?;
        if draft.party_size > service.max_party_size {
            return Err(QueueError::PartySizeExceeded {
                service_type: draft.service_type,
                party_size: draft.party_size,
                max: service.max_party_size,
            });
        }

        let location = match normalize_optional(draft.location) {
            Some(location) => location,
            None => service
                .default_location()
                .map(|l| l.name.clone())
                .ok_or_else(|| QueueError::LocationNotAllowed {
                    service_type: draft.service_type,
                    location: String::new(),
                })?,
        };
        if service.location(&location).is_none() {
            return Err(QueueError::LocationNotAllowed {
                service_type: draft.service_type,
                location,
            });
        }
        draft.location = Some(location);

        Ok(draft)
    }

    /// 修改状态和/或备注
    ///
    /// 状态不变但带备注时只更新备注（不发 status_update）；状态不变且无备注
    /// 时什么也不做。
    pub fn set_status(&self, id: u64, update: EntryStatusUpdate) -> ManagerResult<Entry> {
        let notes = match update.notes {
            Some(notes) => {
                let notes = notes.trim().to_string();
                if notes.chars().count() > MAX_NOTES_LEN {
                    return Err(QueueError::validation(
                        "notes",
                        format!("notes must be at most {} characters", MAX_NOTES_LEN),
                    ));
                }
                Some(notes)
            }
            None => None,
        };

        let current = self.get(id)?;
        if current.status == update.status && notes.is_none() {
            return Ok(current);
        }

        let (entry, _) = self.apply(|storage, txn, state, events| {
            let entry = state
                .entries
                .get_mut(&id)
                .ok_or(QueueError::EntryNotFound(id))?;
            let old = entry.status;
            let now = now_millis();

            if old != update.status {
                if !old.can_transition_to(update.status) {
                    return Err(QueueError::InvalidTransition {
                        from: old,
                        to: update.status,
                    });
                }
                entry.status = update.status;
                if update.status == EntryStatus::Serving {
                    entry.serving_at = Some(now);
                }
                if update.status.is_resolved() {
                    entry.resolved_at = Some(now);
                }
            }
            if let Some(notes) = notes {
                entry.notes = (!notes.is_empty()).then_some(notes);
            }
            entry.updated_at = Some(now);
            storage.store_entry(txn, entry)?;

            let entry = entry.clone();
            if old != entry.status {
                if let Some(record) = ServiceRecord::from_completed(&entry) {
                    let trimmed = storage.append_history(txn, &record, state.history.window())?;
                    if trimmed > 0 {
                        tracing::debug!(trimmed, service_type = %record.service_type, "Service history trimmed");
                    }
                    state.history.record(&record);
                }
                events.push(PendingEvent::Status {
                    old,
                    entry: entry.clone(),
                });
                events.push(PendingEvent::Queue {
                    reason: UpdateReason::StatusChanged,
                    entry_id: Some(id),
                });
            } else {
                events.push(PendingEvent::Queue {
                    reason: UpdateReason::NotesUpdated,
                    entry_id: Some(id),
                });
            }
            Ok((old, entry))
        })?;

        let (old, entry) = entry;
        if old != entry.status {
            tracing::info!(entry_id = id, from = %old, to = %entry.status, "Queue entry status changed");
        } else {
            tracing::debug!(entry_id = id, "Queue entry notes updated");
        }
        Ok(entry)
    }

    /// 硬删除 entry（不同于取消）
    pub fn delete(&self, id: u64) -> ManagerResult<Entry> {
        let (entry, _) = self.apply(|storage, txn, state, events| {
            let entry = state
                .entries
                .remove(&id)
                .ok_or(QueueError::EntryNotFound(id))?;
            storage.remove_entry(txn, id)?;
            events.push(PendingEvent::Queue {
                reason: UpdateReason::Deleted,
                entry_id: Some(id),
            });
            Ok(entry)
        })?;
        tracing::info!(entry_id = id, status = %entry.status, "Queue entry deleted");
        Ok(entry)
    }

    /// 删除超过 TTL 的已完成/已取消记录
    ///
    /// 返回删除条数；自动清理关闭时为 0。
    pub fn cleanup_resolved(&self, now: i64) -> ManagerResult<usize> {
        let state = self.state();
        if !state.settings.auto_cleanup {
            return Ok(0);
        }
        let ttl_millis = i64::from(state.settings.cleanup_after_minutes) * 60_000;
        let expired: Vec<u64> = state
            .entries
            .values()
            .filter(|e| e.status.is_resolved())
            .filter(|e| e.resolved_at.is_some_and(|at| at + ttl_millis <= now))
            .map(|e| e.id)
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }

        let (removed, _) = self.apply(|storage, txn, state, events| {
            let mut removed = 0;
            for id in &expired {
                // 期间可能已被管理员删除
                if state.entries.remove(id).is_some() {
                    storage.remove_entry(txn, *id)?;
                    removed += 1;
                }
            }
            if removed > 0 {
                events.push(PendingEvent::Queue {
                    reason: UpdateReason::Cleanup,
                    entry_id: None,
                });
            }
            Ok(removed)
        })?;

        if removed > 0 {
            tracing::info!(removed, "Resolved queue entries cleaned up");
        }
        Ok(removed)
    }

    /// 应用部分设置更新并持久化
    pub fn update_settings(&self, update: AdminSettingsUpdate) -> ManagerResult<AdminSettings> {
        let (settings, _) = self.apply(|storage, txn, state, events| {
            let mut settings = state.settings.clone();
            settings
                .apply(update, now_millis())
                .map_err(QueueError::InvalidSettings)?;
            storage.store_settings(txn, &settings)?;
            state.settings = settings.clone();
            events.push(PendingEvent::Queue {
                reason: UpdateReason::SettingsChanged,
                entry_id: None,
            });
            Ok(settings)
        })?;
        tracing::info!(
            max_wait_time = settings.max_wait_time,
            notification_interval = settings.notification_interval,
            auto_cleanup = settings.auto_cleanup,
            "Admin settings updated"
        );
        Ok(settings)
    }

    /// 推送当前快照（定时广播），`last_updated` 为推送时间
    pub fn publish_snapshot(&self, reason: UpdateReason) {
        self.hub.publish(QueueEvent::queue_update(
            reason,
            None,
            self.snapshot_at(now_millis()),
        ));
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests;
