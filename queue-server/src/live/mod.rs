//! LiveStatusHub — 队列状态实时分发
//!
//! ```text
//! QueueManager (commit)
//!       │ QueueEvent (queue_update / status_update)
//!       ▼
//! LiveStatusHub
//!   └── broadcast: Sender<QueueEvent> (fan-out, drop-oldest)
//!           │
//!           ▼
//!   Subscription (topic / entry 过滤) ──▶ WebSocket handler
//! ```
//!
//! 发布永不阻塞写路径：broadcast 通道满时丢弃最旧事件，慢订阅者收到
//! `Lagged` 后自行拉取全量快照补齐。

use shared::message::{QueueEvent, Topic};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Broadcast channel 默认容量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// 进程内事件分发中心
#[derive(Debug, Clone)]
pub struct LiveStatusHub {
    tx: broadcast::Sender<QueueEvent>,
}

impl LiveStatusHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 发布事件（无订阅者时 send 返回 Err，安全忽略）
    pub fn publish(&self, event: QueueEvent) {
        let topic = event.topic();
        match self.tx.send(event) {
            Ok(receivers) => tracing::trace!(topic = %topic, receivers, "Event published"),
            Err(_) => tracing::trace!(topic = %topic, "Event dropped: no subscribers"),
        }
    }

    /// Raw receiver, every topic
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Filtered subscription
    pub fn subscribe_filtered(&self, topics: &[Topic], entry_id: Option<u64>) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            filter: SubscriptionFilter::new(topics, entry_id),
        }
    }

    /// Fresh receiver reusing an existing filter (lag recovery)
    pub fn subscribe_with(&self, filter: SubscriptionFilter) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LiveStatusHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Topic / entry filter of one subscriber
#[derive(Debug, Clone)]
pub struct SubscriptionFilter {
    topics: HashSet<Topic>,
    /// Restricts status_update events to one entry
    entry_id: Option<u64>,
}

impl SubscriptionFilter {
    pub fn new(topics: &[Topic], entry_id: Option<u64>) -> Self {
        let topics = if topics.is_empty() {
            Topic::ALL.into_iter().collect()
        } else {
            topics.iter().copied().collect()
        };
        Self { topics, entry_id }
    }

    pub fn wants(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }

    pub fn accepts(&self, event: &QueueEvent) -> bool {
        let topic = event.topic();
        if !self.wants(topic) {
            return false;
        }
        match (topic, self.entry_id) {
            (Topic::StatusUpdate, Some(id)) => event.entry_id() == Some(id),
            _ => true,
        }
    }
}

/// Filtered receiver
pub struct Subscription {
    rx: broadcast::Receiver<QueueEvent>,
    filter: SubscriptionFilter,
}

impl Subscription {
    /// Next accepted event
    ///
    /// `Lagged` is passed through so the caller can resync with a full snapshot.
    pub async fn recv(&mut self) -> Result<QueueEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if self.filter.accepts(&event) {
                return Ok(event);
            }
        }
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }
}
