use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: Instant,
}

#[derive(Debug)]
struct QueueInner {
    entries: VecDeque<Notification>,
    next_id: u64,
}

/// Ordered, bounded queue of toast messages.
///
/// When full, the oldest entry is evicted to make room.
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    inner: Arc<RwLock<QueueInner>>,
    capacity: usize,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(QueueInner {
                entries: VecDeque::with_capacity(capacity.max(1)),
                next_id: 1,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Append a notification and return its id.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let message = message.into();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        while inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.entries.pop_front() {
                debug!("Notification queue full, evicting #{}", evicted.id);
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        match kind {
            NotificationKind::Success => info!("[{}] {}", kind, message),
            NotificationKind::Error => warn!("[{}] {}", kind, message),
        }

        inner.entries.push_back(Notification {
            id,
            kind,
            message,
            created_at: Instant::now(),
        });

        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message)
    }

    /// Remove one entry. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|n| n.id != id);
        inner.entries.len() != before
    }

    /// Drop every entry older than `ttl`, returning how many were removed.
    pub fn expire(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner
            .entries
            .retain(|n| now.duration_since(n.created_at) < ttl);
        before - inner.entries.len()
    }

    /// Take everything, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .drain(..)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
