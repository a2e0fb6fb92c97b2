//! Dismissable user-facing notifications.
//!
//! Failed mutations are never surfaced as errors to the view; they end up here
//! as a human readable message the user can dismiss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A message shown to the user until dismissed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Bounded set of active notifications, newest last.
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct Notifications {
    tx: Arc<watch::Sender<Vec<Notification>>>,
    next_id: Arc<AtomicU64>,
    limit: usize,
}

impl Notifications {
    /// Create an empty notification set keeping at most `limit` entries
    pub fn new(limit: usize) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            tx: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
            limit: limit.max(1),
        }
    }

    /// Add a notification, dropping the oldest ones beyond the limit
    pub fn push(&self, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            message: message.into(),
            created_at: Utc::now(),
        };
        let limit = self.limit;
        self.tx.send_modify(|active| {
            active.push(notification);
            if active.len() > limit {
                let excess = active.len() - limit;
                active.drain(..excess);
            }
        });
        id
    }

    /// Remove a notification. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        self.tx.send_if_modified(|active| {
            let before = active.len();
            active.retain(|n| n.id != id);
            active.len() != before
        })
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|active| {
            let changed = !active.is_empty();
            active.clear();
            changed
        });
    }

    /// Snapshot of the active notifications
    pub fn active(&self) -> Vec<Notification> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.tx.subscribe()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(crate::config::EngineConfig::default().max_notifications)
    }
}
