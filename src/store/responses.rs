//! Response table correlating message identifiers with their outcome.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Processing status of a queued message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Processing,
    Completed,
    Failed,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MessageStatus::Processing)
    }
}

/// Outcome record for one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message_id: String,
    pub user_id: String,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub queued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

struct Inner {
    entries: HashMap<String, MessageResponse>,
    order: VecDeque<String>,
}

/// Capacity-bounded map of message id to response.
///
/// Inserting past capacity evicts the oldest terminal entries. Finishing a
/// message never evicts, and entries still `processing` are never evicted, so
/// the table may exceed its capacity while a backlog is pending.
pub struct ResponseTable {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl ResponseTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Insert a `processing` entry for a freshly queued message.
    pub fn insert_processing(&self, message_id: &str, user_id: &str, queued_at: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.entries.insert(
            message_id.to_string(),
            MessageResponse {
                message_id: message_id.to_string(),
                user_id: user_id.to_string(),
                status: MessageStatus::Processing,
                reply: None,
                error: None,
                queued_at,
                completed_at: None,
            },
        );
        inner.order.push_back(message_id.to_string());
        self.evict_overflow(&mut inner);
    }

    /// Mark a message completed with its reply.
    pub fn complete(&self, message_id: &str, reply: String) -> bool {
        self.finish(message_id, MessageStatus::Completed, Some(reply), None)
    }

    /// Mark a message failed with a caller-safe summary.
    pub fn fail(&self, message_id: &str, summary: &str) -> bool {
        self.finish(message_id, MessageStatus::Failed, None, Some(summary.to_string()))
    }

    /// Look up a message's response.
    pub fn get(&self, message_id: &str) -> Option<MessageResponse> {
        self.inner.lock().entries.get(message_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transition a processing entry to a terminal state exactly once.
    fn finish(
        &self,
        message_id: &str,
        status: MessageStatus,
        reply: Option<String>,
        error: Option<String>,
    ) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.get_mut(message_id) else {
            return false;
        };
        if entry.status.is_terminal() {
            return false;
        }

        entry.status = status;
        entry.reply = reply;
        entry.error = error;
        entry.completed_at = Some(Utc::now());
        true
    }

    fn evict_overflow(&self, inner: &mut Inner) {
        while inner.entries.len() > self.capacity {
            let position = inner.order.iter().position(|id| {
                inner
                    .entries
                    .get(id)
                    .is_some_and(|entry| entry.status.is_terminal())
            });

            let Some(position) = position else {
                break;
            };

            if let Some(id) = inner.order.remove(position) {
                inner.entries.remove(&id);
                debug!("evicted response {}", id);
            }
        }
    }
}
