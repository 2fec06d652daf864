//! Inbound message queue.
//!
//! A single global FIFO. Enqueue registers the message in the response table
//! before the message becomes visible to the processor, so every identifier
//! handed to a caller can be looked up immediately.

mod processor;

pub use processor::{MessageProcessor, ProcessorHandle, ProcessorState};

use crate::error::{PokeError, Result};
use crate::store::{RecordStore, ResponseTable};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A message waiting to be processed.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub message_id: String,
    pub user_id: String,
    pub content: String,
    pub queued_at: DateTime<Utc>,
}

/// FIFO of pending messages.
pub struct MessageQueue {
    pending: Mutex<VecDeque<QueuedMessage>>,
    records: Arc<RecordStore>,
    responses: Arc<ResponseTable>,
}

impl MessageQueue {
    pub fn new(records: Arc<RecordStore>, responses: Arc<ResponseTable>) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            records,
            responses,
        }
    }

    /// Queue a message for an existing user and return its identifier.
    #[instrument(skip(self, content))]
    pub fn enqueue(&self, user_id: &str, content: &str) -> Result<String> {
        if !self.records.contains_user(user_id) {
            return Err(PokeError::UserNotFound(user_id.to_string()));
        }

        let message = QueuedMessage {
            message_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            queued_at: Utc::now(),
        };
        let message_id = message.message_id.clone();

        self.responses
            .insert_processing(&message_id, user_id, message.queued_at);
        let depth = {
            let mut pending = self.pending.lock();
            pending.push_back(message);
            pending.len()
        };

        info!("Queued message {} (depth {})", message_id, depth);
        Ok(message_id)
    }

    /// Remove and return the oldest message.
    pub fn pop(&self) -> Option<QueuedMessage> {
        self.pending.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
