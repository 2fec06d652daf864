//! User records and conversation memory.

use super::{Role, Turn, User, UserMemory};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// In-memory store of users and their conversation memory.
pub struct RecordStore {
    users: RwLock<HashMap<String, User>>,
    memories: RwLock<HashMap<String, UserMemory>>,
    max_turns: Option<usize>,
}

impl RecordStore {
    /// Create an empty store that keeps every turn.
    pub fn new() -> Self {
        Self::with_max_turns(None)
    }

    /// Create an empty store that keeps at most `max_turns` turns per user.
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            memories: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Create a user, or replace the name of an existing one.
    ///
    /// A UUID identity is generated when `user_id` is None or blank.
    pub fn create_user(&self, user_id: Option<&str>, name: Option<String>) -> User {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut users = self.users.write();
        let user = users
            .entry(user_id.clone())
            .and_modify(|existing| existing.name = name.clone())
            .or_insert_with(|| User {
                user_id: user_id.clone(),
                name,
                created_at: Utc::now(),
            });

        debug!("stored user {}", user.user_id);
        user.clone()
    }

    /// Look up a user by identity.
    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.read().get(user_id).cloned()
    }

    /// Check whether a user exists.
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.users.read().contains_key(user_id)
    }

    /// Get a user's memory, creating an empty one if absent.
    pub fn memory(&self, user_id: &str) -> UserMemory {
        if let Some(memory) = self.memories.read().get(user_id) {
            return memory.clone();
        }
        self.memories
            .write()
            .entry(user_id.to_string())
            .or_insert_with(|| UserMemory::new(user_id))
            .clone()
    }

    /// Append a turn to a user's memory.
    pub fn append_turn(&self, user_id: &str, role: Role, content: &str) {
        let mut memories = self.memories.write();
        let memory = memories
            .entry(user_id.to_string())
            .or_insert_with(|| UserMemory::new(user_id));

        memory.conversation_history.push(Turn {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        });

        if let Some(max) = self.max_turns {
            let len = memory.conversation_history.len();
            if len > max {
                memory.conversation_history.drain(..len - max);
            }
        }
    }

    /// Record a user message and the reply it produced.
    pub fn record_exchange(&self, user_id: &str, message: &str, reply: &str) {
        self.append_turn(user_id, Role::User, message);
        self.append_turn(user_id, Role::Assistant, reply);
    }

    /// Number of known users.
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
