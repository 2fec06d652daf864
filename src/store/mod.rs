//! In-memory state shared by request handlers and the message processor.
//!
//! Nothing here survives a restart.

mod records;
mod responses;

pub use records::RecordStore;
pub use responses::{MessageResponse, MessageStatus, ResponseTable};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A known user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Opaque identity, caller-supplied or generated.
    pub user_id: String,
    /// Display name.
    pub name: Option<String>,
    /// When the user was first seen.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to address the user by.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("User")
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a user's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation memory for a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMemory {
    pub user_id: String,
    pub conversation_history: Vec<Turn>,
}

impl UserMemory {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            conversation_history: Vec::new(),
        }
    }
}
