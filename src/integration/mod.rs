//! External tool-routing platform.
//!
//! Links user accounts to SaaS services and exposes the linked services as
//! tools the model may call.

mod composio;
mod poller;

pub use composio::ComposioClient;
pub use poller::{ConnectionPoller, LinkOutcome};

use crate::error::{PokeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool schema offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// A pending account link.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRequest {
    pub connection_id: String,
    pub redirect_url: Option<String>,
}

/// Status of a linked account as reported by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Initiated,
    Initializing,
    Active,
    Failed,
    Expired,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Initiated => "INITIATED",
            ConnectionStatus::Initializing => "INITIALIZING",
            ConnectionStatus::Active => "ACTIVE",
            ConnectionStatus::Failed => "FAILED",
            ConnectionStatus::Expired => "EXPIRED",
            ConnectionStatus::Inactive => "INACTIVE",
            ConnectionStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Trait for tool-routing platform clients.
#[async_trait]
pub trait Integrations: Send + Sync {
    /// Tools available to a user. Fails with `NoLinkedAccount` when the user
    /// has not linked any account.
    async fn tools_for(&self, user_id: &str) -> Result<Vec<ToolSpec>>;

    /// Execute a tool on behalf of a user and return its output as text.
    async fn execute_tool(&self, user_id: &str, call: &ToolInvocation) -> Result<String>;

    /// Start linking an external account for a user.
    async fn initiate_connection(
        &self,
        user_id: &str,
        auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest>;

    /// Current status of a pending or completed link.
    async fn connection_status(&self, connection_id: &str) -> Result<ConnectionStatus>;
}

/// Stand-in used when no platform credentials are configured.
///
/// Every user is treated as having no linked account, so the agent runs
/// without tools.
pub struct Unlinked;

#[async_trait]
impl Integrations for Unlinked {
    async fn tools_for(&self, user_id: &str) -> Result<Vec<ToolSpec>> {
        Err(PokeError::NoLinkedAccount(user_id.to_string()))
    }

    async fn execute_tool(&self, user_id: &str, _call: &ToolInvocation) -> Result<String> {
        Err(PokeError::NoLinkedAccount(user_id.to_string()))
    }

    async fn initiate_connection(
        &self,
        _user_id: &str,
        _auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest> {
        Err(PokeError::Config(
            "COMPOSIO_API_KEY not set; account linking is disabled".to_string(),
        ))
    }

    async fn connection_status(&self, connection_id: &str) -> Result<ConnectionStatus> {
        Err(PokeError::ConnectionNotFound(connection_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_platform_strings() {
        let active: ConnectionStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        let odd: ConnectionStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();

        assert_eq!(active, ConnectionStatus::Active);
        assert_eq!(odd, ConnectionStatus::Unknown);
        assert_eq!(ConnectionStatus::Initializing.to_string(), "INITIALIZING");
    }

    #[tokio::test]
    async fn test_unlinked_has_no_tools() {
        let err = Unlinked.tools_for("alice").await.unwrap_err();
        assert!(matches!(err, PokeError::NoLinkedAccount(_)));
    }
}
