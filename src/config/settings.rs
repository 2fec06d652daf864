//! Configuration settings for Poke.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub queue: QueueSettings,
    pub agent: AgentSettings,
    pub integration: IntegrationSettings,
    pub memory: MemorySettings,
    pub personas: PersonaSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Allowed CORS origins. Empty or "*" allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

impl ServerSettings {
    /// Whether any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Message queue and response table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Idle wait between queue checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum retained message responses before terminal entries are evicted.
    pub response_capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            response_capacity: 10_000,
        }
    }
}

impl QueueSettings {
    /// Idle wait between queue checks, at least 1 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// LLM agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model to use.
    pub model: String,
    /// Maximum model calls per message when tools are bound.
    pub max_tool_rounds: usize,
    /// Timeout for a single model request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo".to_string(),
            max_tool_rounds: 10,
            request_timeout_secs: 300,
        }
    }
}

/// Tool-routing platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    /// Base URL of the platform REST API.
    pub base_url: String,
    /// Auth config used when a link request does not name one.
    pub auth_config_id: Option<String>,
    /// Tool slugs bound to the model for linked users.
    pub tools: Vec<String>,
    /// Seconds between connection status checks.
    pub poll_interval_secs: u64,
    /// Status checks before a pending link is reported as timed out.
    pub max_poll_attempts: u32,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://backend.composio.dev".to_string(),
            auth_config_id: None,
            tools: [
                "GMAIL_SEARCH_PEOPLE",
                "GMAIL_GET_PROFILE",
                "GMAIL_SEND_EMAIL",
                "GMAIL_GET_EMAIL_THREAD",
                "GMAIL_CREATE_EMAIL_DRAFT",
                "COMPOSIO_SEARCH_SEARCH",
                "COMPOSIO_SEARCH_EXA_SIMILARLINK",
                "COMPOSIO_SEARCH_EXA_ANSWER",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            poll_interval_secs: 5,
            max_poll_attempts: 60,
        }
    }
}

impl IntegrationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct MemorySettings {
    /// Keep at most this many turns per user. None keeps everything.
    pub max_turns: Option<usize>,
}

/// Persona customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PersonaSettings {
    /// Directory containing a `personas.toml` override.
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply `OPENAI_MODEL` and `COMPOSIO_AUTH_CONFIG_ID` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(model) = non_empty_env("OPENAI_MODEL") {
            self.agent.model = model;
        }
        if let Some(id) = non_empty_env("COMPOSIO_AUTH_CONFIG_ID") {
            self.integration.auth_config_id = Some(id);
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PokeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("poke")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded custom persona directory, if configured.
    pub fn persona_dir(&self) -> Option<PathBuf> {
        self.personas.custom_dir.as_deref().map(Self::expand_path)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
