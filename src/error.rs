//! Error types for Poke.

use serde::Serialize;
use thiserror::Error;

/// Library-level error type for Poke operations.
#[derive(Error, Debug)]
pub enum PokeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Integration platform error: {0}")]
    Integration(String),

    #[error("No linked external account for user {0}")]
    NoLinkedAccount(String),

    #[error("Tool loop exceeded maximum rounds ({0})")]
    LoopBudgetExceeded(usize),

    #[error("Account connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Account connection not active after {0} attempts")]
    LinkTimeout(u32),

    #[error("Message processor error: {0}")]
    Processor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PokeError {
    /// Classify this error for callers that must not see internal detail.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PokeError::UserNotFound(_)
            | PokeError::MessageNotFound(_)
            | PokeError::ConnectionNotFound(_) => ErrorKind::NotFound,
            PokeError::InvalidInput(_) => ErrorKind::InvalidInput,
            PokeError::AgentUnavailable(_)
            | PokeError::OpenAI(_)
            | PokeError::Integration(_)
            | PokeError::NoLinkedAccount(_)
            | PokeError::LoopBudgetExceeded(_)
            | PokeError::ConnectionFailed(_) => ErrorKind::UpstreamUnavailable,
            PokeError::LinkTimeout(_) => ErrorKind::Timeout,
            PokeError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            PokeError::Http(_) => ErrorKind::UpstreamUnavailable,
            PokeError::Config(_)
            | PokeError::Processor(_)
            | PokeError::Io(_)
            | PokeError::Json(_)
            | PokeError::TomlParse(_) => ErrorKind::Internal,
        }
    }
}

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UpstreamUnavailable,
    Timeout,
    Internal,
}

impl ErrorKind {
    /// Generic message safe to show to any caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Not found",
            ErrorKind::InvalidInput => "Invalid request",
            ErrorKind::UpstreamUnavailable => "Agent is temporarily unavailable",
            ErrorKind::Timeout => "Timed out waiting for an external service",
            ErrorKind::Internal => "Internal server error",
        }
    }

    /// HTTP status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput => 400,
            ErrorKind::UpstreamUnavailable => 502,
            ErrorKind::Timeout => 504,
            ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Internal => "Internal",
        };
        write!(f, "{}", name)
    }
}

/// Result type alias for Poke operations.
pub type Result<T> = std::result::Result<T, PokeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_share_kind() {
        assert_eq!(PokeError::UserNotFound("a".into()).kind(), ErrorKind::NotFound);
        assert_eq!(PokeError::MessageNotFound("m".into()).kind(), ErrorKind::NotFound);
        assert_eq!(PokeError::ConnectionNotFound("c".into()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_link_timeout_is_distinct_from_failure() {
        assert_eq!(PokeError::LinkTimeout(60).kind(), ErrorKind::Timeout);
        assert_eq!(
            PokeError::ConnectionFailed("denied".into()).kind(),
            ErrorKind::UpstreamUnavailable
        );
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = PokeError::OpenAI("invalid api key sk-123".into());
        let message = err.kind().public_message();
        assert!(!message.contains("sk-123"));
        assert_eq!(err.kind().to_string(), "UpstreamUnavailable");
    }
}
