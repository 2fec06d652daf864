//! Pre-flight checks before starting long-running commands.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail on the first message.

use crate::error::{PokeError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The HTTP service needs the model API key.
    Serve,
    /// Interactive chat needs the model API key.
    Chat,
}

/// Run pre-flight checks for the given operation.
///
/// Returns warnings for optional settings that are missing, or an error
/// describing what is required.
pub fn check(operation: Operation) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    match operation {
        Operation::Serve | Operation::Chat => {
            check_api_key()?;
            if !env_is_set("COMPOSIO_API_KEY") {
                warnings.push(
                    "COMPOSIO_API_KEY not set; account linking and tools are disabled".to_string(),
                );
            }
        }
    }
    Ok(warnings)
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(PokeError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(PokeError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn env_is_set(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}
