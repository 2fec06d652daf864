//! Configuration module for Poke.
//!
//! Handles loading and managing application settings and persona texts.

mod personas;
mod settings;

pub use personas::Personas;
pub use settings::{
    AgentSettings, GeneralSettings, IntegrationSettings, MemorySettings, PersonaSettings,
    QueueSettings, ServerSettings, Settings,
};
