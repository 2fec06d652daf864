//! Poke - a personal assistant backend
//!
//! An in-memory message service that routes user messages through an LLM
//! agent which can act on the user's linked accounts.
//!
//! # Overview
//!
//! Poke allows you to:
//! - Register users and keep their conversation history in memory
//! - Queue messages and poll for replies produced by a background processor
//! - Link an external account so the agent can research and act for the user
//! - Chat with the agent directly from the terminal
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and persona texts
//! - `store` - User records, memories and the response table
//! - `queue` - FIFO message queue and its processor
//! - `agent` - Persona selection and the tool-calling loop
//! - `integration` - Tool-routing platform client and link polling
//! - `context` - Shared application state
//! - `api` - HTTP request surface
//!
//! # Example
//!
//! ```rust,no_run
//! use poke::config::Settings;
//! use poke::context::AppContext;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Arc::new(AppContext::from_settings(Settings::load()?)?);
//!     let mut processor = ctx.processor().start();
//!
//!     let user = ctx.records.create_user(None, Some("Ana".to_string()));
//!     let message_id = ctx.queue.enqueue(&user.user_id, "Hello Poke")?;
//!     println!("Queued {}", message_id);
//!
//!     processor.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod integration;
pub mod openai;
pub mod queue;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PokeError, Result};
