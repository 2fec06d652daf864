//! Agent façade: persona selection, tool binding and the model loop.
//!
//! The model and the tool platform sit behind traits so the queue and the
//! HTTP surface can be exercised without network access.

mod model;
mod persona;
mod runner;

pub use model::{ChatMessage, ChatModel, ModelTurn, OpenAIChatModel};
pub use persona::{is_opening_trigger, Persona};
pub use runner::{Agent, AgentFacade, AgentResponse, ToolCallRecord};
