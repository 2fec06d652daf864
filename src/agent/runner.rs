//! Agent runner with tool calling loop.

use super::model::{ChatMessage, ChatModel};
use super::persona::{is_opening_trigger, Persona};
use crate::config::Personas;
use crate::error::{PokeError, Result};
use crate::integration::{Integrations, ToolInvocation};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reply used when the model finishes without any text.
const FALLBACK_REPLY: &str = "I'm here to help!";

/// Produces a reply for a user message.
#[async_trait]
pub trait AgentFacade: Send + Sync {
    /// Reply to `text` from `user_id`. Fails with an upstream error when the
    /// model cannot be reached; a missing tool set is not an error.
    async fn process(&self, user_id: &str, text: &str) -> Result<String>;
}

/// Poke agent: persona selection, optional tools, bounded tool loop.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    integrations: Arc<dyn Integrations>,
    personas: Personas,
    max_rounds: usize,
}

impl Agent {
    /// Create a new agent.
    pub fn new(model: Arc<dyn ChatModel>, integrations: Arc<dyn Integrations>) -> Self {
        Self {
            model,
            integrations,
            personas: Personas::default(),
            max_rounds: 10,
        }
    }

    /// Set custom persona texts.
    pub fn with_personas(mut self, personas: Personas) -> Self {
        self.personas = personas;
        self
    }

    /// Set maximum model calls per message.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// Run the agent for one user message.
    #[instrument(skip(self, text), fields(user_id = %user_id))]
    pub async fn run(&self, user_id: &str, text: &str) -> Result<AgentResponse> {
        let persona = Persona::classify(text);
        let prompt = if is_opening_trigger(text) {
            self.personas.research_task.as_str()
        } else {
            text
        };
        debug!("Selected persona {:?}", persona);

        let tools = match self.integrations.tools_for(user_id).await {
            Ok(tools) => tools,
            Err(e) => {
                debug!("No tools available for {}: {}", user_id, e);
                Vec::new()
            }
        };

        let mut messages = vec![
            ChatMessage::System(persona.system_prompt(&self.personas).to_string()),
            ChatMessage::User(prompt.to_string()),
        ];

        let mut rounds = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            rounds += 1;
            if rounds > self.max_rounds {
                return Err(PokeError::LoopBudgetExceeded(self.max_rounds));
            }

            debug!("Agent round {} with {} tools", rounds, tools.len());

            let turn = self
                .model
                .complete(&messages, &tools)
                .await
                .map_err(|e| PokeError::AgentUnavailable(e.to_string()))?;

            if turn.tool_calls.is_empty() {
                let content = turn
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                return Ok(AgentResponse {
                    content,
                    persona,
                    tool_calls: tool_calls_made,
                    rounds,
                });
            }

            messages.push(ChatMessage::Assistant {
                content: turn.content,
                tool_calls: turn.tool_calls.clone(),
            });

            for call in &turn.tool_calls {
                let record = self.execute_tool_call(user_id, call).await;
                messages.push(ChatMessage::Tool {
                    call_id: call.id.clone(),
                    content: record.result.clone(),
                });
                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, user_id: &str, call: &ToolInvocation) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let result = match self.integrations.execute_tool(user_id, call).await {
            Ok(output) => output,
            Err(e) => format!("Tool error: {}", e),
        };

        ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
        }
    }
}

#[async_trait]
impl AgentFacade for Agent {
    async fn process(&self, user_id: &str, text: &str) -> Result<String> {
        let response = self.run(user_id, text).await?;
        info!(
            "Agent replied to {} in {} round(s), {} tool call(s)",
            user_id,
            response.rounds,
            response.tool_calls.len()
        );
        Ok(response.content)
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final reply.
    pub content: String,
    /// Persona that produced it.
    pub persona: Persona,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub rounds: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::ModelTurn;
    use crate::error::ErrorKind;
    use crate::integration::ToolSpec;
    use crate::testing::{ScriptedIntegrations, ScriptedModel};

    fn tool_call(id: &str, name: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments: "{}".to_string(),
        }
    }

    fn gmail_profile() -> ToolSpec {
        ToolSpec {
            name: "GMAIL_GET_PROFILE".to_string(),
            description: "Profile".to_string(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    #[tokio::test]
    async fn test_unlinked_user_gets_reply_without_tools() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn::text("hey alice")]));
        let agent = Agent::new(model.clone(), Arc::new(ScriptedIntegrations::unlinked()));

        let response = agent.run("alice", "hello").await.unwrap();

        assert_eq!(response.content, "hey alice");
        assert_eq!(response.persona, Persona::Conversation);
        assert_eq!(response.rounds, 1);
        assert_eq!(model.tool_counts(), vec![0]);
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelTurn {
                content: None,
                tool_calls: vec![tool_call("call_1", "GMAIL_GET_PROFILE")],
            },
            ModelTurn::text("So you are Ana Lima"),
        ]));
        let integrations =
            Arc::new(ScriptedIntegrations::linked(vec![gmail_profile()], "ana@lima.dev"));
        let agent = Agent::new(model.clone(), integrations);

        let response = agent.run("ana", "Hello Poke").await.unwrap();

        assert_eq!(response.content, "So you are Ana Lima");
        assert_eq!(response.persona, Persona::Research);
        assert_eq!(response.rounds, 2);
        assert_eq!(response.tool_calls[0].result, "ana@lima.dev");
        assert_eq!(model.tool_counts(), vec![1, 1]);

        let second_call = model.calls().remove(1);
        assert!(matches!(
            second_call.last(),
            Some(ChatMessage::Tool { call_id, content }) if call_id == "call_1" && content == "ana@lima.dev"
        ));
    }

    #[tokio::test]
    async fn test_opening_trigger_sends_research_task() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn::text("ok")]));
        let agent = Agent::new(model.clone(), Arc::new(ScriptedIntegrations::unlinked()));

        agent.run("ana", "Hello Poke").await.unwrap();

        let first = model.calls().remove(0);
        assert_eq!(first[0], ChatMessage::System(Personas::default().research));
        assert_eq!(first[1], ChatMessage::User(Personas::default().research_task));
    }

    #[tokio::test]
    async fn test_tool_error_is_reported_to_model() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelTurn {
                content: None,
                tool_calls: vec![tool_call("call_1", "GMAIL_SEND_EMAIL")],
            },
            ModelTurn::text("Could not send it."),
        ]));
        let integrations = Arc::new(ScriptedIntegrations::linked_failing_tools(vec![gmail_profile()]));
        let agent = Agent::new(model, integrations);

        let response = agent.run("ana", "email bob").await.unwrap();

        assert!(response.tool_calls[0].result.starts_with("Tool error:"));
        assert_eq!(response.content, "Could not send it.");
    }

    #[tokio::test]
    async fn test_round_budget_fails_closed() {
        let endless: Vec<ModelTurn> = (0..5)
            .map(|i| ModelTurn {
                content: None,
                tool_calls: vec![tool_call(&format!("call_{}", i), "GMAIL_GET_PROFILE")],
            })
            .collect();
        let model = Arc::new(ScriptedModel::new(endless));
        let integrations = Arc::new(ScriptedIntegrations::linked(vec![gmail_profile()], "{}"));
        let agent = Agent::new(model, integrations).with_max_rounds(3);

        let err = agent.run("ana", "loop forever").await.unwrap_err();

        assert!(matches!(err, PokeError::LoopBudgetExceeded(3)));
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_model_failure_is_agent_unavailable() {
        let model = Arc::new(ScriptedModel::failing());
        let agent = Agent::new(model, Arc::new(ScriptedIntegrations::unlinked()));

        let err = agent.process("alice", "hello").await.unwrap_err();

        assert!(matches!(err, PokeError::AgentUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn::text("   ")]));
        let agent = Agent::new(model, Arc::new(ScriptedIntegrations::unlinked()));

        let reply = agent.process("alice", "hello").await.unwrap();

        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "COMPOSIO_SEARCH_SEARCH".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"COMPOSIO_SEARCH_SEARCH({"query": "test"})"#);
    }
}
