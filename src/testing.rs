//! Scripted doubles shared by unit tests.

use crate::agent::{AgentFacade, ChatMessage, ChatModel, ModelTurn};
use crate::error::{PokeError, Result};
use crate::integration::{
    ConnectionRequest, ConnectionStatus, Integrations, ToolInvocation, ToolSpec,
};
use crate::store::{MessageResponse, ResponseTable};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Chat model replaying a fixed list of turns and recording each request.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, usize)>>,
    failing: bool,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            calls: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(Vec::new())
        }
    }

    /// Messages sent on each call.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Number of tools offered on each call.
    pub fn tool_counts(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        self.calls.lock().push((messages.to_vec(), tools.len()));
        if self.failing {
            return Err(PokeError::OpenAI("connection refused".to_string()));
        }
        Ok(self
            .turns
            .lock()
            .pop_front()
            .unwrap_or_else(|| ModelTurn::text("script exhausted")))
    }
}

/// Tool platform with canned tools, outputs and link statuses.
pub struct ScriptedIntegrations {
    tools: Option<Vec<ToolSpec>>,
    tool_output: std::result::Result<String, String>,
    statuses: Mutex<VecDeque<ConnectionStatus>>,
    status_checks: AtomicU32,
    reachable: bool,
}

impl ScriptedIntegrations {
    fn base() -> Self {
        Self {
            tools: None,
            tool_output: Ok(String::new()),
            statuses: Mutex::new(VecDeque::new()),
            status_checks: AtomicU32::new(0),
            reachable: true,
        }
    }

    pub fn unlinked() -> Self {
        Self::base()
    }

    pub fn linked(tools: Vec<ToolSpec>, output: &str) -> Self {
        Self {
            tools: Some(tools),
            tool_output: Ok(output.to_string()),
            ..Self::base()
        }
    }

    pub fn linked_failing_tools(tools: Vec<ToolSpec>) -> Self {
        Self {
            tools: Some(tools),
            tool_output: Err("rate limited".to_string()),
            ..Self::base()
        }
    }

    /// Report these statuses in order, then `Initiated` forever.
    pub fn with_statuses(statuses: Vec<ConnectionStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::base()
        }
    }

    /// Every platform call fails.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::base()
        }
    }

    pub fn status_checks(&self) -> u32 {
        self.status_checks.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(PokeError::Integration("platform unreachable".to_string()))
        }
    }
}

#[async_trait]
impl Integrations for ScriptedIntegrations {
    async fn tools_for(&self, user_id: &str) -> Result<Vec<ToolSpec>> {
        self.check_reachable()?;
        self.tools
            .clone()
            .ok_or_else(|| PokeError::NoLinkedAccount(user_id.to_string()))
    }

    async fn execute_tool(&self, _user_id: &str, _call: &ToolInvocation) -> Result<String> {
        self.check_reachable()?;
        self.tool_output
            .clone()
            .map_err(PokeError::Integration)
    }

    async fn initiate_connection(
        &self,
        user_id: &str,
        _auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest> {
        self.check_reachable()?;
        Ok(ConnectionRequest {
            connection_id: format!("ca_{}", user_id),
            redirect_url: Some(format!("https://connect.test/link/ca_{}", user_id)),
        })
    }

    async fn connection_status(&self, _connection_id: &str) -> Result<ConnectionStatus> {
        self.check_reachable()?;
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .lock()
            .pop_front()
            .unwrap_or(ConnectionStatus::Initiated))
    }
}

/// Agent replying `re: <text>`. Fails on "boom" and panics on "panic".
pub struct EchoAgent {
    seen: Mutex<Vec<String>>,
}

impl EchoAgent {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Texts in the order they were processed.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl AgentFacade for EchoAgent {
    async fn process(&self, _user_id: &str, text: &str) -> Result<String> {
        self.seen.lock().push(text.to_string());
        match text {
            "boom" => Err(PokeError::OpenAI("boom: upstream exploded".to_string())),
            "panic" => panic!("agent panicked"),
            _ => Ok(format!("re: {}", text)),
        }
    }
}

/// Echo agent that blocks each call until a semaphore permit is available.
pub struct GatedAgent {
    gate: Arc<Semaphore>,
    calls: AtomicUsize,
}

impl GatedAgent {
    pub fn new(gate: Arc<Semaphore>) -> Self {
        Self {
            gate,
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait until at least `n` calls have started.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls.load(Ordering::SeqCst) < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("agent was never called");
    }
}

#[async_trait]
impl AgentFacade for GatedAgent {
    async fn process(&self, _user_id: &str, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| PokeError::Processor(e.to_string()))?;
        permit.forget();
        Ok(format!("re: {}", text))
    }
}

/// Poll the response table until `message_id` reaches a terminal status.
pub async fn wait_for_terminal(responses: &ResponseTable, message_id: &str) -> MessageResponse {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(response) = responses.get(message_id) {
                if response.status.is_terminal() {
                    return response;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("message never reached a terminal status")
}
