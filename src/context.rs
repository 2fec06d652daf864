//! Shared application state.
//!
//! Wires the record store, response table, queue, agent and tool platform
//! together. One context backs both the HTTP service and the chat CLI.

use crate::agent::{Agent, AgentFacade, OpenAIChatModel};
use crate::config::{Personas, Settings};
use crate::error::Result;
use crate::integration::{ComposioClient, Integrations, Unlinked};
use crate::queue::{MessageProcessor, MessageQueue};
use crate::store::{RecordStore, ResponseTable};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application-wide state shared by handlers and background tasks.
pub struct AppContext {
    pub settings: Settings,
    pub personas: Personas,
    pub records: Arc<RecordStore>,
    pub responses: Arc<ResponseTable>,
    pub queue: Arc<MessageQueue>,
    pub agent: Arc<dyn AgentFacade>,
    pub integrations: Arc<dyn Integrations>,
}

impl AppContext {
    /// Build the production context: OpenAI model plus the Composio client.
    ///
    /// Without `COMPOSIO_API_KEY` every user is treated as unlinked.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let personas = Personas::load(settings.persona_dir().as_deref())?;

        let integrations: Arc<dyn Integrations> =
            match ComposioClient::from_env(&settings.integration) {
                Ok(client) => {
                    info!("Tool platform at {}", settings.integration.base_url);
                    Arc::new(client)
                }
                Err(e) => {
                    warn!("Account linking disabled: {}", e);
                    Arc::new(Unlinked)
                }
            };

        let model = Arc::new(OpenAIChatModel::new(
            &settings.agent.model,
            Duration::from_secs(settings.agent.request_timeout_secs),
        )?);
        info!("Using model {}", settings.agent.model);

        let agent: Arc<dyn AgentFacade> = Arc::new(
            Agent::new(model, integrations.clone())
                .with_personas(personas.clone())
                .with_max_rounds(settings.agent.max_tool_rounds),
        );

        Ok(Self::with_components(settings, personas, agent, integrations))
    }

    /// Build a context around custom agent and platform implementations.
    pub fn with_components(
        settings: Settings,
        personas: Personas,
        agent: Arc<dyn AgentFacade>,
        integrations: Arc<dyn Integrations>,
    ) -> Self {
        let records = Arc::new(RecordStore::with_max_turns(settings.memory.max_turns));
        let responses = Arc::new(ResponseTable::new(settings.queue.response_capacity));
        let queue = Arc::new(MessageQueue::new(records.clone(), responses.clone()));

        Self {
            settings,
            personas,
            records,
            responses,
            queue,
            agent,
            integrations,
        }
    }

    /// Create a processor draining this context's queue.
    pub fn processor(&self) -> Arc<MessageProcessor> {
        Arc::new(MessageProcessor::new(
            self.queue.clone(),
            self.responses.clone(),
            self.records.clone(),
            self.agent.clone(),
            self.settings.queue.poll_interval(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageStatus;
    use crate::testing::{wait_for_terminal, EchoAgent, ScriptedIntegrations};

    #[tokio::test]
    async fn test_processor_shares_context_state() {
        let mut settings = Settings::default();
        settings.queue.poll_interval_ms = 5;
        let ctx = AppContext::with_components(
            settings,
            Personas::default(),
            Arc::new(EchoAgent::new()),
            Arc::new(ScriptedIntegrations::unlinked()),
        );
        let user = ctx.records.create_user(None, Some("Ana".to_string()));

        let id = ctx.queue.enqueue(&user.user_id, "hi").unwrap();
        let mut handle = ctx.processor().start();
        let response = wait_for_terminal(&ctx.responses, &id).await;
        handle.stop().await.unwrap();

        assert_eq!(response.status, MessageStatus::Completed);
        assert_eq!(ctx.records.memory(&user.user_id).conversation_history.len(), 2);
    }
}
