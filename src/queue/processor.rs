//! Background task draining the message queue one message at a time.

use super::{MessageQueue, QueuedMessage};
use crate::agent::AgentFacade;
use crate::error::{ErrorKind, PokeError, Result};
use crate::store::{RecordStore, ResponseTable};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Lifecycle of a processor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Running,
    Stopping,
    Stopped,
}

/// Drains the queue through the agent and records outcomes.
pub struct MessageProcessor {
    queue: Arc<MessageQueue>,
    responses: Arc<ResponseTable>,
    records: Arc<RecordStore>,
    agent: Arc<dyn AgentFacade>,
    poll_interval: Duration,
}

impl MessageProcessor {
    pub fn new(
        queue: Arc<MessageQueue>,
        responses: Arc<ResponseTable>,
        records: Arc<RecordStore>,
        agent: Arc<dyn AgentFacade>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            responses,
            records,
            agent,
            poll_interval,
        }
    }

    /// Spawn the processing loop on the current runtime.
    ///
    /// May be called again after a previous handle was stopped; messages left
    /// in the queue are picked up by the new loop.
    pub fn start(self: &Arc<Self>) -> ProcessorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let processor = Arc::clone(self);
        let task = tokio::spawn(async move { processor.run(stop_rx).await });

        ProcessorHandle {
            stop_tx,
            state: ProcessorState::Running,
            task: Some(task),
        }
    }

    async fn run(&self, mut stop_rx: watch::Receiver<bool>) {
        info!(
            "Message processor started (poll_interval={}ms)",
            self.poll_interval.as_millis()
        );

        loop {
            if *stop_rx.borrow() {
                break;
            }

            match self.queue.pop() {
                Some(message) => self.process(message).await,
                None => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        changed = stop_rx.changed() => {
                            // Sender dropped: the handle is gone, stop too.
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!(
            "Message processor stopped ({} messages left in queue)",
            self.queue.len()
        );
    }

    /// Process one dequeued message and record its terminal status.
    ///
    /// The agent call runs in its own task so a panic is recorded as a
    /// failure instead of taking down the loop.
    #[instrument(skip(self, message), fields(message_id = %message.message_id, user_id = %message.user_id))]
    async fn process(&self, message: QueuedMessage) {
        let agent = Arc::clone(&self.agent);
        let user_id = message.user_id.clone();
        let content = message.content.clone();

        let outcome = tokio::spawn(async move { agent.process(&user_id, &content).await }).await;

        match outcome {
            Ok(Ok(reply)) => {
                self.records
                    .record_exchange(&message.user_id, &message.content, &reply);
                self.responses.complete(&message.message_id, reply);
                info!("Message completed");
            }
            Ok(Err(e)) => {
                warn!("Message failed: {}", e);
                self.responses
                    .fail(&message.message_id, e.kind().public_message());
            }
            Err(e) => {
                error!("Message task aborted: {}", e);
                self.responses
                    .fail(&message.message_id, ErrorKind::Internal.public_message());
            }
        }
    }
}

/// Run/stop control for a started processor.
pub struct ProcessorHandle {
    stop_tx: watch::Sender<bool>,
    state: ProcessorState,
    task: Option<JoinHandle<()>>,
}

impl ProcessorHandle {
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Signal the loop to stop after the in-flight message, without waiting.
    pub fn request_stop(&mut self) {
        if self.state == ProcessorState::Running {
            self.stop_tx.send_replace(true);
            self.state = ProcessorState::Stopping;
        }
    }

    /// Stop the loop and wait until it has exited.
    ///
    /// An in-flight message runs to completion first. Queued messages stay
    /// in the queue.
    pub async fn stop(&mut self) -> Result<()> {
        self.request_stop();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| PokeError::Processor(e.to_string()))?;
        }
        self.state = ProcessorState::Stopped;
        Ok(())
    }
}
