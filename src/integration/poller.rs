//! Waiting for a pending account link to settle.

use super::{ConnectionStatus, Integrations};
use crate::error::{PokeError, Result};
use std::time::Duration;
use tracing::{debug, info};

/// How a pending link ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The account became active.
    Active { attempts: u32 },
    /// The platform reported the link as failed.
    Failed { attempts: u32 },
    /// The attempt budget ran out before a terminal status.
    TimedOut { attempts: u32 },
}

impl LinkOutcome {
    /// Convert to a result, keeping failure and timeout distinct.
    pub fn into_result(self) -> Result<u32> {
        match self {
            LinkOutcome::Active { attempts } => Ok(attempts),
            LinkOutcome::Failed { attempts } => Err(PokeError::ConnectionFailed(format!(
                "platform reported FAILED after {} attempts",
                attempts
            ))),
            LinkOutcome::TimedOut { attempts } => Err(PokeError::LinkTimeout(attempts)),
        }
    }
}

/// Polls connection status at a fixed interval up to an attempt ceiling.
pub struct ConnectionPoller<'a> {
    integrations: &'a dyn Integrations,
    interval: Duration,
    max_attempts: u32,
}

impl<'a> ConnectionPoller<'a> {
    pub fn new(integrations: &'a dyn Integrations, interval: Duration, max_attempts: u32) -> Self {
        Self {
            integrations,
            interval,
            max_attempts,
        }
    }

    /// Wait for the link to become active, fail, or run out of attempts.
    ///
    /// Sleeps before every status check. `on_attempt` is called after each
    /// non-terminal check with the attempt number.
    pub async fn wait<F>(&self, connection_id: &str, mut on_attempt: F) -> Result<LinkOutcome>
    where
        F: FnMut(u32),
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            let status = self.integrations.connection_status(connection_id).await?;
            debug!("Connection {} attempt {}: {}", connection_id, attempt, status);

            match status {
                ConnectionStatus::Active => {
                    info!("Connection {} active after {} attempts", connection_id, attempt);
                    return Ok(LinkOutcome::Active { attempts: attempt });
                }
                ConnectionStatus::Failed => {
                    info!("Connection {} failed after {} attempts", connection_id, attempt);
                    return Ok(LinkOutcome::Failed { attempts: attempt });
                }
                _ => on_attempt(attempt),
            }
        }

        info!(
            "Connection {} still pending after {} attempts",
            connection_id, self.max_attempts
        );
        Ok(LinkOutcome::TimedOut {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::ScriptedIntegrations;

    fn poller(integrations: &ScriptedIntegrations) -> ConnectionPoller<'_> {
        ConnectionPoller::new(integrations, Duration::from_millis(1), 60)
    }

    #[tokio::test]
    async fn test_failed_on_third_attempt_stops_immediately() {
        let integrations = ScriptedIntegrations::with_statuses(vec![
            ConnectionStatus::Initiated,
            ConnectionStatus::Initializing,
            ConnectionStatus::Failed,
            ConnectionStatus::Active,
        ]);

        let mut progress = Vec::new();
        let outcome = poller(&integrations)
            .wait("ca_1", |attempt| progress.push(attempt))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Failed { attempts: 3 });
        assert_eq!(integrations.status_checks(), 3);
        assert_eq!(progress, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_active_reports_success() {
        let integrations = ScriptedIntegrations::with_statuses(vec![
            ConnectionStatus::Initiated,
            ConnectionStatus::Active,
        ]);

        let outcome = poller(&integrations).wait("ca_1", |_| {}).await.unwrap();

        assert_eq!(outcome, LinkOutcome::Active { attempts: 2 });
        tokio_test::assert_ok!(outcome.into_result());
    }

    #[tokio::test]
    async fn test_never_settling_times_out_distinctly() {
        // Script runs out, so every check reports INITIATED.
        let integrations = ScriptedIntegrations::with_statuses(vec![]);

        let outcome = poller(&integrations).wait("ca_1", |_| {}).await.unwrap();

        assert_eq!(outcome, LinkOutcome::TimedOut { attempts: 60 });
        assert_eq!(integrations.status_checks(), 60);

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_ne!(
            LinkOutcome::Failed { attempts: 60 }.into_result().unwrap_err().kind(),
            ErrorKind::Timeout
        );
    }

    #[tokio::test]
    async fn test_status_error_propagates() {
        let integrations = ScriptedIntegrations::unreachable();

        let err = poller(&integrations).wait("ca_1", |_| {}).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
