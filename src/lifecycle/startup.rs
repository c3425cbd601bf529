//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from configuration in dependency order
//! - Spawn the supervisor and the health reporter
//! - Relaunch the whole agent after an unexpected failure

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;
use tokio::time::sleep;

use crate::blockchain::{BlockchainClient, BlockchainError, ChainSubmitter, RpcEndpoints, Wallet};
use crate::config::AgentConfig;
use crate::feed::{EventFilter, SubscriptionManager, WsEventSource};
use crate::health::HealthReporter;
use crate::lifecycle::Shutdown;
use crate::notify::Notifier;
use crate::resilience::RetryPolicy;
use crate::responder::{ReactionLedger, Responder};
use crate::supervisor::{Supervisor, SupervisorSettings};

/// Errors that end one launch of the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid contract address '{0}'")]
    ContractAddress(String),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error("supervisor task failed: {0}")]
    Task(String),
}

/// A fully assembled agent, ready to run.
pub struct Agent {
    supervisor: Supervisor,
    health: Option<HealthReporter>,
}

impl Agent {
    /// Build all subsystems from `config`.
    pub async fn build(config: &AgentConfig) -> Result<Self, AgentError> {
        let contract: Address = config
            .contract
            .address
            .parse()
            .map_err(|_| AgentError::ContractAddress(config.contract.address.clone()))?;

        let wallet = Wallet::from_env(config.submission.chain_id)?;
        tracing::info!(address = %wallet.address(), chain_id = wallet.chain_id(), "Wallet loaded");

        let submitter = ChainSubmitter::new(&config.submission, wallet, contract)?;
        // Graceful degradation: an unreachable submission node is not fatal here.
        match submitter.verify_chain().await {
            Ok(()) => tracing::info!("Submission channel chain ID verified"),
            Err(e @ BlockchainError::ChainMismatch { .. }) => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "Could not verify submission chain ID"),
        }

        let observation = Arc::new(BlockchainClient::new(RpcEndpoints::from(&config.observation))?);
        let source = Arc::new(WsEventSource::from_config(&config.observation));
        let subscriptions = SubscriptionManager::new(source, config.observation.buffer_size);

        let ledger = Arc::new(ReactionLedger::new(Duration::from_secs(
            config.reactions.retention_secs,
        )));
        let responder = Arc::new(Responder::new(Arc::new(submitter), ledger));
        let notifier = Notifier::from_config(&config.telegram);

        let supervisor = Supervisor::new(
            subscriptions,
            EventFilter::new(contract, config.contract.event_signature.clone()),
            observation.clone(),
            responder,
            notifier.clone(),
            SupervisorSettings::from(&config.supervisor),
        );

        let health = if config.health.enabled {
            Some(HealthReporter::new(
                observation,
                notifier,
                Duration::from_secs(config.health.interval_secs),
                supervisor.state(),
            ))
        } else {
            tracing::info!("Health reporting disabled");
            None
        };

        Ok(Self { supervisor, health })
    }

    /// Run until shutdown. An `Err` means the supervisor task died.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), AgentError> {
        let health_task = self
            .health
            .map(|reporter| tokio::spawn(reporter.run(shutdown.subscribe())));
        let supervisor_task = tokio::spawn(self.supervisor.run(shutdown.subscribe()));

        let result = supervisor_task.await;
        if let Some(task) = health_task {
            if result.is_err() {
                task.abort();
            }
            let _ = task.await;
        }
        result.map_err(|e| AgentError::Task(e.to_string()))
    }
}

/// Launch the agent, relaunching after every failure until shutdown.
pub async fn run_forever<F, Fut>(retry: RetryPolicy, shutdown: &Shutdown, mut launch: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), AgentError>>,
{
    let mut failures: u32 = 0;
    loop {
        match launch().await {
            Ok(()) => break,
            Err(e) => {
                failures += 1;
                let delay = retry.delay(failures);
                tracing::error!(
                    error = %e,
                    failures,
                    delay_ms = delay.as_millis() as u64,
                    "Agent failed, relaunching"
                );
                let mut stop = shutdown.subscribe();
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = stop.recv() => break,
                }
            }
        }
        if shutdown.is_triggered() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_relaunch_until_success() {
        let shutdown = Shutdown::new();
        let counter = AtomicU32::new(0);
        let launches = &counter;

        run_forever(RetryPolicy::default(), &shutdown, move || async move {
            let n = launches.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(AgentError::Task(format!("launch {} failed", n)))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_relaunch() {
        let shutdown = Shutdown::new();
        let launches = AtomicU32::new(0);

        run_forever(RetryPolicy::default(), &shutdown, || {
            launches.fetch_add(1, Ordering::SeqCst);
            shutdown.trigger();
            async { Err(AgentError::ContractAddress("0x".to_string())) }
        })
        .await;

        assert_eq!(launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_build_rejects_bad_contract_address() {
        let mut config = AgentConfig::default();
        config.contract.address = "not-an-address".to_string();
        assert!(matches!(
            Agent::build(&config).await,
            Err(AgentError::ContractAddress(_))
        ));
    }
}
