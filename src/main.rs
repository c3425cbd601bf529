//! Ping/pong reactive agent.
//!
//! # Architecture Overview
//!
//! ```text
//!   Feed provider (WebSocket)                 Submission RPC (HTTP)
//!          │                                          ▲
//!          ▼                                          │ pong(txHash)
//!   ┌─────────────┐   EventNotice   ┌────────────┐    │
//!   │ subscription│────────────────▶│ supervisor │────┼──▶ responder (task per notice)
//!   └─────────────┘                 └─────┬──────┘    │        │
//!          ▲   close / open new           │           │        └─▶ reaction ledger
//!          └──────────────────────────────┘           │
//!                                         │ probe     │
//!                                         ▼           │
//!                                  Observation RPC ◀── health reporter
//!
//!   notifier (Telegram, fire-and-forget) ◀── startup, reconnects, health
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use pong_bot::config;
use pong_bot::lifecycle::{self, signals, Agent, Shutdown};
use pong_bot::observability::{logging, metrics};
use pong_bot::resilience::RetryPolicy;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = config::load_from_env()?;
    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        contract = %config.contract.address,
        ws_url = %config.observation.ws_url,
        chain_id = config.submission.chain_id,
        "pong-bot starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let config = &config;
    let stop = shutdown.as_ref();
    lifecycle::run_forever(RetryPolicy::from(&config.supervisor), stop, move || async move {
        let agent = Agent::build(config).await?;
        agent.run(stop).await
    })
    .await;

    tracing::info!("Shutdown complete");
    Ok(())
}
