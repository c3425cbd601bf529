//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pong_bot_notices_total` (counter): event notices received from the feed
//! - `pong_bot_reactions_total` (counter): reactions by outcome
//! - `pong_bot_reconnects_total` (counter): subscription replacements by reason
//! - `pong_bot_subscription_live` (gauge): 1=live subscription, 0=none
//! - `pong_bot_block_height` (gauge): last sampled chain height
//! - `pong_bot_notifications_total` (counter): notification deliveries by outcome
//! - `pong_bot_rpc_health` (gauge): 1=healthy, 0=unhealthy, per endpoint role
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op, so tests need no setup
//! - The Prometheus exporter is optional and bound to its own listener

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_notice_observed() {
    counter!("pong_bot_notices_total").increment(1);
}

/// Outcome labels: `submitted`, `confirmed`, `failed`, `malformed`, `duplicate`.
pub fn record_reaction(outcome: &'static str) {
    counter!("pong_bot_reactions_total", "outcome" => outcome).increment(1);
}

/// Reason labels: `failed`, `rotation`.
pub fn record_reconnect(reason: &'static str) {
    counter!("pong_bot_reconnects_total", "reason" => reason).increment(1);
}

pub fn record_subscription_live(live: bool) {
    gauge!("pong_bot_subscription_live").set(if live { 1.0 } else { 0.0 });
}

pub fn record_block_height(height: u64) {
    gauge!("pong_bot_block_height").set(height as f64);
}

pub fn record_notification(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    counter!("pong_bot_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_rpc_health(role: &str, healthy: bool) {
    gauge!("pong_bot_rpc_health", "role" => role.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
