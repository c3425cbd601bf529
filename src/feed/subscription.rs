//! Subscription lifecycle and notice delivery.
//!
//! # Responsibilities
//! - Open a subscription through an [`EventSource`]
//! - Pump raw logs into typed [`FeedMessage`]s on a bounded channel
//! - Emit exactly one terminal signal per subscription
//! - Detach idempotently on close
//!
//! # Design Decisions
//! - `open` never fails; a subscribe error yields an already-errored
//!   subscription so every transport failure takes the same path
//! - `close` waits for the pump task to be dropped, which drops the
//!   underlying stream and with it the remote subscription

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::feed::source::{EventSource, RawLogStream};
use crate::feed::types::{EventFilter, EventNotice, FeedMessage, SubscriptionStatus, Termination};
use crate::observability::metrics;

/// Global atomic counter for subscription IDs.
static SUBSCRIPTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    pub fn new() -> Self {
        Self(SUBSCRIPTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live (or finished) event subscription.
///
/// Read it with [`next`](Self::next) until the terminal signal, then
/// [`close`](Self::close) it. Dropping it without closing still aborts the
/// pump, but does not wait for the teardown.
pub struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    status: SubscriptionStatus,
    terminal_emitted: bool,
    events: mpsc::Receiver<FeedMessage>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    fn live(filter: EventFilter, stream: RawLogStream, buffer: usize) -> Self {
        let id = SubscriptionId::new();
        let (tx, events) = mpsc::channel(buffer.max(1));
        let pump = tokio::spawn(pump(id, stream, tx));

        Self {
            id,
            filter,
            status: SubscriptionStatus::Live,
            terminal_emitted: false,
            events,
            pump: Some(pump),
        }
    }

    fn failed(filter: EventFilter, reason: String) -> Self {
        let (tx, events) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this cannot fail.
        let _ = tx.try_send(FeedMessage::Terminated(Termination::Errored(reason)));

        Self {
            id: SubscriptionId::new(),
            filter,
            status: SubscriptionStatus::Errored,
            terminal_emitted: false,
            events,
            pump: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    /// Next notice or terminal signal.
    ///
    /// Returns `None` once the terminal signal has been delivered or the
    /// subscription was closed.
    pub async fn next(&mut self) -> Option<FeedMessage> {
        if self.terminal_emitted {
            return None;
        }

        let message = match self.events.recv().await {
            Some(message) => message,
            // Pump ended without a terminal signal (panicked).
            None => FeedMessage::Terminated(Termination::Errored("feed task ended unexpectedly".to_string())),
        };

        if let FeedMessage::Terminated(termination) = &message {
            self.terminal_emitted = true;
            self.status = match termination {
                Termination::Closed => SubscriptionStatus::Closed,
                Termination::Errored(_) => SubscriptionStatus::Errored,
            };
        }
        Some(message)
    }

    /// Detach from the feed.
    ///
    /// Idempotent. After it returns no handler of this subscription is
    /// running and `next` yields `None`.
    pub async fn close(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            // Resolves once the task (and the stream it owns) is dropped.
            let _ = pump.await;
            tracing::debug!(subscription = %self.id, "Subscription detached");
        }
        self.events.close();
        self.terminal_emitted = true;
        if !self.status.is_terminal() {
            self.status = SubscriptionStatus::Closed;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("status", &self.status)
            .finish()
    }
}

async fn pump(id: SubscriptionId, mut stream: RawLogStream, tx: mpsc::Sender<FeedMessage>) {
    let termination = loop {
        match stream.next().await {
            Some(Ok(log)) => {
                if log.removed {
                    tracing::debug!(subscription = %id, tx_hash = ?log.transaction_hash, "Skipping log removed by reorg");
                    continue;
                }
                metrics::record_notice_observed();
                let notice = EventNotice::from_log(&log);
                if tx.send(FeedMessage::Notice(notice)).await.is_err() {
                    // Receiver closed: the subscription is being torn down.
                    return;
                }
            }
            Some(Err(e)) => break Termination::Errored(e.to_string()),
            None => break Termination::Closed,
        }
    };

    tracing::warn!(subscription = %id, %termination, "Event feed terminated");
    let _ = tx.send(FeedMessage::Terminated(termination)).await;
}

/// Opens subscriptions on an event source.
#[derive(Clone)]
pub struct SubscriptionManager {
    source: Arc<dyn EventSource>,
    buffer: usize,
}

impl SubscriptionManager {
    /// `buffer` bounds the notices queued between the feed and the reader.
    pub fn new(source: Arc<dyn EventSource>, buffer: usize) -> Self {
        Self { source, buffer }
    }

    /// Open a fresh subscription for `filter`.
    pub async fn open(&self, filter: &EventFilter) -> Subscription {
        match self.source.subscribe(filter).await {
            Ok(stream) => {
                let subscription = Subscription::live(filter.clone(), stream, self.buffer);
                tracing::info!(
                    subscription = %subscription.id(),
                    contract = %filter.contract,
                    event = %filter.event_signature,
                    "Subscription live"
                );
                subscription
            }
            Err(e) => {
                tracing::warn!(error = %e, "Subscribe failed");
                Subscription::failed(filter.clone(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::FeedError;
    use alloy::primitives::{Address, B256};
    use alloy::rpc::types::Log;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct ActiveGuard(Arc<AtomicUsize>);

    impl Drop for ActiveGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Source whose streams are driven by the test through channel senders.
    #[derive(Default)]
    struct ScriptedSource {
        senders: Mutex<Vec<mpsc::UnboundedSender<Result<Log, FeedError>>>>,
        active: Arc<AtomicUsize>,
        refuse: bool,
    }

    impl ScriptedSource {
        fn sender(&self, idx: usize) -> mpsc::UnboundedSender<Result<Log, FeedError>> {
            self.senders.lock().unwrap()[idx].clone()
        }

        fn drop_sender(&self, idx: usize) {
            let (closed, _) = mpsc::unbounded_channel();
            self.senders.lock().unwrap()[idx] = closed;
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn subscribe(&self, _filter: &EventFilter) -> Result<RawLogStream, FeedError> {
            if self.refuse {
                return Err(FeedError::Subscribe("rate limited".to_string()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().unwrap().push(tx);
            self.active.fetch_add(1, Ordering::SeqCst);
            let guard = ActiveGuard(self.active.clone());
            Ok(stream::unfold((rx, guard), |(mut rx, guard)| async move {
                rx.recv().await.map(|item| (item, (rx, guard)))
            })
            .boxed())
        }
    }

    fn filter() -> EventFilter {
        EventFilter::new(Address::repeat_byte(1), "Ping()")
    }

    fn log(byte: u8) -> Log {
        Log {
            transaction_hash: Some(B256::repeat_byte(byte)),
            block_number: Some(100),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_notices_in_order_then_single_terminal() {
        let source = Arc::new(ScriptedSource::default());
        let manager = SubscriptionManager::new(source.clone(), 8);
        let mut sub = manager.open(&filter()).await;
        assert_eq!(sub.status(), SubscriptionStatus::Live);

        let tx = source.sender(0);
        tx.send(Ok(log(1))).unwrap();
        tx.send(Ok(log(2))).unwrap();
        tx.send(Err(FeedError::Transport("connection reset".to_string()))).unwrap();
        // Anything after the error is never delivered.
        tx.send(Ok(log(3))).unwrap();

        for byte in [1u8, 2] {
            match sub.next().await {
                Some(FeedMessage::Notice(n)) => assert_eq!(n.trigger_id, Some(B256::repeat_byte(byte))),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(matches!(
            sub.next().await,
            Some(FeedMessage::Terminated(Termination::Errored(_)))
        ));
        assert_eq!(sub.status(), SubscriptionStatus::Errored);
        assert_eq!(sub.next().await, None);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_stream_end_is_closed() {
        let source = Arc::new(ScriptedSource::default());
        let manager = SubscriptionManager::new(source.clone(), 8);
        let mut sub = manager.open(&filter()).await;

        source.drop_sender(0);
        assert_eq!(
            sub.next().await,
            Some(FeedMessage::Terminated(Termination::Closed))
        );
        assert_eq!(sub.status(), SubscriptionStatus::Closed);
    }

    #[tokio::test]
    async fn test_removed_logs_are_skipped() {
        let source = Arc::new(ScriptedSource::default());
        let manager = SubscriptionManager::new(source.clone(), 8);
        let mut sub = manager.open(&filter()).await;

        let tx = source.sender(0);
        tx.send(Ok(Log { removed: true, ..log(1) })).unwrap();
        tx.send(Ok(log(2))).unwrap();

        match sub.next().await {
            Some(FeedMessage::Notice(n)) => assert_eq!(n.trigger_id, Some(B256::repeat_byte(2))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscribe_failure_yields_errored_subscription() {
        let source = Arc::new(ScriptedSource {
            refuse: true,
            ..Default::default()
        });
        let manager = SubscriptionManager::new(source, 8);
        let mut sub = manager.open(&filter()).await;

        assert_eq!(sub.status(), SubscriptionStatus::Errored);
        match sub.next().await {
            Some(FeedMessage::Terminated(Termination::Errored(reason))) => {
                assert!(reason.contains("rate limited"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sub.next().await, None);
        sub.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_detaches() {
        let source = Arc::new(ScriptedSource::default());
        let manager = SubscriptionManager::new(source.clone(), 8);
        let mut sub = manager.open(&filter()).await;
        assert_eq!(source.active.load(Ordering::SeqCst), 1);

        sub.close().await;
        assert_eq!(source.active.load(Ordering::SeqCst), 0);
        assert_eq!(sub.status(), SubscriptionStatus::Closed);
        sub.close().await;
        assert_eq!(sub.next().await, None);

        // Logs pushed to the old stream go nowhere.
        assert!(source.sender(0).send(Ok(log(1))).is_err());
    }

    #[tokio::test]
    async fn test_replace_never_leaves_two_active() {
        let source = Arc::new(ScriptedSource::default());
        let manager = SubscriptionManager::new(source.clone(), 8);

        let mut current = manager.open(&filter()).await;
        for _ in 0..5 {
            current.close().await;
            current = manager.open(&filter()).await;
            assert_eq!(source.active.load(Ordering::SeqCst), 1);
        }
        assert_ne!(current.id().as_u64(), 0);
    }
}
