//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{TxHash, B256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use pong_bot::blockchain::{BlockchainError, BlockchainResult, ConfirmationStatus, LedgerQuery};
use pong_bot::feed::{EventFilter, EventSource, FeedError, RawLogStream};
use pong_bot::notify::{NotificationChannel, NotifyError};
use pong_bot::responder::ReactionSubmitter;

type LogSender = mpsc::UnboundedSender<Result<Log, FeedError>>;

/// Decrements the live-stream count when a stream is dropped.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Event source whose streams are driven from the test.
///
/// Every subscribe call is recorded with its filter; each accepted call gets
/// its own sender, addressed by acceptance order.
#[derive(Default)]
pub struct MockFeed {
    filters: Mutex<Vec<EventFilter>>,
    senders: Mutex<Vec<LogSender>>,
    refusals: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Refuse the next `n` subscribe calls.
    pub fn refuse_next(&self, n: usize) {
        self.refusals.store(n, Ordering::SeqCst);
    }

    /// Subscribe calls made so far, refused ones included.
    pub fn attempts(&self) -> usize {
        self.filters.lock().unwrap().len()
    }

    /// Streams handed out so far.
    pub fn opened(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Streams not yet dropped by their subscriber.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn filters(&self) -> Vec<EventFilter> {
        self.filters.lock().unwrap().clone()
    }

    /// Deliver a log on stream `idx`.
    pub fn emit(&self, idx: usize, log: Log) {
        let _ = self.senders.lock().unwrap()[idx].send(Ok(log));
    }

    /// Fail stream `idx` with a transport error.
    pub fn fail(&self, idx: usize, reason: &str) {
        let _ = self.senders.lock().unwrap()[idx].send(Err(FeedError::Transport(reason.to_string())));
    }

    /// End stream `idx` cleanly.
    pub fn end(&self, idx: usize) {
        let (closed, _) = mpsc::unbounded_channel();
        self.senders.lock().unwrap()[idx] = closed;
    }
}

#[async_trait]
impl EventSource for MockFeed {
    async fn subscribe(&self, filter: &EventFilter) -> Result<RawLogStream, FeedError> {
        self.filters.lock().unwrap().push(filter.clone());
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(FeedError::Subscribe("429 Too Many Requests".to_string()));
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

/// Ledger with scripted probe results; `Ok(height)` once the script runs out.
pub struct MockLedger {
    script: Mutex<VecDeque<BlockchainResult<u64>>>,
    height: u64,
    calls: AtomicUsize,
}

impl MockLedger {
    pub fn healthy(height: u64) -> Arc<Self> {
        Self::scripted(Vec::new(), height)
    }

    pub fn scripted(script: Vec<BlockchainResult<u64>>, height: u64) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            height,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerQuery for MockLedger {
    async fn block_number(&self) -> BlockchainResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(self.height))
    }
}

pub fn rpc_down() -> BlockchainError {
    BlockchainError::Rpc("connection refused".to_string())
}

/// Submitter that records targets and confirms everything.
#[derive(Default)]
pub struct RecordingSubmitter {
    submitted: Mutex<Vec<B256>>,
}

impl RecordingSubmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn submitted(&self) -> Vec<B256> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReactionSubmitter for RecordingSubmitter {
    async fn submit(&self, target: B256) -> BlockchainResult<TxHash> {
        self.submitted.lock().unwrap().push(target);
        Ok(TxHash::repeat_byte(0xee))
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        Ok(ConfirmationStatus::Confirmed {
            tx_hash,
            block_number: 7_000_001,
        })
    }
}

/// Notification channel that keeps every message.
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// A `Ping()` log emitted by transaction `0x<byte…>` in `block`.
pub fn ping_log(byte: u8, block: u64) -> Log {
    Log {
        transaction_hash: Some(B256::repeat_byte(byte)),
        block_number: Some(block),
        log_index: Some(0),
        ..Default::default()
    }
}

/// Poll `condition` until it holds, advancing (possibly paused) time.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Start a programmable mock HTTP backend on an ephemeral port.
///
/// Each request body is passed to `f`, which returns the status and body of
/// the response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request = read_request_body(&mut socket).await;
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP/1.1 request and return its body.
async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return String::from_utf8_lossy(&buf[header_end + 4..header_end + 4 + content_length])
                    .into_owned();
            }
        }
    }
    String::new()
}
