//! Ordered, cancellable block subscriptions.
//!
//! # Responsibilities
//! - Open a subscription with a signed seek request
//! - Decode blocks concurrently while delivering them in block order
//! - Stop promptly on cancellation and release the connection
//! - Report a mid-stream failure exactly once, then close

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::config::{EventsConfig, PeerConfig, TimeoutConfig};
use crate::error::{Error, Result, TransportError};
use crate::events::cancel::CancelToken;
use crate::events::decode::{BlockDecoder, BlockEvent, EnvelopeDecoder, EventMode, RawBlock};
use crate::events::transport::{DeliverStream, DeliverTransport, WsDeliver};
use crate::identity::{CryptoSuite, Identity};
use crate::net::{Lease, LeaseTracker};
use crate::observability::metrics::Metrics;
use crate::proposal::builder::{generate_nonce, now_millis, TransactionId};
use crate::protocol::codec::{self, CodecError};
use crate::protocol::messages::{
    DeliverResponse, Envelope, Header, HeaderType, Payload, SeekInfo, SeekPosition, Status,
};

/// Lifecycle of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    /// Seek request accepted, no block delivered yet.
    Subscribed,
    Streaming,
    Closed,
    Errored,
}

impl ListenerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ListenerState::Closed | ListenerState::Errored)
    }
}

/// Unique id of a subscription, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
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

/// What to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub channel_id: String,
    pub start: SeekPosition,
    /// Last block to deliver; `None` streams until cancelled.
    pub stop: Option<u64>,
    pub mode: EventMode,
}

impl SubscribeRequest {
    /// Full blocks from the newest one onwards.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            start: SeekPosition::Newest,
            stop: None,
            mode: EventMode::Full,
        }
    }

    pub fn start_at(mut self, start: SeekPosition) -> Self {
        self.start = start;
        self
    }

    pub fn stop_at(mut self, block: u64) -> Self {
        self.stop = Some(block);
        self
    }

    pub fn filtered(mut self) -> Self {
        self.mode = EventMode::Filtered;
        self
    }

    fn seek_info(&self) -> SeekInfo {
        SeekInfo {
            start: self.start,
            stop: SeekPosition::Specified(self.stop.unwrap_or(u64::MAX)),
            filtered: self.mode == EventMode::Filtered,
        }
    }
}

/// Subscribes to one peer's event source.
#[derive(Clone)]
pub struct EventListener {
    source: String,
    transport: Arc<dyn DeliverTransport>,
    decoder: Arc<dyn BlockDecoder>,
    identity: Arc<Identity>,
    crypto: Arc<dyn CryptoSuite>,
    decode_concurrency: usize,
    buffer_size: usize,
    subscriptions: LeaseTracker,
    metrics: Metrics,
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("source", &self.source)
            .field("decode_concurrency", &self.decode_concurrency)
            .field("active_subscriptions", &self.subscriptions.open())
            .finish()
    }
}

impl EventListener {
    pub fn new(
        source: impl Into<String>,
        transport: Arc<dyn DeliverTransport>,
        identity: Arc<Identity>,
        crypto: Arc<dyn CryptoSuite>,
        config: &EventsConfig,
    ) -> Self {
        let source = source.into();
        Self {
            subscriptions: LeaseTracker::new(format!("{}/subscriptions", source)),
            source,
            transport,
            decoder: Arc::new(EnvelopeDecoder::new()),
            identity,
            crypto,
            decode_concurrency: config.decode_concurrency.max(1),
            buffer_size: config.buffer_size.max(1),
            metrics: Metrics::default(),
        }
    }

    /// Listener over the peer's WebSocket event address.
    pub fn from_peer_config(
        peer: &PeerConfig,
        timeouts: &TimeoutConfig,
        events: &EventsConfig,
        identity: Arc<Identity>,
        crypto: Arc<dyn CryptoSuite>,
    ) -> Result<Self> {
        let address = peer.event_address.as_deref().ok_or_else(|| {
            Error::validation(format!("peer '{}' has no event address", peer.name))
        })?;
        let transport = WsDeliver::new(
            peer.name.clone(),
            address,
            Duration::from_secs(timeouts.connect_secs),
        );
        Ok(Self::new(peer.name.clone(), Arc::new(transport), identity, crypto, events))
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn BlockDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Subscriptions whose background task is still running.
    pub fn active_subscriptions(&self) -> u64 {
        self.subscriptions.open()
    }

    /// Wait until every subscription has released its connection.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        self.subscriptions.wait_idle(limit).await
    }

    /// Open a subscription. Connection failures are returned here; failures
    /// after this returns arrive through the stream.
    pub async fn subscribe(&self, request: SubscribeRequest, cancel: CancelToken) -> Result<EventStream> {
        if request.channel_id.is_empty() {
            return Err(Error::validation("channel id is empty"));
        }

        let id = SubscriptionId::new();
        let (state_tx, state_rx) = watch::channel(ListenerState::Disconnected);
        let seek = self.seek_envelope(&request)?;

        state_tx.send_replace(ListenerState::Connecting);
        tracing::debug!(subscription = %id, source = %self.source, channel = %request.channel_id, "Subscribing");

        let frames = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                state_tx.send_replace(ListenerState::Closed);
                return Err(Error::StreamTerminated {
                    reason: "cancelled before the subscription opened".to_string(),
                    source: None,
                });
            }
            opened = self.transport.open(seek) => match opened {
                Ok(frames) => frames,
                Err(e) => {
                    state_tx.send_replace(ListenerState::Errored);
                    tracing::warn!(subscription = %id, source = %self.source, error = %e, "Subscription failed");
                    return Err(Error::Transport(e));
                }
            },
        };

        state_tx.send_replace(ListenerState::Subscribed);
        let lease = self.subscriptions.acquire();
        self.metrics
            .record_active_subscriptions(&self.source, self.subscriptions.open());

        let (tx, rx) = mpsc::channel(self.buffer_size);
        let stop = CancelToken::new();
        let task = SubscriptionTask {
            id,
            source: self.source.clone(),
            mode: request.mode,
            decoder: Arc::clone(&self.decoder),
            decode_concurrency: self.decode_concurrency,
            tx,
            state: state_tx,
            cancel: cancel.clone(),
            stop: stop.clone(),
            tracker: self.subscriptions.clone(),
            lease,
            metrics: self.metrics,
        };
        tokio::spawn(task.run(frames));

        tracing::info!(subscription = %id, source = %self.source, mode = request.mode.as_str(), "Subscribed");
        Ok(EventStream {
            id,
            rx,
            state: state_rx,
            cancel,
            stop,
        })
    }

    fn seek_envelope(&self, request: &SubscribeRequest) -> Result<Envelope> {
        let creator = self.identity.creator_bytes()?;
        let nonce = generate_nonce();
        let header = Header {
            header_type: HeaderType::DeliverSeekInfo,
            channel_id: request.channel_id.clone(),
            tx_id: TransactionId::derive(&nonce, &creator).into(),
            timestamp_ms: now_millis(),
            creator,
            nonce,
        };
        let payload = Payload {
            header,
            data: codec::encode("seek info", &request.seek_info())?,
        };
        let payload = codec::encode("seek payload", &payload)?;
        let signature = self.identity.sign(self.crypto.as_ref(), &payload)?;
        Ok(Envelope { payload, signature })
    }
}

enum Decoded {
    Block(u64, std::result::Result<BlockEvent, CodecError>),
    Status(Status),
    Failed(TransportError),
}

struct SubscriptionTask {
    id: SubscriptionId,
    source: String,
    mode: EventMode,
    decoder: Arc<dyn BlockDecoder>,
    decode_concurrency: usize,
    tx: mpsc::Sender<Result<BlockEvent>>,
    state: watch::Sender<ListenerState>,
    cancel: CancelToken,
    stop: CancelToken,
    tracker: LeaseTracker,
    lease: Lease,
    metrics: Metrics,
}

impl SubscriptionTask {
    async fn run(self, frames: DeliverStream) {
        let decoder = Arc::clone(&self.decoder);
        let mut decoded = frames
            .map(move |frame| {
                let decoder = Arc::clone(&decoder);
                async move {
                    match frame {
                        Ok(DeliverResponse::Block(block)) => {
                            let raw = RawBlock::Full(block);
                            Decoded::Block(raw.number(), decoder.decode(raw).await)
                        }
                        Ok(DeliverResponse::FilteredBlock(block)) => {
                            let raw = RawBlock::Filtered(block);
                            Decoded::Block(raw.number(), decoder.decode(raw).await)
                        }
                        Ok(DeliverResponse::Status(status)) => Decoded::Status(status),
                        Err(e) => Decoded::Failed(e),
                    }
                }
            })
            .buffered(self.decode_concurrency);

        let mut last_delivered: Option<u64> = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.stopped() => break self.close("cancelled"),
                next = decoded.next() => next,
            };

            let event = match next {
                Some(Decoded::Block(_, Ok(event))) => event,
                Some(Decoded::Block(number, Err(e))) => {
                    break self
                        .terminate(format!("block {} could not be decoded: {}", number, e), None)
                        .await
                }
                Some(Decoded::Status(status)) if status.is_success() => {
                    break self.close("stop position reached")
                }
                Some(Decoded::Status(status)) => {
                    break self
                        .terminate(format!("event source answered with status {:?}", status), None)
                        .await
                }
                Some(Decoded::Failed(e)) => {
                    break self.terminate("transport failure".to_string(), Some(e)).await
                }
                None => {
                    break self
                        .terminate("event source closed the stream".to_string(), None)
                        .await
                }
            };

            let number = event.number();
            if last_delivered.is_some_and(|last| number <= last) {
                tracing::debug!(subscription = %self.id, block = number, "Dropping already delivered block");
                continue;
            }

            let event = match (self.mode, event) {
                (EventMode::Full, BlockEvent::Filtered(_)) => {
                    // A filtered block cannot be widened back to a full one.
                    break self
                        .terminate(
                            format!("block {} arrived filtered on a full subscription", number),
                            None,
                        )
                        .await
                }
                (EventMode::Full, event) => event,
                (EventMode::Filtered, event) => BlockEvent::Filtered(event.into_filtered()),
            };

            let sent = tokio::select! {
                biased;
                _ = self.stopped() => false,
                sent = self.tx.send(Ok(event)) => sent.is_ok(),
            };
            if !sent {
                break self.close("cancelled");
            }

            last_delivered = Some(number);
            self.state.send_if_modified(|state| {
                let changed = *state != ListenerState::Streaming;
                *state = ListenerState::Streaming;
                changed
            });
            self.metrics.record_block_delivered(&self.source, self.mode.as_str());
            tracing::trace!(subscription = %self.id, block = number, "Block delivered");
        }

        drop(decoded);
        drop(self.lease);
        self.metrics.record_active_subscriptions(&self.source, self.tracker.open());
    }

    /// Resolves when either the caller or the stream's owner stops the subscription.
    async fn stopped(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.stop.cancelled() => {}
        }
    }

    fn close(&self, reason: &str) {
        self.state.send_replace(ListenerState::Closed);
        tracing::info!(subscription = %self.id, source = %self.source, reason, "Subscription closed");
    }

    async fn terminate(&self, reason: String, source: Option<TransportError>) {
        self.state.send_replace(ListenerState::Errored);
        tracing::warn!(
            subscription = %self.id,
            source = %self.source,
            reason = %reason,
            error = ?source,
            "Subscription terminated"
        );
        let err = Error::StreamTerminated { reason, source };
        tokio::select! {
            biased;
            _ = self.stopped() => {}
            _ = self.tx.send(Err(err)) => {}
        }
    }
}

/// Delivered events of one subscription, in block order.
///
/// Ends after a clean close, after the single terminal error, or once the
/// caller's token is cancelled. Dropping it cancels the subscription.
pub struct EventStream {
    id: SubscriptionId,
    rx: mpsc::Receiver<Result<BlockEvent>>,
    state: watch::Receiver<ListenerState>,
    cancel: CancelToken,
    stop: CancelToken,
}

impl EventStream {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Current state of the subscription.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ListenerState> {
        self.state.clone()
    }

    /// Stop this subscription without touching the caller's token.
    pub fn close(&self) {
        self.stop.cancel();
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Stream for EventStream {
    type Item = Result<BlockEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() || this.stop.is_cancelled() {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
