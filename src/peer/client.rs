//! Peer client with per-call deadline.
//!
//! # Responsibilities
//! - Own one pooled transport per peer, reused across calls
//! - Bound every call by the configured request deadline
//! - Track in-flight calls so callers can observe release

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::config::{PeerConfig, TimeoutConfig};
use crate::error::TransportError;
use crate::net::LeaseTracker;
use crate::observability::metrics::Metrics;
use crate::peer::transport::{EndorserTransport, HttpEndorser};
use crate::protocol::messages::{ProposalResponse, SignedProposal};

/// Connection wrapper for one endorsing peer.
#[derive(Clone)]
pub struct PeerClient {
    name: String,
    event_address: Option<String>,
    transport: Arc<dyn EndorserTransport>,
    request_timeout: Duration,
    in_flight: LeaseTracker,
    metrics: Metrics,
}

impl std::fmt::Debug for PeerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerClient")
            .field("name", &self.name)
            .field("request_timeout", &self.request_timeout)
            .field("in_flight", &self.in_flight.open())
            .finish()
    }
}

impl PeerClient {
    /// Build a client backed by the HTTP transport.
    pub fn from_config(config: &PeerConfig, timeouts: &TimeoutConfig) -> Result<Self, TransportError> {
        let transport = HttpEndorser::new(config, Duration::from_secs(timeouts.connect_secs))?;
        Ok(Self::with_transport(
            config.name.clone(),
            Arc::new(transport),
            Duration::from_secs(timeouts.request_secs),
        )
        .with_event_address(config.event_address.clone()))
    }

    /// Build a client over any transport.
    pub fn with_transport(
        name: impl Into<String>,
        transport: Arc<dyn EndorserTransport>,
        request_timeout: Duration,
    ) -> Self {
        let name = name.into();
        Self {
            in_flight: LeaseTracker::new(format!("{}/calls", name)),
            name,
            event_address: None,
            transport,
            request_timeout,
            metrics: Metrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_event_address(mut self, event_address: Option<String>) -> Self {
        self.event_address = event_address;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event_address(&self) -> Option<&str> {
        self.event_address.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Number of calls currently waiting on this peer.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.open()
    }

    /// Send a signed proposal for simulation and endorsement.
    pub async fn evaluate(&self, proposal: &SignedProposal) -> Result<ProposalResponse, TransportError> {
        let _lease = self.in_flight.acquire();
        let start = Instant::now();

        let result = match timeout(self.request_timeout, self.transport.process_proposal(proposal)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(peer = %self.name, after = ?self.request_timeout, "Endorsement call timed out");
                Err(TransportError::Timeout {
                    endpoint: self.name.clone(),
                    after: self.request_timeout,
                })
            }
        };

        self.metrics.record_peer_call(&self.name, result.is_ok(), start);
        if let Err(e) = &result {
            tracing::debug!(peer = %self.name, error = %e, "Endorsement call failed");
        }
        result
    }
}
