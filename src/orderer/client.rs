//! Orderer client.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::{OrdererConfig, TimeoutConfig};
use crate::error::TransportError;
use crate::observability::metrics::Metrics;
use crate::orderer::transport::{BroadcastTransport, HttpBroadcaster};
use crate::protocol::messages::{Envelope, Status};

/// Outcome of a broadcast the orderer answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Accepted,
    Rejected { status: Status, info: String },
}

impl SubmitStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitStatus::Accepted)
    }
}

/// Connection wrapper for one orderer.
#[derive(Clone)]
pub struct OrdererClient {
    name: String,
    transport: Arc<dyn BroadcastTransport>,
    request_timeout: Duration,
    metrics: Metrics,
}

impl std::fmt::Debug for OrdererClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdererClient")
            .field("name", &self.name)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl OrdererClient {
    pub fn from_config(config: &OrdererConfig, timeouts: &TimeoutConfig) -> Result<Self, TransportError> {
        let transport = HttpBroadcaster::new(config, Duration::from_secs(timeouts.connect_secs))?;
        Ok(Self::with_transport(
            config.name.clone(),
            Arc::new(transport),
            Duration::from_secs(timeouts.request_secs),
        ))
    }

    pub fn with_transport(
        name: impl Into<String>,
        transport: Arc<dyn BroadcastTransport>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            request_timeout,
            metrics: Metrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hand an envelope to the orderer. Never retried.
    pub async fn submit(&self, envelope: Envelope) -> Result<SubmitStatus, TransportError> {
        let response = match timeout(self.request_timeout, self.transport.broadcast(envelope)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(orderer = %self.name, after = ?self.request_timeout, "Broadcast timed out");
                Err(TransportError::Timeout {
                    endpoint: self.name.clone(),
                    after: self.request_timeout,
                })
            }
        };

        let status = match response {
            Ok(r) if r.status.is_success() => SubmitStatus::Accepted,
            Ok(r) => SubmitStatus::Rejected {
                status: r.status,
                info: r.info,
            },
            Err(e) => {
                self.metrics.record_submission(&self.name, "error");
                return Err(e);
            }
        };

        self.metrics.record_submission(
            &self.name,
            if status.is_accepted() { "accepted" } else { "rejected" },
        );
        Ok(status)
    }
}
