//! Wire transport to an orderer.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::OrdererConfig;
use crate::error::TransportError;
use crate::net::JsonHttpClient;
use crate::protocol::messages::{BroadcastResponse, Envelope};

/// Path of the broadcast endpoint below an orderer's address.
pub const BROADCAST_PATH: &str = "v1/broadcast";

#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse, TransportError>;
}

/// HTTP JSON broadcast transport.
#[derive(Debug, Clone)]
pub struct HttpBroadcaster {
    http: JsonHttpClient,
}

impl HttpBroadcaster {
    pub fn new(config: &OrdererConfig, connect_timeout: Duration) -> Result<Self, TransportError> {
        let http = JsonHttpClient::new(
            config.name.clone(),
            &config.address,
            connect_timeout,
            config.tls_ca_path.as_deref(),
        )?;
        Ok(Self { http })
    }
}

#[async_trait]
impl BroadcastTransport for HttpBroadcaster {
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse, TransportError> {
        self.http.post(BROADCAST_PATH, &envelope).await
    }
}
