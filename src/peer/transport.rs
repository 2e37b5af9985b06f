//! Wire transport to an endorsing peer.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::PeerConfig;
use crate::error::TransportError;
use crate::net::JsonHttpClient;
use crate::protocol::messages::{ProposalResponse, SignedProposal};

/// Path of the endorsement endpoint below a peer's address.
pub const PROPOSALS_PATH: &str = "v1/proposals";

/// Sends a signed proposal to one peer and returns its raw reply.
#[async_trait]
pub trait EndorserTransport: Send + Sync {
    async fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError>;
}

/// HTTP JSON endorser transport.
#[derive(Debug, Clone)]
pub struct HttpEndorser {
    http: JsonHttpClient,
}

impl HttpEndorser {
    pub fn new(config: &PeerConfig, connect_timeout: Duration) -> Result<Self, TransportError> {
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
impl EndorserTransport for HttpEndorser {
    async fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        self.http.post(PROPOSALS_PATH, proposal).await
    }
}
