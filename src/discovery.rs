//! Endorser resolution.
//!
//! The collector only consumes an ordered list of peers. Where that list
//! comes from is behind [`EndorserResolver`]; [`StaticResolver`] answers from
//! configuration.

use async_trait::async_trait;

use crate::config::{ClientConfig, PeerConfig};
use crate::error::{Error, Result};

/// Supplies the peers that should endorse proposals on a channel.
#[async_trait]
pub trait EndorserResolver: Send + Sync {
    async fn endorsers(&self, channel_id: &str) -> Result<Vec<PeerConfig>>;
}

/// Resolver backed by the configured peer list.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    endorsers: Vec<PeerConfig>,
}

impl StaticResolver {
    pub fn new(endorsers: Vec<PeerConfig>) -> Self {
        Self { endorsers }
    }

    /// `endorsement.targets` in order, or every peer when none are listed.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        if config.endorsement.targets.is_empty() {
            return Ok(Self::new(config.peers.clone()));
        }
        let endorsers = config
            .endorsement
            .targets
            .iter()
            .map(|name| {
                config
                    .peer(name)
                    .cloned()
                    .ok_or_else(|| Error::validation(format!("unknown endorsement target '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(endorsers))
    }
}

#[async_trait]
impl EndorserResolver for StaticResolver {
    async fn endorsers(&self, _channel_id: &str) -> Result<Vec<PeerConfig>> {
        Ok(self.endorsers.clone())
    }
}
