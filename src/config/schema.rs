//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ledger client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Signing identity (MSP id, key material, crypto family).
    pub identity: IdentityConfig,

    /// Default channel and chaincode.
    pub channel: ChannelConfig,

    /// Endorsing peers, addressed by name.
    pub peers: Vec<PeerConfig>,

    /// Ordering service nodes, addressed by name.
    pub orderers: Vec<OrdererConfig>,

    /// Fan-out targets and quorum.
    pub endorsement: EndorsementConfig,

    /// Event subscription settings.
    pub events: EventsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// MSP id that owns the signing identity.
    pub msp_id: String,

    /// Directory holding `keystore/` and `signcerts/`.
    pub msp_config_path: String,

    /// Signature algorithm settings.
    pub crypto: CryptoConfig,
}

/// Crypto suite selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Algorithm family (only "ecdsa" is supported).
    pub family: String,

    /// Curve and digest pairing, informational.
    pub algorithm: String,

    /// Digest algorithm, informational.
    pub hash: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            family: "ecdsa".to_string(),
            algorithm: "secp256k1-sha256".to_string(),
            hash: "sha2-256".to_string(),
        }
    }
}

/// Default channel and chaincode for calls built from arguments alone.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub chaincode_name: String,
    pub chaincode_version: String,
    /// "golang", "node", "java" or "car".
    pub chaincode_type: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            chaincode_name: String::new(),
            chaincode_version: String::new(),
            chaincode_type: "golang".to_string(),
        }
    }
}

/// Endorsing peer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    /// Unique peer name.
    pub name: String,

    /// Base URL of the endorsement endpoint (e.g., "http://peer0:7051").
    pub address: String,

    /// Base URL of the event endpoint (e.g., "ws://peer0:7053").
    #[serde(default)]
    pub event_address: Option<String>,

    /// CA certificate (PEM) trusted for this peer.
    #[serde(default)]
    pub tls_ca_path: Option<String>,
}

/// Orderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdererConfig {
    /// Unique orderer name.
    pub name: String,

    /// Base URL of the broadcast endpoint.
    pub address: String,

    /// CA certificate (PEM) trusted for this orderer.
    #[serde(default)]
    pub tls_ca_path: Option<String>,
}

/// Endorsement fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndorsementConfig {
    /// Peers dialed when the caller names none.
    pub targets: Vec<String>,

    /// Minimum number of agreeing endorsements.
    pub min_endorsements: usize,

    /// Check each endorsement signature before assembly.
    pub verify_signatures: bool,
}

impl Default for EndorsementConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            min_endorsements: 1,
            verify_signatures: true,
        }
    }
}

/// Event listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Peer used for subscriptions when the caller names none.
    pub peer: Option<String>,

    /// Blocks decoded concurrently; delivery stays in order.
    pub decode_concurrency: usize,

    /// Capacity of the per-subscription delivery channel.
    pub buffer_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            peer: None,
            decode_concurrency: 4,
            buffer_size: 64,
        }
    }
}

/// Timeout configuration for network calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-call deadline in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 3,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    pub log_filter: String,

    /// Record client metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "ledger_client=info".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Look up a peer by name.
    pub fn peer(&self, name: &str) -> Option<&PeerConfig> {
        self.peers.iter().find(|p| p.name == name)
    }

    /// Look up an orderer by name.
    pub fn orderer(&self, name: &str) -> Option<&OrdererConfig> {
        self.orderers.iter().find(|o| o.name == name)
    }
}
