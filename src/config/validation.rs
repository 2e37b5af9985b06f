//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (endorsement targets reference known peers)
//! - Reject duplicate names instead of letting the last entry win
//! - Validate value ranges (timeouts > 0, quorum reachable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the client

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::ClientConfig;
use crate::identity::CryptoFamily;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.identity.msp_id.is_empty() {
        errors.push(ValidationError::new("identity.msp_id", "must not be empty"));
    }
    if config.identity.crypto.family.parse::<CryptoFamily>().is_err() {
        errors.push(ValidationError::new(
            "identity.crypto.family",
            format!("unsupported family '{}'", config.identity.crypto.family),
        ));
    }
    if config.channel.channel_id.is_empty() {
        errors.push(ValidationError::new("channel.channel_id", "must not be empty"));
    }
    if config
        .channel
        .chaincode_type
        .parse::<crate::protocol::ChaincodeType>()
        .is_err()
    {
        errors.push(ValidationError::new(
            "channel.chaincode_type",
            format!("unknown type '{}'", config.channel.chaincode_type),
        ));
    }

    let mut peer_names = HashSet::new();
    for (i, peer) in config.peers.iter().enumerate() {
        if peer.name.is_empty() {
            errors.push(ValidationError::new(format!("peers[{}].name", i), "must not be empty"));
        } else if !peer_names.insert(peer.name.as_str()) {
            errors.push(ValidationError::new(
                format!("peers[{}].name", i),
                format!("duplicate peer name '{}'", peer.name),
            ));
        }
        if url::Url::parse(&peer.address).is_err() {
            errors.push(ValidationError::new(
                format!("peers[{}].address", i),
                format!("invalid URL '{}'", peer.address),
            ));
        }
        if let Some(events) = &peer.event_address {
            if url::Url::parse(events).is_err() {
                errors.push(ValidationError::new(
                    format!("peers[{}].event_address", i),
                    format!("invalid URL '{}'", events),
                ));
            }
        }
    }

    let mut orderer_names = HashSet::new();
    for (i, orderer) in config.orderers.iter().enumerate() {
        if orderer.name.is_empty() {
            errors.push(ValidationError::new(format!("orderers[{}].name", i), "must not be empty"));
        } else if !orderer_names.insert(orderer.name.as_str()) {
            errors.push(ValidationError::new(
                format!("orderers[{}].name", i),
                format!("duplicate orderer name '{}'", orderer.name),
            ));
        }
        if url::Url::parse(&orderer.address).is_err() {
            errors.push(ValidationError::new(
                format!("orderers[{}].address", i),
                format!("invalid URL '{}'", orderer.address),
            ));
        }
    }

    let mut targets = HashSet::new();
    for target in &config.endorsement.targets {
        if !peer_names.contains(target.as_str()) {
            errors.push(ValidationError::new(
                "endorsement.targets",
                format!("unknown peer '{}'", target),
            ));
        }
        if !targets.insert(target.as_str()) {
            errors.push(ValidationError::new(
                "endorsement.targets",
                format!("peer '{}' listed twice", target),
            ));
        }
    }
    if config.endorsement.min_endorsements == 0 {
        errors.push(ValidationError::new("endorsement.min_endorsements", "must be at least 1"));
    }
    // Without targets every configured peer is dialed. A config with no
    // peers at all gets its peers registered on the client later.
    let (dialed, what) = if config.endorsement.targets.is_empty() {
        (config.peers.len(), "peers")
    } else {
        (config.endorsement.targets.len(), "targets")
    };
    if dialed > 0 && config.endorsement.min_endorsements > dialed {
        errors.push(ValidationError::new(
            "endorsement.min_endorsements",
            format!(
                "{} exceeds the {} configured {}",
                config.endorsement.min_endorsements, dialed, what
            ),
        ));
    }

    if let Some(peer) = &config.events.peer {
        match config.peer(peer) {
            None => errors.push(ValidationError::new("events.peer", format!("unknown peer '{}'", peer))),
            Some(p) if p.event_address.is_none() => errors.push(ValidationError::new(
                "events.peer",
                format!("peer '{}' has no event_address", peer),
            )),
            Some(_) => {}
        }
    }
    if config.events.decode_concurrency == 0 {
        errors.push(ValidationError::new("events.decode_concurrency", "must be at least 1"));
    }
    if config.events.buffer_size == 0 {
        errors.push(ValidationError::new("events.buffer_size", "must be at least 1"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
