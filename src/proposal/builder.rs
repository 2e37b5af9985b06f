//! Proposal construction and signing.
//!
//! # Responsibilities
//! - Validate the chaincode descriptor before anything touches the network
//! - Draw a fresh nonce per proposal and derive the transaction id from it
//! - Serialize and sign proposals with the caller's identity

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::identity::{CryptoSuite, Identity};
use crate::proposal::chaincode::ChainCode;
use crate::protocol::codec;
use crate::protocol::messages::{Header, HeaderType, Proposal, SignedProposal};

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 24;

/// Hex-encoded SHA-256 of `nonce ‖ creator`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn derive(nonce: &[u8], creator: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

/// A proposal ready for signing, with its id kept for correlation.
#[derive(Debug, Clone)]
pub struct UnsignedProposal {
    pub proposal: Proposal,
    pub tx_id: TransactionId,
}

/// Draw a fresh random nonce.
pub fn generate_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Milliseconds since the Unix epoch, zero if the clock is before it.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Build an unsigned proposal for `chaincode` on behalf of `identity`.
pub fn build_proposal(identity: &Identity, chaincode: &ChainCode) -> Result<UnsignedProposal> {
    build_proposal_with_nonce(identity, chaincode, generate_nonce())
}

pub(crate) fn build_proposal_with_nonce(
    identity: &Identity,
    chaincode: &ChainCode,
    nonce: Vec<u8>,
) -> Result<UnsignedProposal> {
    if chaincode.channel_id.is_empty() {
        return Err(Error::validation("channel id is empty"));
    }
    if chaincode.name.is_empty() {
        return Err(Error::validation("chaincode name is empty"));
    }

    let creator = identity.creator_bytes()?;
    let tx_id = TransactionId::derive(&nonce, &creator);

    let header = Header {
        header_type: HeaderType::EndorserTransaction,
        channel_id: chaincode.channel_id.clone(),
        tx_id: tx_id.to_string(),
        timestamp_ms: now_millis(),
        creator,
        nonce,
    };

    tracing::debug!(
        tx_id = %tx_id,
        channel = %chaincode.channel_id,
        chaincode = %chaincode.name,
        "Proposal built"
    );

    Ok(UnsignedProposal {
        proposal: Proposal {
            header,
            invocation: chaincode.invocation(),
        },
        tx_id,
    })
}

/// Serialize and sign a proposal.
pub fn sign_proposal(
    unsigned: &UnsignedProposal,
    identity: &Identity,
    suite: &dyn CryptoSuite,
) -> Result<SignedProposal> {
    let proposal_bytes = codec::encode("proposal", &unsigned.proposal)?;
    let signature = identity.sign(suite, &proposal_bytes)?;
    Ok(SignedProposal {
        proposal_bytes,
        signature,
    })
}
