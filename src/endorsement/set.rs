//! Per-peer endorsement results.

use crate::error::{EndorsementFailure, Error, Result};
use crate::protocol::messages::ProposalResponse;

/// What one dialed peer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerResponse {
    pub peer: String,
    pub outcome: std::result::Result<ProposalResponse, EndorsementFailure>,
}

impl PeerResponse {
    pub fn answered(peer: impl Into<String>, response: ProposalResponse) -> Self {
        Self {
            peer: peer.into(),
            outcome: Ok(response),
        }
    }

    pub fn failed(peer: impl Into<String>, failure: impl Into<EndorsementFailure>) -> Self {
        Self {
            peer: peer.into(),
            outcome: Err(failure.into()),
        }
    }

    /// The response, if the peer answered at all.
    pub fn response(&self) -> Option<&ProposalResponse> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&EndorsementFailure> {
        self.outcome.as_ref().err()
    }
}

/// One entry per dialed peer, in dial order. Peer names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndorsementSet {
    entries: Vec<PeerResponse>,
}

impl EndorsementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry; a second entry for the same peer is an error.
    pub fn insert(&mut self, response: PeerResponse) -> Result<()> {
        if self.contains(&response.peer) {
            return Err(Error::validation(format!(
                "duplicate endorsement entry for peer '{}'",
                response.peer
            )));
        }
        self.entries.push(response);
        Ok(())
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.entries.iter().any(|e| e.peer == peer)
    }

    pub fn get(&self, peer: &str) -> Option<&PeerResponse> {
        self.entries.iter().find(|e| e.peer == peer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PeerResponse> {
        self.entries.iter()
    }

    /// Peer names in dial order.
    pub fn peers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.peer.as_str()).collect()
    }
}

impl IntoIterator for EndorsementSet {
    type Item = PeerResponse;
    type IntoIter = std::vec::IntoIter<PeerResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EndorsementSet {
    type Item = &'a PeerResponse;
    type IntoIter = std::slice::Iter<'a, PeerResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::time::Duration;

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut set = EndorsementSet::new();
        set.insert(PeerResponse::failed("peer0", EndorsementFailure::MissingEndorsement))
            .unwrap();
        let err = set
            .insert(PeerResponse::failed("peer0", EndorsementFailure::BadSignature))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("peer0")));
        assert_eq!(set.len(), 1);
        // First entry is kept
        assert_eq!(
            set.get("peer0").unwrap().failure(),
            Some(&EndorsementFailure::MissingEndorsement)
        );
    }

    #[test]
    fn test_order_preserved() {
        let mut set = EndorsementSet::with_capacity(3);
        for peer in ["peerB", "peerA", "peerC"] {
            set.insert(PeerResponse::failed(
                peer,
                TransportError::Timeout { endpoint: peer.into(), after: Duration::from_secs(1) },
            ))
            .unwrap();
        }
        assert_eq!(set.peers(), vec!["peerB", "peerA", "peerC"]);
    }
}
