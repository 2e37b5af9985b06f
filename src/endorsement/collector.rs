//! Concurrent endorsement fan-out.
//!
//! # Responsibilities
//! - Dial every target peer concurrently with the same signed proposal
//! - Wait for exactly one result per target, success or failure
//! - Abort outstanding calls if the caller stops waiting

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::task::AbortHandle;

use crate::endorsement::set::{EndorsementSet, PeerResponse};
use crate::error::{Error, Result, TransportError};
use crate::observability::metrics::Metrics;
use crate::peer::PeerClient;
use crate::protocol::messages::SignedProposal;

/// Aborts every spawned call when dropped before the join completes.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Fans a proposal out to peers and joins on all of them.
#[derive(Debug, Clone, Default)]
pub struct EndorsementCollector {
    metrics: Metrics,
}

impl EndorsementCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Send `proposal` to every target and return one entry per target.
    ///
    /// Only input errors fail the call; peer errors land in the set.
    pub async fn collect(
        &self,
        proposal: Arc<SignedProposal>,
        targets: &[PeerClient],
    ) -> Result<EndorsementSet> {
        if targets.is_empty() {
            return Err(Error::validation("no endorsement targets"));
        }
        let mut seen = HashSet::with_capacity(targets.len());
        for peer in targets {
            if !seen.insert(peer.name()) {
                return Err(Error::validation(format!(
                    "duplicate endorsement target '{}'",
                    peer.name()
                )));
            }
        }

        let start = Instant::now();
        tracing::debug!(targets = targets.len(), "Fanning out proposal");

        let handles: Vec<_> = targets
            .iter()
            .map(|peer| {
                let peer = peer.clone();
                let proposal = Arc::clone(&proposal);
                tokio::spawn(async move { peer.evaluate(&proposal).await })
            })
            .collect();
        let _abort = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        let results = join_all(handles).await;

        let mut set = EndorsementSet::with_capacity(targets.len());
        for (peer, joined) in targets.iter().zip(results) {
            let entry = match joined {
                Ok(Ok(response)) => PeerResponse::answered(peer.name(), response),
                Ok(Err(e)) => PeerResponse::failed(peer.name(), e),
                Err(join_err) => {
                    tracing::error!(peer = %peer.name(), error = %join_err, "Endorsement task failed");
                    PeerResponse::failed(
                        peer.name(),
                        TransportError::Closed {
                            endpoint: peer.name().to_string(),
                            message: format!("endorsement task failed: {}", join_err),
                        },
                    )
                }
            };
            set.insert(entry)?;
        }

        self.metrics.record_fanout(targets.len(), start);
        tracing::debug!(
            targets = targets.len(),
            answered = set.iter().filter(|e| e.response().is_some()).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fan-out complete"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EndorsementFailure;
    use crate::peer::EndorserTransport;
    use crate::protocol::messages::{ProposalResponse, Response};
    use async_trait::async_trait;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behavior {
        Answer,
        Fail,
        Hang,
        Panic,
    }

    struct ScriptedTransport {
        name: String,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EndorserTransport for ScriptedTransport {
        async fn process_proposal(
            &self,
            _proposal: &SignedProposal,
        ) -> std::result::Result<ProposalResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Answer => Ok(ProposalResponse {
                    response: Response { status: 200, ..Default::default() },
                    payload: b"ok".to_vec(),
                    endorsement: None,
                }),
                Behavior::Fail => Err(TransportError::Connect {
                    endpoint: self.name.clone(),
                    message: "refused".into(),
                }),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("transport bug"),
            }
        }
    }

    fn peer(name: &str, behavior: Behavior, calls: &Arc<AtomicUsize>) -> PeerClient {
        PeerClient::with_transport(
            name,
            Arc::new(ScriptedTransport {
                name: name.to_string(),
                behavior,
                calls: Arc::clone(calls),
            }),
            Duration::from_millis(50),
        )
    }

    fn proposal() -> Arc<SignedProposal> {
        Arc::new(SignedProposal { proposal_bytes: b"p".to_vec(), signature: b"s".to_vec() })
    }

    #[tokio::test]
    async fn test_zero_targets_is_validation_error() {
        let err = EndorsementCollector::new().collect(proposal(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_targets_rejected_before_dialing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let targets = vec![peer("peer0", Behavior::Answer, &calls), peer("peer0", Behavior::Answer, &calls)];
        let err = EndorsementCollector::new().collect(proposal(), &targets).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("duplicate")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exactly_n_entries_under_random_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        for round in 0..20 {
            let n = rand::thread_rng().gen_range(1..=8);
            let targets: Vec<_> = (0..n)
                .map(|i| {
                    let behavior = match rand::thread_rng().gen_range(0..4) {
                        0 => Behavior::Answer,
                        1 => Behavior::Fail,
                        2 => Behavior::Hang,
                        _ => Behavior::Panic,
                    };
                    peer(&format!("peer{}-{}", round, i), behavior, &calls)
                })
                .collect();

            let set = EndorsementCollector::new().collect(proposal(), &targets).await.unwrap();
            assert_eq!(set.len(), n);
            let names: Vec<_> = targets.iter().map(|p| p.name()).collect();
            assert_eq!(set.peers(), names);
        }
    }

    #[tokio::test]
    async fn test_panic_and_timeout_become_entries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let targets = vec![
            peer("peerA", Behavior::Answer, &calls),
            peer("peerB", Behavior::Panic, &calls),
            peer("peerC", Behavior::Hang, &calls),
        ];
        let set = EndorsementCollector::new().collect(proposal(), &targets).await.unwrap();

        assert!(set.get("peerA").unwrap().response().is_some());
        assert!(matches!(
            set.get("peerB").unwrap().failure(),
            Some(EndorsementFailure::Transport(TransportError::Closed { .. }))
        ));
        assert!(matches!(
            set.get("peerC").unwrap().failure(),
            Some(EndorsementFailure::Transport(e)) if e.is_timeout()
        ));
    }

    #[tokio::test]
    async fn test_dropping_collector_aborts_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hanging = PeerClient::with_transport(
            "peerH",
            Arc::new(ScriptedTransport {
                name: "peerH".into(),
                behavior: Behavior::Hang,
                calls: Arc::clone(&calls),
            }),
            Duration::from_secs(60),
        );
        let targets = vec![hanging.clone()];

        let collector = EndorsementCollector::new();
        let collect = collector.collect(proposal(), &targets);
        let timed = tokio::time::timeout(Duration::from_millis(50), collect).await;
        assert!(timed.is_err());

        // Aborted task gives back its lease.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(hanging.in_flight(), 0);
    }
}
