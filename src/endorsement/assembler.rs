//! Agreement check, quorum and envelope assembly.
//!
//! # Responsibilities
//! - Classify each peer entry as a usable endorsement or a failure
//! - Require every usable endorsement to agree on status, chaincode result
//!   and signed simulation payload
//! - Enforce the minimum endorsement count
//! - Build and sign the envelope in dial order

use std::sync::Arc;

use crate::endorsement::set::EndorsementSet;
use crate::error::{EndorsementFailure, Error, PeerFailure, Result};
use crate::identity::{CryptoSuite, Identity};
use crate::observability::metrics::Metrics;
use crate::protocol::codec;
use crate::protocol::messages::{
    Endorsement, Envelope, Payload, Proposal, ProposalResponse, SerializedIdentity,
    TransactionAction,
};

/// A signed envelope ready for the orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledTransaction {
    pub tx_id: String,
    pub envelope: Envelope,
    /// Peers whose endorsements are in the envelope, dial order.
    pub endorsed_by: Vec<String>,
    /// Peers that did not contribute, with causes.
    pub failures: Vec<PeerFailure>,
}

/// Turns an endorsement set into a signed envelope.
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    min_endorsements: usize,
    verify_signatures: bool,
    crypto: Arc<dyn CryptoSuite>,
    metrics: Metrics,
}

struct Accepted {
    peer: String,
    response: ProposalResponse,
    endorsement: Endorsement,
}

impl TransactionAssembler {
    /// `min_endorsements` is raised to 1 if given as 0.
    pub fn new(min_endorsements: usize, verify_signatures: bool, crypto: Arc<dyn CryptoSuite>) -> Self {
        Self {
            min_endorsements: min_endorsements.max(1),
            verify_signatures,
            crypto,
            metrics: Metrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn min_endorsements(&self) -> usize {
        self.min_endorsements
    }

    pub fn assemble(
        &self,
        set: EndorsementSet,
        proposal: &Proposal,
        submitter: &Identity,
    ) -> Result<AssembledTransaction> {
        if submitter.creator_bytes()? != proposal.header.creator {
            return Err(Error::validation(
                "submitter identity does not match the proposal creator",
            ));
        }

        let mut accepted: Vec<Accepted> = Vec::new();
        let mut failures: Vec<PeerFailure> = Vec::new();

        for entry in set {
            match self.classify(entry.outcome) {
                Ok((response, endorsement)) => {
                    self.metrics.record_endorsement(&entry.peer, "accepted");
                    accepted.push(Accepted {
                        peer: entry.peer,
                        response,
                        endorsement,
                    });
                }
                Err(cause) => {
                    self.metrics.record_endorsement(&entry.peer, failure_label(&cause));
                    tracing::debug!(peer = %entry.peer, cause = %cause, "Endorsement not usable");
                    failures.push(PeerFailure {
                        peer: entry.peer,
                        cause,
                    });
                }
            }
        }

        if let Some(reference) = accepted.first() {
            let key = agreement_key(&reference.response);
            let (agreeing, conflicting): (Vec<_>, Vec<_>) = accepted
                .iter()
                .partition(|a| agreement_key(&a.response) == key);
            if !conflicting.is_empty() {
                let agreeing: Vec<String> = agreeing.iter().map(|a| a.peer.clone()).collect();
                let conflicting: Vec<String> = conflicting.iter().map(|a| a.peer.clone()).collect();
                tracing::warn!(
                    tx_id = %proposal.header.tx_id,
                    agreeing = ?agreeing,
                    conflicting = ?conflicting,
                    "Divergent endorsement responses"
                );
                return Err(Error::DivergentResponse {
                    agreeing,
                    conflicting,
                });
            }
        }

        if accepted.len() < self.min_endorsements {
            tracing::warn!(
                tx_id = %proposal.header.tx_id,
                required = self.min_endorsements,
                received = accepted.len(),
                "Insufficient endorsements"
            );
            return Err(Error::InsufficientEndorsements {
                required: self.min_endorsements,
                received: accepted.len(),
                failures,
            });
        }

        let response_payload = accepted[0].response.payload.clone();
        let endorsed_by: Vec<String> = accepted.iter().map(|a| a.peer.clone()).collect();
        let action = TransactionAction {
            invocation: codec::encode("chaincode invocation", &proposal.invocation)?,
            response_payload,
            endorsements: accepted.into_iter().map(|a| a.endorsement).collect(),
        };
        let payload = Payload {
            header: proposal.header.clone(),
            data: codec::encode("transaction action", &action)?,
        };
        let payload_bytes = codec::encode("payload", &payload)?;
        let signature = submitter.sign(self.crypto.as_ref(), &payload_bytes)?;

        tracing::info!(
            tx_id = %proposal.header.tx_id,
            endorsed_by = ?endorsed_by,
            failed = failures.len(),
            "Transaction assembled"
        );

        Ok(AssembledTransaction {
            tx_id: proposal.header.tx_id.clone(),
            envelope: Envelope {
                payload: payload_bytes,
                signature,
            },
            endorsed_by,
            failures,
        })
    }

    fn classify(
        &self,
        outcome: std::result::Result<ProposalResponse, EndorsementFailure>,
    ) -> std::result::Result<(ProposalResponse, Endorsement), EndorsementFailure> {
        let response = outcome?;
        if !response.response.is_success() {
            return Err(EndorsementFailure::Rejected {
                status: response.response.status,
                message: response.response.message.clone(),
            });
        }
        let endorsement = response
            .endorsement
            .clone()
            .ok_or(EndorsementFailure::MissingEndorsement)?;

        if self.verify_signatures && !self.verify(&response.payload, &endorsement) {
            return Err(EndorsementFailure::BadSignature);
        }
        Ok((response, endorsement))
    }

    fn verify(&self, payload: &[u8], endorsement: &Endorsement) -> bool {
        let Ok(endorser) =
            codec::decode::<SerializedIdentity>("endorser identity", &endorsement.endorser)
        else {
            return false;
        };
        let signed = ProposalResponse::signed_bytes(payload, &endorsement.endorser);
        self.crypto
            .verify_message(&endorser.id_bytes, &endorsement.signature, &signed)
    }
}

/// What endorsers must agree on: status, chaincode result and the signed
/// simulation payload.
fn agreement_key(response: &ProposalResponse) -> (i32, &[u8], &[u8]) {
    (
        response.response.status,
        response.response.payload.as_slice(),
        response.payload.as_slice(),
    )
}

fn failure_label(cause: &EndorsementFailure) -> &'static str {
    match cause {
        EndorsementFailure::Transport(e) if e.is_timeout() => "timeout",
        EndorsementFailure::Transport(_) => "transport_error",
        EndorsementFailure::Rejected { .. } => "rejected",
        EndorsementFailure::MissingEndorsement => "missing_endorsement",
        EndorsementFailure::BadSignature => "bad_signature",
    }
}
