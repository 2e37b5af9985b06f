//! Error taxonomy for the transaction lifecycle.
//!
//! Per-peer transport failures are carried inside an
//! [`EndorsementSet`](crate::endorsement::EndorsementSet) and only escalate to
//! an [`Error`] through the assembler's quorum check. Every other stage fails
//! fast with the original cause attached.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::identity::CryptoError;
use crate::protocol::codec::CodecError;
use crate::protocol::messages::Status;

/// I/O failure talking to a single peer, orderer or event source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection to {endpoint} failed: {message}")]
    Connect { endpoint: String, message: String },

    /// The call did not complete before its deadline.
    #[error("request to {endpoint} timed out after {after:?}")]
    Timeout { endpoint: String, after: Duration },

    /// The remote answered with a non-success HTTP status.
    #[error("{endpoint} answered with HTTP status {status}")]
    Http { endpoint: String, status: u16 },

    /// The reply could not be decoded.
    #[error("malformed reply from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },

    /// The connection was closed by the remote side.
    #[error("connection to {endpoint} closed: {message}")]
    Closed { endpoint: String, message: String },
}

impl TransportError {
    /// The endpoint this error refers to.
    pub fn endpoint(&self) -> &str {
        match self {
            TransportError::Connect { endpoint, .. }
            | TransportError::Timeout { endpoint, .. }
            | TransportError::Http { endpoint, .. }
            | TransportError::Malformed { endpoint, .. }
            | TransportError::Closed { endpoint, .. } => endpoint,
        }
    }

    /// True when the error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Why a single peer did not contribute an endorsement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndorsementFailure {
    /// The peer could not be reached or did not answer in time.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer evaluated the proposal and returned an error status.
    #[error("peer rejected proposal with status {status}: {message}")]
    Rejected { status: i32, message: String },

    /// A success status without an endorsement attached.
    #[error("response carries no endorsement")]
    MissingEndorsement,

    /// The endorsement signature does not verify against the endorser.
    #[error("endorsement signature does not verify")]
    BadSignature,
}

/// A failing peer and its cause, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub peer: String,
    pub cause: EndorsementFailure,
}

impl fmt::Display for PeerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.peer, self.cause)
    }
}

fn join_failures(failures: &[PeerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, detected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Orderer or event-source I/O failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Fewer endorsements than the configured minimum succeeded.
    #[error(
        "insufficient endorsements: {received} of {required} required [{}]",
        join_failures(.failures)
    )]
    InsufficientEndorsements {
        required: usize,
        received: usize,
        failures: Vec<PeerFailure>,
    },

    /// Successful endorsements disagree on status or payload.
    #[error(
        "divergent endorsement responses: {} disagree with {}",
        .conflicting.join(", "),
        .agreeing.join(", ")
    )]
    DivergentResponse {
        agreeing: Vec<String>,
        conflicting: Vec<String>,
    },

    /// The event subscription was closed by its source.
    #[error("event stream terminated: {reason}")]
    StreamTerminated {
        reason: String,
        #[source]
        source: Option<TransportError>,
    },

    /// A query against a single peer did not produce a usable response.
    #[error("query on {peer} failed: {cause}")]
    QueryFailed {
        peer: String,
        #[source]
        cause: EndorsementFailure,
    },

    /// The orderer refused the envelope.
    #[error("orderer rejected transaction {tx_id} with status {status:?}: {info}")]
    SubmissionRejected {
        tx_id: String,
        status: Status,
        info: String,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
