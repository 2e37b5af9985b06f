//! Message definitions.

use serde::{Deserialize, Serialize};

/// Status codes used by orderers and event sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    RequestEntityTooLarge,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
    Unknown,
}

impl Status {
    /// Numeric form, matching HTTP semantics.
    pub fn code(self) -> u16 {
        match self {
            Status::Success => 200,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::RequestEntityTooLarge => 413,
            Status::InternalServerError => 500,
            Status::NotImplemented => 501,
            Status::ServiceUnavailable => 503,
            Status::Unknown => 0,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Language runtime of a chaincode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeType {
    #[default]
    Golang,
    Node,
    Java,
    Car,
}

impl std::str::FromStr for ChaincodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "golang" | "go" => Ok(ChaincodeType::Golang),
            "node" => Ok(ChaincodeType::Node),
            "java" => Ok(ChaincodeType::Java),
            "car" => Ok(ChaincodeType::Car),
            other => Err(format!("unknown chaincode type '{}'", other)),
        }
    }
}

/// Kind of payload a header introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeaderType {
    EndorserTransaction,
    DeliverSeekInfo,
}

/// Identity of a creator or endorser as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub msp_id: String,
    /// Certificate bytes; for the ECDSA suite, a SEC1 public key.
    pub id_bytes: Vec<u8>,
}

/// Common header carried by proposals and envelope payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub header_type: HeaderType,
    pub channel_id: String,
    pub tx_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Encoded [`SerializedIdentity`] of the creator.
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// The chaincode call a proposal asks peers to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInvocation {
    pub chaincode_type: ChaincodeType,
    pub name: String,
    pub version: String,
    pub args: Vec<Vec<u8>>,
}

/// Unsigned proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub header: Header,
    pub invocation: ChaincodeInvocation,
}

/// Serialized proposal and the creator's signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Chaincode execution result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    /// Statuses at or above 400 are errors.
    pub const ERROR_THRESHOLD: i32 = 400;

    pub fn is_success(&self) -> bool {
        self.status < Self::ERROR_THRESHOLD
    }
}

/// A peer's signature over a simulation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Encoded [`SerializedIdentity`] of the endorser.
    pub endorser: Vec<u8>,
    /// Signature over `payload ‖ endorser`.
    pub signature: Vec<u8>,
}

/// Reply to a signed proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub response: Response,
    /// Simulation result bytes that endorsers sign.
    pub payload: Vec<u8>,
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    /// Bytes covered by the endorsement signature.
    pub fn signed_bytes(payload: &[u8], endorser: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(payload.len() + endorser.len());
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(endorser);
        bytes
    }
}

/// Endorsed action carried inside an envelope payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    /// Encoded [`ChaincodeInvocation`].
    pub invocation: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

/// Header plus encoded body; the signed part of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub header: Header,
    pub data: Vec<u8>,
}

/// Signed bundle handed to the orderer or event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Orderer reply to a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub status: Status,
    #[serde(default)]
    pub info: String,
}

/// Where a subscription starts or stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekPosition {
    Oldest,
    Newest,
    Specified(u64),
}

/// Body of a deliver request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekInfo {
    pub start: SeekPosition,
    pub stop: SeekPosition,
    pub filtered: bool,
}

/// Per-transaction validation outcome recorded by committing peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxValidationCode {
    Valid,
    NilEnvelope,
    BadPayload,
    BadCommonHeader,
    BadCreatorSignature,
    InvalidEndorserTransaction,
    DuplicateTxid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    UnknownTxType,
    InvalidOtherReason,
}

impl TxValidationCode {
    pub fn is_valid(self) -> bool {
        self == TxValidationCode::Valid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub previous_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// One entry per envelope in `BlockData`, same order.
    pub tx_validation_codes: Vec<TxValidationCode>,
}

/// A full ledger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Encoded [`Envelope`]s.
    pub data: Vec<Vec<u8>>,
    pub metadata: BlockMetadata,
}

impl Block {
    pub fn number(&self) -> u64 {
        self.header.number
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    pub tx_id: String,
    pub validation_code: TxValidationCode,
}

/// A block reduced to transaction ids and validation codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredBlock {
    pub channel_id: String,
    pub number: u64,
    pub transactions: Vec<FilteredTransaction>,
}

/// One frame from an event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverResponse {
    Block(Block),
    FilteredBlock(FilteredBlock),
    /// Terminal frame; `Success` once the stop position has been reached.
    Status(Status),
}

/// Result of the chain-info system query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub height: u64,
    pub current_block_hash: Vec<u8>,
    pub previous_block_hash: Vec<u8>,
}

/// Result of the transaction-by-id system query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub envelope: Envelope,
    pub validation_code: TxValidationCode,
}
