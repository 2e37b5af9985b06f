//! Wire messages exchanged with peers, orderers and event sources.
//!
//! # Data Flow
//! ```text
//! ChainCode descriptor
//!     → Proposal (header + invocation)          → SignedProposal → peer
//!     ← ProposalResponse (response + endorsement) ← peer
//!     → Payload (header + TransactionAction)    → Envelope → orderer
//!     ← BroadcastResponse                        ← orderer
//!
//! SeekInfo → Envelope → event source
//!     ← DeliverResponse::{Block, FilteredBlock, Status} ...
//! ```
//!
//! # Design Decisions
//! - Every signed structure travels as opaque bytes plus a signature, so
//!   signatures are always computed over exactly what the remote receives
//! - Encoding is JSON through `codec.rs`; field order is fixed by the struct
//!   definitions, which keeps re-encoding deterministic
//! - Tag dispatch is a closed enum (`DeliverResponse`), matched exhaustively

pub mod codec;
pub mod messages;

pub use messages::{
    Block, BlockHeader, BlockMetadata, BlockchainInfo, BroadcastResponse, ChaincodeInvocation,
    ChaincodeType, DeliverResponse, Endorsement, Envelope, FilteredBlock, FilteredTransaction,
    Header, HeaderType, Payload, ProcessedTransaction, Proposal, ProposalResponse, Response,
    SeekInfo, SeekPosition, SerializedIdentity, SignedProposal, Status, TransactionAction,
    TxValidationCode,
};
