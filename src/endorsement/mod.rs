//! Endorsement fan-out and transaction assembly.
//!
//! # Data Flow
//! ```text
//! Arc<SignedProposal> + [PeerClient; N]
//!     → collector.rs (one task per peer, join on exactly N)
//!     → EndorsementSet (one PeerResponse per dialed peer, dial order)
//!     → assembler.rs (classify → agreement → quorum → signed Envelope)
//!     → AssembledTransaction { tx_id, envelope, endorsed_by, failures }
//! ```
//!
//! # Design Decisions
//! - A peer failure is data inside the set; only the quorum check turns it
//!   into an error for the caller
//! - Disagreeing endorsements are reported, never resolved by picking one
//! - Envelope bytes depend only on the set's order, which is dial order

pub mod assembler;
pub mod collector;
pub mod set;

pub use assembler::{AssembledTransaction, TransactionAssembler};
pub use collector::EndorsementCollector;
pub use set::{EndorsementSet, PeerResponse};
