//! Proposal building.
//!
//! # Data Flow
//! ```text
//! (Identity, ChainCode)
//!     → builder.rs: validate, nonce, tx id = SHA-256(nonce ‖ creator)
//!     → UnsignedProposal { proposal, tx_id }
//!     → sign_proposal → SignedProposal (transient, one send)
//! ```

pub mod builder;
pub mod chaincode;

pub use builder::{build_proposal, generate_nonce, sign_proposal, TransactionId, UnsignedProposal};
pub use chaincode::{ChainCode, QSCC};
