//! Endorsing peer connections.
//!
//! # Data Flow
//! ```text
//! SignedProposal
//!     → client.rs (PeerClient: deadline, in-flight tracking, metrics)
//!     → transport.rs (EndorserTransport: HTTP JSON by default)
//!     ← ProposalResponse | TransportError
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests and alternative wire formats
//!   plug in without touching the collector
//! - Each call carries its own deadline; expiry is a `TransportError::Timeout`
//!   naming the peer, never a hang

pub mod client;
pub mod transport;

pub use client::PeerClient;
pub use transport::{EndorserTransport, HttpEndorser, PROPOSALS_PATH};
