//! Ordering service connection.
//!
//! # Data Flow
//! ```text
//! Envelope (by value, consumed)
//!     → client.rs (OrdererClient: deadline, metrics, no retry)
//!     → transport.rs (BroadcastTransport: HTTP JSON by default)
//!     ← SubmitStatus::{Accepted, Rejected} | TransportError
//! ```
//!
//! # Design Decisions
//! - Submission is a one-shot hand-off; finality is observed only through
//!   the event listener
//! - Rejection by the orderer is a value, not a transport error

pub mod client;
pub mod transport;

pub use client::{OrdererClient, SubmitStatus};
pub use transport::{BroadcastTransport, HttpBroadcaster, BROADCAST_PATH};
