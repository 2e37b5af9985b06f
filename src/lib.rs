//! Transaction lifecycle client for a permissioned ledger.
//!
//! # Architecture Overview
//!
//! ```text
//!   ChainCode ──▶ proposal ──▶ endorsement::collector ──▶ endorsement::assembler ──▶ orderer
//!   (args)        (sign)        (fan-out to N peers,       (agreement, quorum,        (submit
//!                                join on N)                 signed envelope)            once)
//!
//!   events::listener ◀── peer event source (ordered, filtered or full, cancellable)
//!
//!   Cross-cutting: config · identity (CryptoSuite) · net · observability · error
//! ```
//!
//! [`LedgerClient`] ties the pieces together from a [`ClientConfig`]. Each
//! stage is also usable on its own.

pub mod client;
pub mod config;
pub mod discovery;
pub mod endorsement;
pub mod error;
pub mod events;
pub mod identity;
pub mod net;
pub mod observability;
pub mod orderer;
pub mod peer;
pub mod proposal;
pub mod protocol;

pub use client::{InvokeResponse, LedgerClient, QueryResponse, SystemQuery, SystemQueryResult};
pub use config::ClientConfig;
pub use error::{EndorsementFailure, Error, PeerFailure, Result, TransportError};
pub use events::{BlockEvent, CancelToken, EventMode, EventStream, ListenerState, SubscribeRequest};
pub use identity::{CryptoSuite, EcdsaSuite, Identity, PrivateKey};
pub use proposal::ChainCode;
