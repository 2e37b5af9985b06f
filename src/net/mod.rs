//! Network layer shared by the peer, orderer and event clients.
//!
//! # Data Flow
//! ```text
//! PeerClient / OrdererClient
//!     → http.rs (JSON POST over a pooled reqwest::Client)
//!     → tls.rs (optional CA certificate per endpoint)
//!
//! PeerClient calls and event subscriptions
//!     → lease.rs (lease per call/subscription, open count)
//! ```
//!
//! # Design Decisions
//! - One `reqwest::Client` per endpoint, built once and reused across calls
//! - Per-call deadlines are applied by the callers, not by the HTTP client
//! - Every failure maps into `TransportError` carrying the endpoint name

pub mod http;
pub mod lease;
pub mod tls;

pub use http::JsonHttpClient;
pub use lease::{Lease, LeaseTracker};
