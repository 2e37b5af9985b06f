//! Identity and crypto subsystem.
//!
//! # Data Flow
//! ```text
//! MSP directory (keystore/, signcerts/)
//!     → msp.rs (load newest key + cert, check they match)
//!     → Identity (immutable, shared via Arc)
//!     → crypto.rs (CryptoSuite: hash, sign, verify)
//! ```
//!
//! # Security Constraints
//! - Private keys are never logged or serialized
//! - Identity and key must agree before the client accepts them

pub mod crypto;
pub mod msp;

pub use crypto::{suite_for, CryptoError, CryptoFamily, CryptoSuite, EcdsaSuite, PrivateKey};
pub use msp::Identity;
