//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → injected into LedgerClient, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a new client is built for new config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ClientConfig;
pub use validation::{validate_config, ValidationError};
pub use schema::{
    ChannelConfig, CryptoConfig, EndorsementConfig, EventsConfig, IdentityConfig,
    ObservabilityConfig, OrdererConfig, PeerConfig, TimeoutConfig,
};
