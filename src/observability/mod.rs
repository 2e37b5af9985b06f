//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (peer, tx_id, block, subscription)
//!     → metrics.rs (counters, gauges, histograms through the `metrics` facade)
//!
//! The embedding application:
//!     → logging.rs::init_logging (optional, installs a fmt subscriber)
//!     → installs its own `metrics` recorder/exporter if it wants numbers
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter
//! - `RUST_LOG` overrides the configured filter

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
