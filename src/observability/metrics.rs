//! Metrics collection.
//!
//! # Metrics
//! - `ledger_endorsements_total` (counter): per-peer outcomes by `peer`, `outcome`
//! - `ledger_peer_call_duration_seconds` (histogram): per-peer call latency
//! - `ledger_fanout_duration_seconds` (histogram): time to join all targets
//! - `ledger_submissions_total` (counter): broadcasts by `orderer`, `outcome`
//! - `ledger_blocks_delivered_total` (counter): blocks by `source`, subscription `mode`
//! - `ledger_active_subscriptions` (gauge): open event subscriptions per `source`
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without a recorder every call is a no-op
//! - Each client carries its own [`Metrics`] handle, so turning metrics off
//!   for one client leaves the others recording

use std::time::Instant;

use crate::config::ObservabilityConfig;

/// Per-client switch in front of the `metrics` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    enabled: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Metrics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn from_config(config: &ObservabilityConfig) -> Self {
        Self::new(config.metrics_enabled)
    }

    pub fn is_enabled(self) -> bool {
        self.enabled
    }

    /// One endorsement call finished.
    pub fn record_peer_call(self, peer: &str, ok: bool, start: Instant) {
        if !self.enabled {
            return;
        }
        ::metrics::histogram!("ledger_peer_call_duration_seconds", "peer" => peer.to_owned())
            .record(start.elapsed().as_secs_f64());
        ::metrics::counter!(
            "ledger_endorsements_total",
            "peer" => peer.to_owned(),
            "outcome" => if ok { "answered" } else { "transport_error" }
        )
        .increment(1);
    }

    /// The collector joined all targets.
    pub fn record_fanout(self, targets: usize, start: Instant) {
        if !self.enabled {
            return;
        }
        ::metrics::histogram!("ledger_fanout_duration_seconds").record(start.elapsed().as_secs_f64());
        ::metrics::counter!("ledger_fanout_targets_total").increment(targets as u64);
    }

    /// The assembler classified one peer's endorsement.
    pub fn record_endorsement(self, peer: &str, outcome: &'static str) {
        if !self.enabled {
            return;
        }
        ::metrics::counter!(
            "ledger_endorsements_classified_total",
            "peer" => peer.to_owned(),
            "outcome" => outcome
        )
        .increment(1);
    }

    /// A broadcast finished with `outcome` ("accepted", "rejected", "error").
    pub fn record_submission(self, orderer: &str, outcome: &'static str) {
        if !self.enabled {
            return;
        }
        ::metrics::counter!(
            "ledger_submissions_total",
            "orderer" => orderer.to_owned(),
            "outcome" => outcome
        )
        .increment(1);
    }

    /// A block was handed to a subscriber.
    pub fn record_block_delivered(self, source: &str, mode: &'static str) {
        if !self.enabled {
            return;
        }
        ::metrics::counter!(
            "ledger_blocks_delivered_total",
            "source" => source.to_owned(),
            "mode" => mode
        )
        .increment(1);
    }

    /// Current number of open subscriptions on `source`.
    pub fn record_active_subscriptions(self, source: &str, count: u64) {
        if !self.enabled {
            return;
        }
        ::metrics::gauge!("ledger_active_subscriptions", "source" => source.to_owned())
            .set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_independent() {
        let mut quiet = ObservabilityConfig::default();
        quiet.metrics_enabled = false;

        let off = Metrics::from_config(&quiet);
        let on = Metrics::from_config(&ObservabilityConfig::default());
        assert!(!off.is_enabled());
        assert!(on.is_enabled());
        assert_eq!(Metrics::default(), on);
        assert_eq!(Metrics::disabled(), off);
    }
}
