//! Leases on in-flight peer calls and open subscriptions.
//!
//! A [`LeaseTracker`] counts what is currently open against one endpoint.
//! Every call or subscription holds a [`Lease`] and gives it back on drop,
//! so callers can wait for an endpoint to return to idle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug)]
struct Shared {
    label: String,
    issued: AtomicU64,
    open: watch::Sender<u64>,
}

/// Counts open leases for one endpoint. Clones share the count.
#[derive(Debug, Clone)]
pub struct LeaseTracker {
    shared: Arc<Shared>,
}

impl LeaseTracker {
    /// `label` names the endpoint and purpose in trace output.
    pub fn new(label: impl Into<String>) -> Self {
        let (open, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                label: label.into(),
                issued: AtomicU64::new(0),
                open,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Take a lease; it is released when the returned value drops.
    pub fn acquire(&self) -> Lease {
        let serial = self.shared.issued.fetch_add(1, Ordering::Relaxed) + 1;
        self.shared.open.send_modify(|open| *open += 1);
        Lease {
            shared: Arc::clone(&self.shared),
            serial,
        }
    }

    /// Leases currently held.
    pub fn open(&self) -> u64 {
        *self.shared.open.borrow()
    }

    /// Leases handed out since creation.
    pub fn issued(&self) -> u64 {
        self.shared.issued.load(Ordering::Relaxed)
    }

    /// Wait for every lease to be released, up to `limit`. False on timeout.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let mut open = self.shared.open.subscribe();
        let idle = tokio::time::timeout(limit, open.wait_for(|n| *n == 0)).await;
        matches!(idle, Ok(Ok(_)))
    }
}

/// One open call or subscription.
pub struct Lease {
    shared: Arc<Shared>,
    serial: u64,
}

impl Lease {
    /// Position of this lease in its tracker's issue order, from 1.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lease({}#{})", self.shared.label, self.serial)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.shared.open.send_modify(|open| *open = open.saturating_sub(1));
        tracing::trace!(tracker = %self.shared.label, lease = self.serial, "Lease released");
    }
}
