//! Monitor Metrics
//!
//! Counters for a monitor run. Snapshots are internally consistent; values
//! only grow while the monitor runs and reset on restart.

use parking_lot::RwLock;
use serde::Serialize;

/// Point-in-time snapshot of monitor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Observations emitted since the last (re)start
    pub events_observed: u64,
    /// Observations at or above the anomaly threshold
    pub anomalies_flagged: u64,
    /// Non-pass-through decisions enforced downstream
    pub policies_enforced: u64,
}

/// Shared counter set for one monitor
///
/// A single lock keeps snapshots consistent: a reader never sees an event
/// counted without its anomaly flag.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    inner: RwLock<MetricsSnapshot>,
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, anomalous: bool) {
        let mut metrics = self.inner.write();
        metrics.events_observed += 1;
        if anomalous {
            metrics.anomalies_flagged += 1;
        }
    }

    pub fn record_enforcement(&self) {
        self.inner.write().policies_enforced += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.read()
    }

    /// Counters reset only when a monitor restarts
    pub fn reset(&self) {
        *self.inner.write() = MetricsSnapshot::default();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = MonitorMetrics::new();
        metrics.record_event(false);
        metrics.record_event(true);
        metrics.record_enforcement();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_observed, 2);
        assert_eq!(snapshot.anomalies_flagged, 1);
        assert_eq!(snapshot.policies_enforced, 1);
    }

    #[test]
    fn test_reset_clears_all_counters() {
        let metrics = MonitorMetrics::new();
        metrics.record_event(true);
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
