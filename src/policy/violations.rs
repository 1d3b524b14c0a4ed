//! Violation Log
//!
//! Append-only, bounded rolling window of policy violations.
//! Oldest entries are evicted first; snapshots are detached copies.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants;

use super::types::Severity;

// ============================================================================
// VIOLATION RECORD
// ============================================================================

/// Audit record created when a decision is not a plain allow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// When the violation was recorded (evaluation time, UTC)
    pub timestamp: DateTime<Utc>,
    pub pod: String,
    pub namespace: String,
    /// Name of the matched policy
    pub policy_name: String,
    /// Human-readable description of what happened
    pub description: String,
    pub severity: Severity,
}

// ============================================================================
// RETENTION
// ============================================================================

/// Bounds for the rolling window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retention {
    /// Maximum number of entries kept
    pub max_entries: usize,
    /// Entries older than this are pruned (seconds); `None` keeps by count only
    pub max_age_secs: Option<u64>,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            max_entries: constants::DEFAULT_VIOLATION_RETENTION,
            max_age_secs: None,
        }
    }
}

impl Retention {
    pub fn by_count(max_entries: usize) -> Self {
        Self {
            max_entries,
            max_age_secs: None,
        }
    }
}

// ============================================================================
// VIOLATION LOG
// ============================================================================

/// Mutation-guarded rolling window of violations
pub struct ViolationLog {
    entries: Mutex<VecDeque<Violation>>,
    retention: Retention,
}

impl ViolationLog {
    pub fn new(retention: Retention) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            retention,
        }
    }

    /// Append one violation, evicting the oldest entries past the bounds
    pub fn append(&self, violation: Violation) {
        let mut entries = self.entries.lock();
        entries.push_back(violation);

        while entries.len() > self.retention.max_entries {
            entries.pop_front();
        }
        Self::prune_aged(&mut entries, self.retention.max_age_secs);
    }

    /// Detached snapshot of the retained window, oldest-first
    pub fn snapshot(&self) -> Vec<Violation> {
        let mut entries = self.entries.lock();
        Self::prune_aged(&mut entries, self.retention.max_age_secs);
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn prune_aged(entries: &mut VecDeque<Violation>, max_age_secs: Option<u64>) {
        let Some(max_age) = max_age_secs else {
            return;
        };
        let cutoff = Utc::now() - Duration::seconds(max_age as i64);
        while entries.front().is_some_and(|v| v.timestamp < cutoff) {
            entries.pop_front();
        }
    }
}

impl Default for ViolationLog {
    fn default() -> Self {
        Self::new(Retention::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
