//! Central Configuration Constants
//!
//! Single source of truth for engine and monitor defaults.
//! To change a default retention or interval, only edit this file.

/// App name
pub const APP_NAME: &str = "NodeGuard";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of violations retained in the rolling window
pub const DEFAULT_VIOLATION_RETENTION: usize = 1000;

/// Observations at or above this anomaly score are flagged in metrics
pub const ANOMALY_FLAG_THRESHOLD: f64 = 0.8;

/// Default emit interval for the demo monitor (milliseconds)
pub const DEFAULT_DEMO_INTERVAL_MS: u64 = 1000;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get violation retention from environment or use default
pub fn get_violation_retention() -> usize {
    std::env::var("NODEGUARD_VIOLATION_RETENTION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_VIOLATION_RETENTION)
}

/// Get demo monitor emit interval from environment or use default
pub fn get_demo_interval_ms() -> u64 {
    std::env::var("NODEGUARD_DEMO_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DEMO_INTERVAL_MS)
}
