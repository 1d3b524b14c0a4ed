//! Node Monitors
//!
//! Capability trait over concrete monitor variants. A monitor observes
//! node-level activity and emits scored observations into a sink until
//! its shutdown token fires. It owns no policy logic.
//!
//! ## Structure
//! - `config`: Recognized monitor options + fail-fast validation
//! - `metrics`: Consistent counter snapshots for a run
//! - `demo`: Stand-in variant sampling the local process table
//!
//! Variants are chosen explicitly at construction via [`new_monitor`];
//! kernel-level tracing backends plug in as further implementations of
//! [`Monitor`].

pub mod config;
pub mod demo;
pub mod metrics;

use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observation::Observation;
use crate::shutdown::Shutdown;

pub use config::{default_node_name, MonitorConfig};
pub use demo::DemoMonitor;
pub use metrics::{MetricsSnapshot, MonitorMetrics};

/// Destination for emitted observations
pub type ObservationSink = Sender<Observation>;

// ============================================================================
// MONITOR CAPABILITY
// ============================================================================

/// A node activity monitor
pub trait Monitor: Send + Sync {
    /// Begin emitting observations into `sink` until `shutdown` fires.
    ///
    /// Runs as a long-lived background activity; fails fast when the
    /// monitor is already running or its tracing source is unavailable.
    fn start(&self, sink: ObservationSink, shutdown: Shutdown) -> Result<(), MonitorError>;

    /// Graceful shutdown; blocks until the emitter has quiesced.
    ///
    /// Idempotent: stopping an already-stopped monitor is a no-op.
    fn stop(&self) -> Result<(), MonitorError>;

    /// Shared handle to this monitor's counters
    fn metrics_handle(&self) -> Arc<MonitorMetrics>;

    /// Consistent snapshot of the current counters
    fn metrics(&self) -> MetricsSnapshot {
        self.metrics_handle().snapshot()
    }
}

// ============================================================================
// FACTORY
// ============================================================================

/// Which concrete monitor variant to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorKind {
    /// Synthetic observations from local process samples
    Demo,
}

/// Build a monitor variant for the given config.
///
/// Fails fast with a configuration error; never retried internally.
pub fn new_monitor(
    kind: MonitorKind,
    config: MonitorConfig,
) -> Result<Arc<dyn Monitor>, MonitorError> {
    match kind {
        MonitorKind::Demo => Ok(Arc::new(DemoMonitor::new(config)?)),
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Fatal startup problem; surfaced to the caller, no internal retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingNodeName,
    NoTraceSources,
    TracingUnavailable(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingNodeName => write!(f, "node name is required"),
            ConfigError::NoTraceSources => {
                write!(f, "at least one of syscall or network tracing must be enabled")
            }
            ConfigError::TracingUnavailable(msg) => {
                write!(f, "tracing capability unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    Config(ConfigError),
    AlreadyRunning,
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::Config(err) => write!(f, "configuration error: {}", err),
            MonitorError::AlreadyRunning => write!(f, "monitor is already running"),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<ConfigError> for MonitorError {
    fn from(err: ConfigError) -> Self {
        MonitorError::Config(err)
    }
}
