//! Evaluation Pipeline
//!
//! Background worker wiring a monitor's observation stream into the
//! policy engine. Enforced decisions are counted back into the monitor's
//! metrics; stopping drains whatever the monitor emitted before it
//! quiesced.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::monitor::{Monitor, MonitorError, MonitorMetrics};
use crate::observation::Observation;
use crate::policy::PolicyEngine;
use crate::shutdown::Shutdown;

// ============================================================================
// PIPELINE
// ============================================================================

/// Monitor-to-engine wiring with its own evaluation worker
pub struct Pipeline {
    monitor: Arc<dyn Monitor>,
    engine: Arc<PolicyEngine>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(monitor: Arc<dyn Monitor>, engine: Arc<PolicyEngine>) -> Self {
        Self {
            monitor,
            engine,
            worker: Mutex::new(None),
        }
    }

    /// Start the monitor and the evaluation worker behind it
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let (tx, rx) = mpsc::channel();
        self.monitor.start(tx, Shutdown::new())?;

        let engine = self.engine.clone();
        let metrics = self.monitor.metrics_handle();
        *worker = Some(thread::spawn(move || evaluate_loop(rx, engine, metrics)));

        log::info!("Evaluation pipeline started");
        Ok(())
    }

    /// Stop the monitor, then drain everything it emitted.
    ///
    /// Idempotent; returns once every in-flight observation has been
    /// evaluated.
    pub fn stop(&self) -> Result<(), MonitorError> {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return Ok(());
        };

        // Joining the monitor drops the sink; the worker then drains the
        // channel to disconnect and exits.
        self.monitor.stop()?;
        let _ = handle.join();

        log::info!("Evaluation pipeline stopped");
        Ok(())
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    pub fn monitor(&self) -> &Arc<dyn Monitor> {
        &self.monitor
    }
}

// ============================================================================
// EVALUATION WORKER
// ============================================================================

fn evaluate_loop(rx: Receiver<Observation>, engine: Arc<PolicyEngine>, metrics: Arc<MonitorMetrics>) {
    log::info!("Evaluation worker started");

    for observation in rx {
        let decision = engine.evaluate(&observation);
        if !decision.is_pass_through() {
            metrics.record_enforcement();
            log::info!(
                "enforced [{}] {} {} on {}: {}",
                decision
                    .actions
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                observation.subject,
                observation.action,
                observation.resource,
                decision.reason
            );
        }
    }

    log::info!("Evaluation worker drained");
}

// ============================================================================
// TESTS
// ============================================================================
