//! Demo Monitor
//!
//! Stand-in for kernel-level tracing: samples the local process table and
//! synthesizes scored observations from it. Production tracing backends
//! implement [`Monitor`](super::Monitor) against real syscall and network
//! sources instead.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use sysinfo::System;

use crate::constants;
use crate::observation::{Observation, Subject};
use crate::shutdown::Shutdown;

use super::metrics::MonitorMetrics;
use super::{Monitor, MonitorConfig, MonitorError, ObservationSink};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Processes sampled per tick
const MAX_SAMPLED_PROCESSES: usize = 4;

/// Synthetic syscall activity: action and the resource it touches
const SYSCALL_ACTIONS: &[(&str, &str)] = &[
    ("open", "/etc/hosts"),
    ("read", "/var/lib/nodeguard/state"),
    ("write", "/tmp/scratch"),
    ("exec", "/usr/bin/env"),
];

/// Synthetic connect targets
const NETWORK_RESOURCES: &[&str] = &["10.0.0.12:443", "10.0.0.40:5432", "172.16.4.2:53"];

// ============================================================================
// DEMO MONITOR
// ============================================================================

/// Emits synthetic observations derived from live process samples
pub struct DemoMonitor {
    config: MonitorConfig,
    interval: Duration,
    metrics: Arc<MonitorMetrics>,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl DemoMonitor {
    /// Fails fast on invalid configuration; nothing starts here
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            config,
            interval: Duration::from_millis(constants::get_demo_interval_ms()),
            metrics: Arc::new(MonitorMetrics::new()),
            worker: Mutex::new(None),
        })
    }

    /// Override the emit interval (tests and fast-feedback hosts)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Monitor for DemoMonitor {
    fn start(&self, sink: ObservationSink, shutdown: Shutdown) -> Result<(), MonitorError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        // Counters reset only on restart
        self.metrics.reset();

        let config = self.config.clone();
        let interval = self.interval;
        let metrics = self.metrics.clone();
        let token = shutdown.clone();
        let handle = thread::spawn(move || emit_loop(config, interval, metrics, sink, token));

        *worker = Some(Worker { shutdown, handle });
        log::info!("Demo monitor started (node: {})", self.config.node_name);
        Ok(())
    }

    fn stop(&self) -> Result<(), MonitorError> {
        let mut worker = self.worker.lock();
        match worker.take() {
            Some(w) => {
                w.shutdown.request();
                let _ = w.handle.join();
                log::info!("Demo monitor stopped (node: {})", self.config.node_name);
                Ok(())
            }
            // Already stopped: no-op
            None => Ok(()),
        }
    }

    fn metrics_handle(&self) -> Arc<MonitorMetrics> {
        self.metrics.clone()
    }
}

// ============================================================================
// EMITTER LOOP
// ============================================================================

fn emit_loop(
    config: MonitorConfig,
    interval: Duration,
    metrics: Arc<MonitorMetrics>,
    sink: ObservationSink,
    shutdown: Shutdown,
) {
    let mut system = System::new_all();
    let mut rng = rand::thread_rng();
    log::info!(
        "Demo emitter loop started (interval: {}ms)",
        interval.as_millis()
    );

    while !shutdown.is_requested() {
        system.refresh_all();

        for observation in sample_observations(&config, &system, &mut rng) {
            metrics.record_event(observation.is_anomalous());
            if sink.send(observation).is_err() {
                log::warn!("Observation sink closed - demo emitter exiting");
                return;
            }
        }

        if wait_cancelled(&shutdown, interval) {
            break;
        }
    }

    log::info!("Demo emitter loop stopped");
}

fn sample_observations(
    config: &MonitorConfig,
    system: &System,
    rng: &mut ThreadRng,
) -> Vec<Observation> {
    let mut observations = Vec::new();

    for (_pid, process) in system.processes().iter().take(MAX_SAMPLED_PROCESSES) {
        let subject = Subject::new(process.name(), "host");

        let trace_network =
            config.enable_network_trace && (!config.enable_syscall_trace || rng.gen_bool(0.3));
        let (action, resource) = if trace_network {
            ("connect", *NETWORK_RESOURCES.choose(rng).unwrap_or(&"10.0.0.1:443"))
        } else {
            *SYSCALL_ACTIONS.choose(rng).unwrap_or(&("read", "/proc/self/stat"))
        };

        // Cubing skews scores low so anomalies stay rare
        let score = rng.gen::<f64>().powi(3);

        observations.push(
            Observation::new(subject, action, resource, score)
                .with_attribute("node", &config.node_name),
        );
    }

    observations
}

/// Sleep in short steps so cancellation stays responsive; true if cancelled
fn wait_cancelled(shutdown: &Shutdown, total: Duration) -> bool {
    let step = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while waited < total {
        if shutdown.is_requested() {
            return true;
        }
        thread::sleep(step.min(total - waited));
        waited += step;
    }
    shutdown.is_requested()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, TryRecvError};

    fn fast_monitor() -> DemoMonitor {
        DemoMonitor::new(MonitorConfig::for_node("test-node"))
            .expect("valid config")
            .with_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = DemoMonitor::new(MonitorConfig::for_node(""));
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_start_twice_is_an_error() {
        let monitor = fast_monitor();
        let (tx, _rx) = mpsc::channel();
        monitor.start(tx.clone(), Shutdown::new()).expect("first start");

        assert_eq!(
            monitor.start(tx, Shutdown::new()),
            Err(MonitorError::AlreadyRunning)
        );
        monitor.stop().expect("stop");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let monitor = fast_monitor();

        // Never started: no-op
        assert_eq!(monitor.stop(), Ok(()));

        let (tx, _rx) = mpsc::channel();
        monitor.start(tx, Shutdown::new()).expect("start");
        assert_eq!(monitor.stop(), Ok(()));
        assert_eq!(monitor.stop(), Ok(()));
    }

    #[test]
    fn test_emits_then_quiesces_after_stop() {
        let monitor = fast_monitor();
        let (tx, rx) = mpsc::channel();
        monitor.start(tx, Shutdown::new()).expect("start");

        let first = rx.recv_timeout(Duration::from_secs(5)).expect("an observation");
        assert!(!first.subject.pod.is_empty());
        assert_eq!(first.attributes.get("node").map(String::as_str), Some("test-node"));

        monitor.stop().expect("stop");
        assert!(monitor.metrics().events_observed >= 1);

        // The emitter has joined: once the buffer drains, the channel is dead
        loop {
            match rx.try_recv() {
                Ok(_) => continue,
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => panic!("sender still alive after stop returned"),
            }
        }
    }

    #[test]
    fn test_external_cancellation_stops_emission() {
        let monitor = fast_monitor();
        let (tx, rx) = mpsc::channel();
        let shutdown = Shutdown::new();
        monitor.start(tx, shutdown.clone()).expect("start");

        rx.recv_timeout(Duration::from_secs(5)).expect("an observation");
        shutdown.request();

        // stop() joins the already-cancelled emitter without error
        monitor.stop().expect("stop");
    }
}
