//! NodeGuard Demo - wires the demo monitor into the policy engine.
//!
//! Runs the demo monitor for a few seconds against a small policy set,
//! then prints the violations and engine stats it produced.

use std::sync::Arc;
use std::time::Duration;

use nodeguard_core::constants;
use nodeguard_core::monitor::{self, Monitor, MonitorConfig, MonitorKind};
use nodeguard_core::pipeline::Pipeline;
use nodeguard_core::policy::{
    Condition, Operator, Policy, PolicyAction, PolicyEngine, Retention,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} demo v{}", constants::APP_NAME, constants::APP_VERSION);

    let engine = Arc::new(PolicyEngine::with_retention(Retention {
        max_entries: constants::get_violation_retention(),
        max_age_secs: None,
    }));

    let policies = vec![
        Policy::new("flag-anomalous", PolicyAction::Alert)
            .with_description("Alert on high anomaly scores")
            .with_condition(Condition::new("anomaly_score", Operator::GreaterThan, 0.7)),
        Policy::new("audit-writes", PolicyAction::Audit)
            .with_description("Audit every write")
            .with_condition(Condition::new("action", Operator::Equals, "write")),
        Policy::new("block-db-connects", PolicyAction::Block)
            .with_description("No direct database connections from this node")
            .with_condition(Condition::new("action", Operator::Equals, "connect"))
            .with_condition(Condition::new("resource", Operator::Contains, ":5432")),
    ];

    match engine.load_policies(policies) {
        Ok(count) => log::info!("Loaded {} policies", count),
        Err(e) => {
            log::error!("Policy load failed: {}", e);
            return;
        }
    }

    let monitor = match monitor::new_monitor(MonitorKind::Demo, MonitorConfig::default()) {
        Ok(monitor) => monitor,
        Err(e) => {
            log::error!("Monitor setup failed: {}", e);
            return;
        }
    };

    let pipeline = Pipeline::new(monitor, engine.clone());
    if let Err(e) = pipeline.start() {
        log::error!("Pipeline start failed: {}", e);
        return;
    }

    std::thread::sleep(Duration::from_secs(10));

    if let Err(e) = pipeline.stop() {
        log::error!("Pipeline stop failed: {}", e);
    }

    for violation in engine.violations() {
        log::info!(
            "violation [{}] {}/{} policy '{}': {}",
            violation.severity,
            violation.namespace,
            violation.pod,
            violation.policy_name,
            violation.description
        );
    }

    let metrics = pipeline.monitor().metrics();
    log::info!(
        "Monitor metrics: observed={} anomalies={} enforced={}",
        metrics.events_observed,
        metrics.anomalies_flagged,
        metrics.policies_enforced
    );

    match serde_json::to_string_pretty(&engine.stats()) {
        Ok(stats) => log::info!("Engine stats: {}", stats),
        Err(e) => log::warn!("Stats serialization failed: {}", e),
    }
}
