//! Policy Evaluation Engine
//!
//! Holds the versioned active policy set behind a snapshot pointer and
//! evaluates observations against it, first match wins. Loads swap the
//! whole set atomically; an evaluation in flight always sees one
//! consistent snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::observation::Observation;

use super::types::{Condition, Decision, FieldValue, Operator, Policy, Severity};
use super::validate::{self, ValidationError};
use super::violations::{Retention, Violation, ViolationLog};

// ============================================================================
// ACTIVE SET
// ============================================================================

/// One consistent, immutable snapshot of the active policies
#[derive(Debug, Clone, Serialize)]
pub struct PolicySet {
    /// Bumped on every successful load
    pub version: u64,
    pub policies: Vec<Policy>,
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// No set loaded yet; every evaluation is the default allow
    Unloaded,
    /// A set is active
    Loaded,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Evaluates observations against the active policy set
///
/// `evaluate` is safe from many threads without external locking: readers
/// clone the set's `Arc` and run against that snapshot, so a concurrent
/// `load_policies` never exposes a partially-updated set.
pub struct PolicyEngine {
    active: RwLock<Option<Arc<PolicySet>>>,
    violations: ViolationLog,
    evaluations: AtomicU64,
    matches: AtomicU64,
    violations_recorded: AtomicU64,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::with_retention(Retention::default())
    }

    pub fn with_retention(retention: Retention) -> Self {
        Self {
            active: RwLock::new(None),
            violations: ViolationLog::new(retention),
            evaluations: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            violations_recorded: AtomicU64::new(0),
        }
    }

    /// Validate and atomically activate a new policy set.
    ///
    /// All-or-nothing: any validation failure rejects the entire load and
    /// the previously active set (or the unloaded state) stays in effect.
    /// Returns the number of policies activated.
    pub fn load_policies(&self, policies: Vec<Policy>) -> Result<usize, ValidationError> {
        validate::validate_set(&policies)?;

        let count = policies.len();
        let mut active = self.active.write();
        let version = active.as_ref().map(|set| set.version + 1).unwrap_or(1);
        *active = Some(Arc::new(PolicySet { version, policies }));
        drop(active);

        log::info!("Activated policy set v{} ({} policies)", version, count);
        Ok(count)
    }

    /// Evaluate one observation against the active set.
    ///
    /// Policies are tried in set order; the first full match determines
    /// the decision and the rest are skipped. A missing field makes its
    /// condition a non-match, never an error. No match (or no loaded set)
    /// yields the default allow.
    pub fn evaluate(&self, observation: &Observation) -> Decision {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let Some(set) = self.snapshot() else {
            return Decision::default_allow();
        };

        for policy in &set.policies {
            if !policy_matches(policy, observation) {
                continue;
            }
            self.matches.fetch_add(1, Ordering::Relaxed);

            let decision = Decision::from_policy(policy);
            if let Some(severity) = Severity::from_action(policy.action) {
                self.record_violation(policy, observation, severity);
            }

            if decision.allowed {
                log::debug!(
                    "{} {} on {}: {} ({})",
                    observation.subject,
                    observation.action,
                    observation.resource,
                    policy.action,
                    decision.reason
                );
            } else {
                log::warn!(
                    "{} {} on {} blocked ({})",
                    observation.subject,
                    observation.action,
                    observation.resource,
                    decision.reason
                );
            }
            return decision;
        }

        Decision::default_allow()
    }

    /// Violations in the retention window, oldest-first, as a detached copy
    pub fn violations(&self) -> Vec<Violation> {
        self.violations.snapshot()
    }

    pub fn state(&self) -> EngineState {
        if self.active.read().is_some() {
            EngineState::Loaded
        } else {
            EngineState::Unloaded
        }
    }

    /// Current active set snapshot, if any
    pub fn active_set(&self) -> Option<Arc<PolicySet>> {
        self.snapshot()
    }

    pub fn stats(&self) -> EngineStats {
        let set = self.snapshot();
        EngineStats {
            state: self.state(),
            set_version: set.as_ref().map(|s| s.version).unwrap_or(0),
            policies_active: set.as_ref().map(|s| s.policies.len()).unwrap_or(0),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            violations_recorded: self.violations_recorded.load(Ordering::Relaxed),
            violations_retained: self.violations.len(),
        }
    }

    fn snapshot(&self) -> Option<Arc<PolicySet>> {
        self.active.read().clone()
    }

    fn record_violation(&self, policy: &Policy, observation: &Observation, severity: Severity) {
        self.violations.append(Violation {
            timestamp: Utc::now(),
            pod: observation.subject.pod.clone(),
            namespace: observation.subject.namespace.clone(),
            policy_name: policy.name.clone(),
            description: format!(
                "{} on {} (anomaly score {:.2})",
                observation.action, observation.resource, observation.anomaly_score
            ),
            severity,
        });
        self.violations_recorded.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MATCHING
// ============================================================================

fn policy_matches(policy: &Policy, observation: &Observation) -> bool {
    policy
        .conditions
        .iter()
        .all(|condition| condition_matches(condition, observation))
}

fn condition_matches(condition: &Condition, observation: &Observation) -> bool {
    let Some(actual) = observation.field(&condition.field) else {
        return false;
    };

    match condition.operator {
        Operator::Equals => actual == condition.value,
        Operator::NotEquals => actual != condition.value,
        Operator::GreaterThan => match (&actual, &condition.value) {
            (FieldValue::Num(a), FieldValue::Num(b)) => a > b,
            _ => false,
        },
        Operator::LessThan => match (&actual, &condition.value) {
            (FieldValue::Num(a), FieldValue::Num(b)) => a < b,
            _ => false,
        },
        Operator::Contains => match (&actual, &condition.value) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a.contains(b.as_str()),
            _ => false,
        },
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Point-in-time engine counters
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub state: EngineState,
    /// 0 while unloaded
    pub set_version: u64,
    pub policies_active: usize,
    pub evaluations: u64,
    pub matches: u64,
    pub violations_recorded: u64,
    pub violations_retained: usize,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::types::PolicyAction;
    use super::*;
    use crate::observation::Subject;

    fn obs(action: &str, namespace: &str) -> Observation {
        Observation::new(Subject::new("web-1", namespace), action, "/data", 0.1)
    }

    #[test]
    fn test_match_on_equals() {
        let engine = PolicyEngine::new();
        engine
            .load_policies(vec![Policy::new("block-write", PolicyAction::Block)
                .with_condition(Condition::new("action", Operator::Equals, "write"))])
            .expect("load");

        assert!(!engine.evaluate(&obs("write", "prod")).allowed);
        assert!(engine.evaluate(&obs("read", "prod")).allowed);
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let engine = PolicyEngine::new();
        engine
            .load_policies(vec![Policy::new("block-prod-write", PolicyAction::Block)
                .with_condition(Condition::new("action", Operator::Equals, "write"))
                .with_condition(Condition::new("namespace", Operator::Equals, "prod"))])
            .expect("load");

        assert!(!engine.evaluate(&obs("write", "prod")).allowed);
        assert!(engine.evaluate(&obs("write", "staging")).allowed);
    }

    #[test]
    fn test_numeric_threshold_conditions() {
        let engine = PolicyEngine::new();
        engine
            .load_policies(vec![Policy::new("flag-anomalous", PolicyAction::Alert)
                .with_condition(Condition::new("anomaly_score", Operator::GreaterThan, 0.8))])
            .expect("load");

        let hot = Observation::new(Subject::new("web-1", "prod"), "exec", "/bin/sh", 0.95);
        let decision = engine.evaluate(&hot);
        assert!(decision.allowed);
        assert_eq!(decision.actions, vec![PolicyAction::Alert]);

        let cold = Observation::new(Subject::new("web-1", "prod"), "exec", "/bin/sh", 0.2);
        assert!(engine.evaluate(&cold).is_pass_through());
    }

    #[test]
    fn test_contains_condition() {
        let engine = PolicyEngine::new();
        engine
            .load_policies(vec![Policy::new("audit-etc", PolicyAction::Audit)
                .with_condition(Condition::new("resource", Operator::Contains, "/etc/"))])
            .expect("load");

        let touching_etc =
            Observation::new(Subject::new("web-1", "prod"), "read", "/etc/passwd", 0.1);
        assert_eq!(
            engine.evaluate(&touching_etc).actions,
            vec![PolicyAction::Audit]
        );
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let engine = PolicyEngine::new();
        engine
            .load_policies(vec![Policy::new("team-audit", PolicyAction::Audit)
                .with_condition(Condition::new("team", Operator::Equals, "payments"))])
            .expect("load");

        // No "team" attribute: silently resolves to the default allow
        let decision = engine.evaluate(&obs("read", "prod"));
        assert!(decision.is_pass_through());
        assert_eq!(decision.reason, super::super::types::NO_MATCH_REASON);
        assert!(engine.violations().is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let engine = PolicyEngine::new();
        assert_eq!(engine.state(), EngineState::Unloaded);

        engine
            .load_policies(vec![Policy::new("p", PolicyAction::Allow)
                .with_condition(Condition::new("action", Operator::Equals, "read"))])
            .expect("load");
        assert_eq!(engine.state(), EngineState::Loaded);
        assert_eq!(engine.stats().set_version, 1);

        // Failed load: still loaded, version unchanged
        assert!(engine.load_policies(vec![Policy::new("", PolicyAction::Allow)]).is_err());
        assert_eq!(engine.state(), EngineState::Loaded);
        assert_eq!(engine.stats().set_version, 1);

        // Subsequent successful load bumps the version
        engine
            .load_policies(vec![Policy::new("q", PolicyAction::Allow)
                .with_condition(Condition::new("action", Operator::Equals, "read"))])
            .expect("reload");
        assert_eq!(engine.stats().set_version, 2);
    }

    #[test]
    fn test_empty_set_is_a_valid_load() {
        let engine = PolicyEngine::new();
        assert_eq!(engine.load_policies(Vec::new()), Ok(0));
        assert_eq!(engine.state(), EngineState::Loaded);
        assert!(engine.evaluate(&obs("write", "prod")).is_pass_through());
    }
}
