//! Observation Events
//!
//! Immutable, timestamped records of monitored node activity.
//! Produced by monitors, consumed by the policy engine; never modified
//! after creation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;
use crate::policy::types::{FieldKind, FieldValue};

// ============================================================================
// SUBJECT
// ============================================================================

/// Identity of the workload an observation refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub pod: String,
    pub namespace: String,
}

impl Subject {
    pub fn new(pod: &str, namespace: &str) -> Self {
        Self {
            pod: pod.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.pod)
    }
}

// ============================================================================
// OBSERVATION
// ============================================================================

/// A single recorded unit of monitored activity with an anomaly score
///
/// The anomaly score is clamped to [0.0, 1.0] at construction. Extra
/// workload labels go into `attributes`; policy conditions can address
/// them by name alongside the core fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Unique observation ID
    pub id: String,
    /// When the activity was observed (UTC)
    pub timestamp: DateTime<Utc>,
    /// Workload that performed the action
    pub subject: Subject,
    /// What was done ("read", "write", "connect", ...)
    pub action: String,
    /// What it was done to (path, address, ...)
    pub resource: String,
    /// Anomaly score in [0.0, 1.0]
    pub anomaly_score: f64,
    /// Extra workload labels, addressable by policy conditions
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Observation {
    pub fn new(subject: Subject, action: &str, resource: &str, anomaly_score: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            subject,
            action: action.to_string(),
            resource: resource.to_string(),
            anomaly_score: anomaly_score.clamp(0.0, 1.0),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Whether this observation counts as an anomaly in monitor metrics
    pub fn is_anomalous(&self) -> bool {
        self.anomaly_score >= constants::ANOMALY_FLAG_THRESHOLD
    }

    /// Look up a condition-addressable field by name.
    ///
    /// Core fields resolve to their declared kinds; any other name is
    /// looked up in the attribute map (string-kinded). `None` means the
    /// field is missing, which a condition treats as a non-match.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "pod" => Some(FieldValue::Str(self.subject.pod.clone())),
            "namespace" => Some(FieldValue::Str(self.subject.namespace.clone())),
            "action" => Some(FieldValue::Str(self.action.clone())),
            "resource" => Some(FieldValue::Str(self.resource.clone())),
            "anomaly_score" => Some(FieldValue::Num(self.anomaly_score)),
            other => self.attributes.get(other).map(|v| FieldValue::Str(v.clone())),
        }
    }
}

// ============================================================================
// FIELD SCHEMA
// ============================================================================

/// Declared kind of a core observation field, `None` for attribute fields
pub fn schema_kind(field: &str) -> Option<FieldKind> {
    match field {
        "pod" | "namespace" | "action" | "resource" => Some(FieldKind::Str),
        "anomaly_score" => Some(FieldKind::Num),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_score_is_clamped() {
        let subject = Subject::new("web-1", "prod");
        let high = Observation::new(subject.clone(), "write", "/etc/passwd", 3.5);
        assert_eq!(high.anomaly_score, 1.0);

        let low = Observation::new(subject, "read", "/tmp/x", -0.2);
        assert_eq!(low.anomaly_score, 0.0);
    }

    #[test]
    fn test_core_field_lookup() {
        let obs = Observation::new(Subject::new("web-1", "prod"), "read", "/data", 0.4);

        assert_eq!(obs.field("action"), Some(FieldValue::Str("read".to_string())));
        assert_eq!(obs.field("namespace"), Some(FieldValue::Str("prod".to_string())));
        assert_eq!(obs.field("anomaly_score"), Some(FieldValue::Num(0.4)));
    }

    #[test]
    fn test_attribute_field_lookup() {
        let obs = Observation::new(Subject::new("web-1", "prod"), "read", "/data", 0.1)
            .with_attribute("team", "payments");

        assert_eq!(obs.field("team"), Some(FieldValue::Str("payments".to_string())));
        assert_eq!(obs.field("owner"), None);
    }

    #[test]
    fn test_is_anomalous_threshold() {
        let subject = Subject::new("web-1", "prod");
        assert!(Observation::new(subject.clone(), "exec", "/bin/sh", 0.9).is_anomalous());
        assert!(!Observation::new(subject, "read", "/tmp", 0.3).is_anomalous());
    }

    #[test]
    fn test_schema_kinds() {
        assert_eq!(schema_kind("action"), Some(FieldKind::Str));
        assert_eq!(schema_kind("anomaly_score"), Some(FieldKind::Num));
        assert_eq!(schema_kind("team"), None);
    }
}
