//! Policy Validation
//!
//! All-or-nothing checks applied to a policy set before it is activated.
//! A failure here leaves the previously active set in effect.

use std::collections::HashSet;

use crate::observation;

use super::types::{Condition, FieldKind, Operator, Policy};

// ============================================================================
// ERRORS
// ============================================================================

/// Rejected policy load; recoverable, active state unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName { index: usize },
    DuplicateName(String),
    NoConditions(String),
    EmptyField { policy: String },
    OperatorMismatch {
        policy: String,
        field: String,
        operator: Operator,
        kind: FieldKind,
    },
    FieldKindMismatch {
        policy: String,
        field: String,
        expected: FieldKind,
        got: FieldKind,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyName { index } => {
                write!(f, "policy at index {} has an empty name", index)
            }
            ValidationError::DuplicateName(name) => {
                write!(f, "duplicate policy name '{}'", name)
            }
            ValidationError::NoConditions(name) => {
                write!(f, "policy '{}' has no conditions", name)
            }
            ValidationError::EmptyField { policy } => {
                write!(f, "policy '{}' has a condition with an empty field", policy)
            }
            ValidationError::OperatorMismatch { policy, field, operator, kind } => {
                write!(
                    f,
                    "policy '{}': operator '{}' is not valid for {} value on field '{}'",
                    policy, operator, kind, field
                )
            }
            ValidationError::FieldKindMismatch { policy, field, expected, got } => {
                write!(
                    f,
                    "policy '{}': field '{}' is {} but the condition value is {}",
                    policy, field, expected, got
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a whole candidate set; first problem rejects the entire load
pub fn validate_set(policies: &[Policy]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for (index, policy) in policies.iter().enumerate() {
        if policy.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { index });
        }
        if !seen.insert(policy.name.as_str()) {
            return Err(ValidationError::DuplicateName(policy.name.clone()));
        }
        if policy.conditions.is_empty() {
            return Err(ValidationError::NoConditions(policy.name.clone()));
        }
        for condition in &policy.conditions {
            validate_condition(policy, condition)?;
        }
    }

    Ok(())
}

fn validate_condition(policy: &Policy, condition: &Condition) -> Result<(), ValidationError> {
    if condition.field.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            policy: policy.name.clone(),
        });
    }

    let value_kind = condition.value.kind();
    if !condition.operator.supports(value_kind) {
        return Err(ValidationError::OperatorMismatch {
            policy: policy.name.clone(),
            field: condition.field.clone(),
            operator: condition.operator,
            kind: value_kind,
        });
    }

    // Core fields have declared kinds; anything else resolves through the
    // attribute map, which only ever holds strings.
    let declared = observation::schema_kind(&condition.field).unwrap_or(FieldKind::Str);
    if value_kind != declared {
        return Err(ValidationError::FieldKindMismatch {
            policy: policy.name.clone(),
            field: condition.field.clone(),
            expected: declared,
            got: value_kind,
        });
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::types::PolicyAction;
    use super::*;

    fn valid_policy(name: &str) -> Policy {
        Policy::new(name, PolicyAction::Block)
            .with_condition(Condition::new("action", Operator::Equals, "write"))
    }

    #[test]
    fn test_valid_set_passes() {
        let set = vec![
            valid_policy("block-write"),
            Policy::new("flag-anomalous", PolicyAction::Alert)
                .with_condition(Condition::new("anomaly_score", Operator::GreaterThan, 0.8)),
            Policy::new("audit-team-label", PolicyAction::Audit)
                .with_condition(Condition::new("team", Operator::Contains, "pay")),
        ];
        assert!(validate_set(&set).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let set = vec![valid_policy("ok"), valid_policy("  ")];
        assert_eq!(validate_set(&set), Err(ValidationError::EmptyName { index: 1 }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let set = vec![valid_policy("dup"), valid_policy("dup")];
        assert_eq!(
            validate_set(&set),
            Err(ValidationError::DuplicateName("dup".to_string()))
        );
    }

    #[test]
    fn test_policy_without_conditions_rejected() {
        let set = vec![Policy::new("bare", PolicyAction::Allow)];
        assert_eq!(
            validate_set(&set),
            Err(ValidationError::NoConditions("bare".to_string()))
        );
    }

    #[test]
    fn test_ordering_operator_on_string_field_rejected() {
        let set = vec![Policy::new("bad", PolicyAction::Block)
            .with_condition(Condition::new("action", Operator::GreaterThan, "write"))];
        let err = validate_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::OperatorMismatch { .. }));
    }

    #[test]
    fn test_contains_on_numeric_value_rejected() {
        let set = vec![Policy::new("bad", PolicyAction::Block)
            .with_condition(Condition::new("resource", Operator::Contains, 1.0))];
        let err = validate_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::OperatorMismatch { .. }));
    }

    #[test]
    fn test_numeric_value_on_string_field_rejected() {
        let set = vec![Policy::new("bad", PolicyAction::Block)
            .with_condition(Condition::new("action", Operator::Equals, 2.0))];
        let err = validate_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::FieldKindMismatch { .. }));
    }

    #[test]
    fn test_attribute_fields_are_string_kinded() {
        let set = vec![Policy::new("bad", PolicyAction::Audit)
            .with_condition(Condition::new("replicas", Operator::Equals, 3.0))];
        let err = validate_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::FieldKindMismatch { .. }));
    }
}
