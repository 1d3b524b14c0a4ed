//! Policy Types
//!
//! Core types for policies and decisions. No evaluation logic here.

use serde::{Deserialize, Serialize};

// ============================================================================
// ENFORCEMENT ACTIONS
// ============================================================================

/// Enforcement action a policy maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Pass through, nothing recorded
    Allow,
    /// Pass through, record for audit
    Audit,
    /// Pass through, raise an alert
    Alert,
    /// Deny the action
    Block,
}

impl PolicyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::Allow => "allow",
            PolicyAction::Audit => "audit",
            PolicyAction::Alert => "alert",
            PolicyAction::Block => "block",
        }
    }

    /// Plain pass-through, no violation recorded
    pub fn is_pass_through(&self) -> bool {
        matches!(self, PolicyAction::Allow)
    }

    pub fn blocks(&self) -> bool {
        matches!(self, PolicyAction::Block)
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SEVERITY LEVELS
// ============================================================================

/// Severity of a recorded violation, derived from the enforcement action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity a matched action maps to; `None` for plain allow
    pub fn from_action(action: PolicyAction) -> Option<Self> {
        match action {
            PolicyAction::Allow => None,
            PolicyAction::Audit => Some(Severity::Low),
            PolicyAction::Alert => Some(Severity::Medium),
            PolicyAction::Block => Some(Severity::High),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONDITION VALUES
// ============================================================================

/// Dynamically-typed comparison value
///
/// Operators are restricted per kind at load time, so a mismatch is
/// caught when a set is loaded rather than during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Num(_) => FieldKind::Num,
            FieldValue::Bool(_) => FieldKind::Bool,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Num(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// Kind of a condition value or observation field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Str,
    Num,
    Bool,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Num => "number",
            FieldKind::Bool => "boolean",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

/// Comparison operator for a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not-equals",
            Operator::GreaterThan => "greater-than",
            Operator::LessThan => "less-than",
            Operator::Contains => "contains",
        }
    }

    /// Whether this operator is semantically valid for a value kind
    pub fn supports(&self, kind: FieldKind) -> bool {
        match self {
            Operator::Equals | Operator::NotEquals => true,
            Operator::GreaterThan | Operator::LessThan => kind == FieldKind::Num,
            Operator::Contains => kind == FieldKind::Str,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONDITIONS & POLICIES
// ============================================================================

/// One field comparison; all conditions of a policy must hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: FieldValue,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.into(),
        }
    }
}

/// A named rule mapping conditions to an enforcement action
///
/// Immutable value object; the engine swaps whole sets, never individual
/// policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub conditions: Vec<Condition>,
    pub action: PolicyAction,
}

impl Policy {
    pub fn new(name: &str, action: PolicyAction) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            conditions: Vec::new(),
            action,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Reason reported when no policy matches
pub const NO_MATCH_REASON: &str = "no matching policy";

/// Outcome of evaluating one observation against the active set
///
/// Not persisted; violations carry the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
    pub actions: Vec<PolicyAction>,
}

impl Decision {
    /// Default decision when nothing matches (or no set is loaded)
    pub fn default_allow() -> Self {
        Self {
            allowed: true,
            reason: NO_MATCH_REASON.to_string(),
            actions: Vec::new(),
        }
    }

    /// Decision produced by the first matching policy
    pub fn from_policy(policy: &Policy) -> Self {
        let actions = if policy.action.is_pass_through() {
            Vec::new()
        } else {
            vec![policy.action]
        };

        Self {
            allowed: !policy.action.blocks(),
            reason: format!("matched policy '{}'", policy.name),
            actions,
        }
    }

    /// Plain allow with no enforcement actions attached
    pub fn is_pass_through(&self) -> bool {
        self.allowed && self.actions.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
