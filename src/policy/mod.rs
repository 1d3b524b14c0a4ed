//! Policy Module
//!
//! Policy types, validation, the evaluation engine, and the violation log.
//!
//! ## Structure
//! - `types`: Core types (Policy, Condition, Decision, Severity)
//! - `validate`: All-or-nothing load validation
//! - `engine`: Evaluation engine with an atomically swappable active set
//! - `violations`: Bounded rolling violation window
//!
//! ## Usage
//! ```ignore
//! use nodeguard_core::policy::{Condition, Operator, Policy, PolicyAction, PolicyEngine};
//!
//! let engine = PolicyEngine::new();
//! engine.load_policies(vec![
//!     Policy::new("block-write", PolicyAction::Block)
//!         .with_condition(Condition::new("action", Operator::Equals, "write")),
//! ])?;
//! let decision = engine.evaluate(&observation);
//! ```

pub mod engine;
pub mod types;
pub mod validate;
pub mod violations;


// Re-export main types for convenience
pub use types::{
    Condition,
    Decision,
    FieldKind,
    FieldValue,
    Operator,
    Policy,
    PolicyAction,
    Severity,
    NO_MATCH_REASON,
};

pub use engine::{EngineState, EngineStats, PolicyEngine, PolicySet};

pub use validate::{validate_set, ValidationError};

pub use violations::{Retention, Violation, ViolationLog};
