//! rigcheck Reconcile - Validate and repair passes
//!
//! [`ValidityEvaluator`] compares a [`rigcheck_model::Validator`] against a
//! live scene and records a status on every node. [`ValidityRepairer`]
//! writes the declared state back for every node that did not pass.

mod capture;
mod evaluator;
mod fixer;
mod options;
mod report;

pub use capture::{capture_connection, capture_default_value, capture_source_node};
pub use evaluator::ValidityEvaluator;
pub use fixer::ValidityRepairer;
pub use options::{CancelToken, ReconcileOptions};
pub use report::{CheckKind, Finding, RepairAction, RepairError, RepairReport, ValidationReport};
