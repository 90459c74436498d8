//! Validate pass - compare declared state against the live scene

use crate::options::{CancelToken, ReconcileOptions};
use crate::report::{CheckKind, Finding, ValidationReport};
use rigcheck_core::{AttributeAddress, RigError, Status};
use rigcheck_model::{
    ConnectionValidityNode, DefaultValueNode, SourceNode, ValidityNode, Validator,
};
use rigcheck_scene::SceneAccessor;

/// Checks a validator against a scene, recording a status on every node.
///
/// Per-node problems become statuses and findings; a pass always walks the
/// whole validator unless cancelled.
pub struct ValidityEvaluator<'a, S: SceneAccessor + ?Sized> {
    scene: &'a S,
    options: ReconcileOptions,
    cancel: Option<CancelToken>,
}

impl<'a, S: SceneAccessor + ?Sized> ValidityEvaluator<'a, S> {
    /// Create a new evaluator with default options
    pub fn new(scene: &'a S) -> Self {
        Self {
            scene,
            options: ReconcileOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run every check and return the report.
    ///
    /// Statuses from any previous pass are cleared first.
    pub fn validate(&self, validator: &mut Validator) -> ValidationReport {
        let mut report = ValidationReport::new(validator.name.clone());
        validator.reset_status();

        for node in validator.iter_source_nodes_mut() {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                tracing::info!(validator = %report.validator, "validation cancelled");
                report.cancelled = true;
                break;
            }
            self.validate_source_node(node, &mut report.findings);
            report.sources_checked += 1;
        }

        report.status = validator.roll_up_status();
        tracing::info!(
            validator = %report.validator,
            status = ?report.status,
            checks = report.findings.len(),
            "validation finished"
        );
        report
    }

    /// Check one source node and its children
    pub fn validate_source_node(&self, node: &mut SourceNode, findings: &mut Vec<Finding>) {
        let source = node.long_name().to_string();

        if !self.scene.exists(&source) {
            // Nothing below a missing object is read
            node.set_status_recursive(Status::MissingSource);
            tracing::debug!(source = %source, "source object missing");
            findings.push(Finding {
                source: source.clone(),
                node: source,
                kind: CheckKind::SourceExists,
                status: Status::MissingSource,
                detail: Some("source object not found".to_string()),
            });
            return;
        }

        for child in node.children_mut() {
            let (kind, (status, detail)) = match child {
                ValidityNode::DefaultValue(default) => {
                    (CheckKind::DefaultValue, self.check_default_value(default))
                }
                ValidityNode::Connection(connection) => {
                    (CheckKind::Connection, self.check_connection(connection))
                }
            };
            child.set_status(status);
            tracing::debug!(
                source = %source,
                node = %child.meta().long_name,
                status = ?status,
                "checked {}",
                kind
            );
            findings.push(Finding {
                source: source.clone(),
                node: child.meta().long_name.clone(),
                kind,
                status,
                detail,
            });
        }

        let status = if node.children().iter().all(|c| c.status().is_passed()) {
            Status::Passed
        } else {
            Status::Failed
        };
        node.set_status(status);
    }

    fn check_default_value(&self, node: &DefaultValueNode) -> (Status, Option<String>) {
        let comparer = &self.options.comparer;
        match self.scene.read_attribute(&node.address) {
            Ok(actual) if comparer.matches(&node.expected_value, &actual) => (Status::Passed, None),
            Ok(actual) => (
                Status::Failed,
                Some(format!("expected {}, found {}", node.expected_value, actual)),
            ),
            Err(RigError::UnreadableAttributeKind(_)) => (Status::Passed, None),
            Err(e) if e.is_missing() => (Status::MissingSource, Some(e.to_string())),
            Err(e) => (Status::Failed, Some(e.to_string())),
        }
    }

    /// Existence, then connectivity and both value snapshots.
    ///
    /// Once the destination exists every sub-check runs, so the detail
    /// lists all mismatches together.
    fn check_connection(&self, node: &ConnectionValidityNode) -> (Status, Option<String>) {
        if !self.scene.exists(node.destination_long_name()) {
            return (
                Status::MissingDestination,
                Some(format!("destination {} not found", node.destination_long_name())),
            );
        }

        let mut problems = Vec::new();

        match self.scene.is_connected_from(&node.destination, &node.source) {
            Ok(true) => {}
            Ok(false) => problems.push(format!(
                "{} is not driven by {}",
                node.destination, node.source
            )),
            Err(e) => problems.push(format!("connectivity: {}", e)),
        }

        for (side, address) in [("source", &node.source), ("destination", &node.destination)] {
            if let Some(problem) = self.check_snapshot(side, address) {
                problems.push(problem);
            }
        }

        if problems.is_empty() {
            (Status::Passed, None)
        } else {
            (Status::Failed, Some(problems.join("; ")))
        }
    }

    /// Compare the live value at `address` with its snapshot, if it has one
    fn check_snapshot(&self, side: &str, address: &AttributeAddress) -> Option<String> {
        let expected = address.value.as_ref()?;
        match self.scene.read_attribute(address) {
            Ok(actual) if self.options.comparer.matches(expected, &actual) => None,
            Ok(actual) => Some(format!(
                "{} {}: expected {}, found {}",
                side, address, expected, actual
            )),
            Err(RigError::UnreadableAttributeKind(_)) => None,
            Err(e) => Some(format!("{} {}: {}", side, address, e)),
        }
    }
}
