//! Repair pass - write declared state back into the scene

use crate::options::{CancelToken, ReconcileOptions};
use crate::report::{CheckKind, RepairAction, RepairError, RepairReport};
use rigcheck_core::Status;
use rigcheck_model::{ConnectionValidityNode, SourceNode, ValidityNode, Validator};
use rigcheck_scene::{EditBatch, SceneAccessor};

/// Applies the expected state of every node that has not passed.
///
/// Repairs are best effort: a failed write is recorded in the report and
/// the pass moves on.
#[derive(Debug, Clone, Default)]
pub struct ValidityRepairer {
    options: ReconcileOptions,
    cancel: Option<CancelToken>,
}

impl ValidityRepairer {
    /// Create a new repairer with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Repair the scene in place, updating node statuses
    pub fn repair<S: SceneAccessor + ?Sized>(
        &self,
        scene: &mut S,
        validator: &mut Validator,
    ) -> RepairReport {
        let mut report = RepairReport::new(validator.name.clone());
        let batching = self.options.atomic_batches && scene.supports_batching();

        for node in validator.iter_source_nodes_mut() {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                tracing::info!(validator = %report.validator, "repair cancelled");
                report.cancelled = true;
                break;
            }

            if !scene.exists(node.long_name()) {
                node.set_status_recursive(Status::MissingSource);
                report.skipped_sources.push(node.long_name().to_string());
                continue;
            }

            self.repair_default_values(scene, node, &mut report);
            if batching {
                self.repair_connections_batched(scene, node, &mut report);
            } else {
                self.repair_connections_each(scene, node, &mut report);
            }

            let status = if node.children().iter().all(|c| c.status().is_passed()) {
                Status::Passed
            } else {
                Status::Failed
            };
            node.set_status(status);
        }

        validator.roll_up_status();
        tracing::info!(
            validator = %report.validator,
            repairs = report.actions.len(),
            errors = report.errors.len(),
            skipped = report.skipped_sources.len(),
            "repair finished"
        );
        report
    }

    /// Repair copies of the scene and validator, leaving both untouched
    pub fn dry_run<S: SceneAccessor + Clone>(
        &self,
        scene: &S,
        validator: &Validator,
    ) -> RepairReport {
        let mut scene = scene.clone();
        let mut validator = validator.clone();
        self.repair(&mut scene, &mut validator)
    }

    fn repair_default_values<S: SceneAccessor + ?Sized>(
        &self,
        scene: &mut S,
        node: &mut SourceNode,
        report: &mut RepairReport,
    ) {
        let source = node.long_name().to_string();

        for child in node.children_mut() {
            let ValidityNode::DefaultValue(default) = child else {
                continue;
            };
            if default.meta.status.is_passed() {
                continue;
            }

            match scene.write_attribute(&default.address, &default.expected_value) {
                Ok(()) => {
                    default.meta.status = Status::Passed;
                    report.actions.push(RepairAction {
                        source: source.clone(),
                        node: default.meta.long_name.clone(),
                        kind: CheckKind::DefaultValue,
                        description: format!(
                            "set {} to {}",
                            default.address, default.expected_value
                        ),
                    });
                }
                Err(e) => {
                    tracing::warn!(source = %source, node = %default.meta.long_name, error = %e, "default value repair failed");
                    default.meta.status = Status::Failed;
                    report.errors.push(RepairError {
                        source: source.clone(),
                        node: default.meta.long_name.clone(),
                        kind: CheckKind::DefaultValue,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// All pending connections of one source node go into a single batch.
    ///
    /// The batch covers this source node only, not the whole pass: a failed
    /// batch leaves other source nodes' repairs applied. Cancellation is
    /// checked between source nodes, so a batch is never split.
    fn repair_connections_batched<S: SceneAccessor + ?Sized>(
        &self,
        scene: &mut S,
        node: &mut SourceNode,
        report: &mut RepairReport,
    ) {
        let source = node.long_name().to_string();
        let mut batch = EditBatch::new();
        let mut pending = Vec::new();

        for (i, child) in node.children_mut().iter_mut().enumerate() {
            let ValidityNode::Connection(connection) = child else {
                continue;
            };
            if connection.meta.status.is_passed() {
                continue;
            }
            if !scene.exists(connection.destination_long_name()) {
                mark_missing_destination(&source, connection, report);
                continue;
            }
            queue_connection(&mut batch, connection);
            pending.push(i);
        }

        if batch.is_empty() {
            return;
        }

        let result = scene.apply_batch(&batch);
        if result.is_ok() {
            report.batches_applied += 1;
        }

        for i in pending {
            let ValidityNode::Connection(connection) = &mut node.children_mut()[i] else {
                continue;
            };
            match &result {
                Ok(()) => record_connected(&source, connection, report),
                Err(e) => {
                    tracing::warn!(source = %source, node = %connection.meta.long_name, error = %e, "connection batch rejected");
                    connection.meta.status = Status::Failed;
                    report.errors.push(RepairError {
                        source: source.clone(),
                        node: connection.meta.long_name.clone(),
                        kind: CheckKind::Connection,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Each connect and value write is applied on its own
    fn repair_connections_each<S: SceneAccessor + ?Sized>(
        &self,
        scene: &mut S,
        node: &mut SourceNode,
        report: &mut RepairReport,
    ) {
        let source = node.long_name().to_string();

        for child in node.children_mut() {
            let ValidityNode::Connection(connection) = child else {
                continue;
            };
            if connection.meta.status.is_passed() {
                continue;
            }
            if !scene.exists(connection.destination_long_name()) {
                mark_missing_destination(&source, connection, report);
                continue;
            }

            let result = scene
                .connect(&connection.source, &connection.destination)
                .and_then(|()| match &connection.source.value {
                    Some(value) => scene.write_attribute(&connection.source, value),
                    None => Ok(()),
                });

            match result {
                Ok(()) => record_connected(&source, connection, report),
                Err(e) => {
                    tracing::warn!(source = %source, node = %connection.meta.long_name, error = %e, "connection repair failed");
                    connection.meta.status = Status::Failed;
                    report.errors.push(RepairError {
                        source: source.clone(),
                        node: connection.meta.long_name.clone(),
                        kind: CheckKind::Connection,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Connect, then restore the source side's snapshot value
fn queue_connection(batch: &mut EditBatch, connection: &ConnectionValidityNode) {
    batch.connect(connection.source.clone(), connection.destination.clone());
    if let Some(value) = &connection.source.value {
        batch.write(connection.source.clone(), value.clone());
    }
}

fn record_connected(source: &str, connection: &mut ConnectionValidityNode, report: &mut RepairReport) {
    connection.meta.status = Status::Passed;
    report.actions.push(RepairAction {
        source: source.to_string(),
        node: connection.meta.long_name.clone(),
        kind: CheckKind::Connection,
        description: format!("connected {} -> {}", connection.source, connection.destination),
    });
}

fn mark_missing_destination(
    source: &str,
    connection: &mut ConnectionValidityNode,
    report: &mut RepairReport,
) {
    connection.meta.status = Status::MissingDestination;
    report.errors.push(RepairError {
        source: source.to_string(),
        node: connection.meta.long_name.clone(),
        kind: CheckKind::Connection,
        message: format!("destination {} not found", connection.destination_long_name()),
    });
}
