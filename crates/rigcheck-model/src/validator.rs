//! Validator - an ordered, named collection of source nodes

use crate::node::SourceNode;
use rigcheck_core::{Result, RigError, Status};

/// An ordered set of [`SourceNode`]s, unique by long name.
///
/// Short names may repeat across namespaces; only long names collide.
/// Iteration borrows the validator, so the node sequence cannot change
/// while a pass is walking it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    pub name: String,
    namespace: Option<String>,
    /// Aggregate outcome of the last pass
    pub status: Status,
    source_nodes: Vec<SourceNode>,
}

impl Validator {
    /// Create a new empty validator
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.set_namespace(Some(namespace.into()));
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Change the namespace and refresh every display name
    pub fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
        let namespace = self.namespace.as_deref();
        for node in &mut self.source_nodes {
            node.apply_namespace(namespace);
        }
    }

    /// Add a source node.
    ///
    /// A node whose long name is already present is an error unless `force`
    /// is set, in which case it replaces the existing node at its position.
    pub fn add_source_node(&mut self, mut node: SourceNode, force: bool) -> Result<bool> {
        if node.name().is_empty() || node.long_name().is_empty() {
            return Err(RigError::SchemaError(
                "source node needs a non-empty name".to_string(),
            ));
        }
        node.apply_namespace(self.namespace.as_deref());

        match self.position(node.long_name()) {
            Some(_) if !force => Err(RigError::DuplicateNode(node.long_name().to_string())),
            Some(i) => {
                tracing::debug!(validator = %self.name, source = %node.long_name(), "replacing source node");
                self.source_nodes[i] = node;
                Ok(true)
            }
            None => {
                self.source_nodes.push(node);
                Ok(true)
            }
        }
    }

    pub fn find_source_node_by_long_name(&self, long_name: &str) -> Option<&SourceNode> {
        self.source_nodes.iter().find(|n| n.long_name() == long_name)
    }

    pub fn source_node_mut(&mut self, long_name: &str) -> Option<&mut SourceNode> {
        self.source_nodes
            .iter_mut()
            .find(|n| n.long_name() == long_name)
    }

    /// Remove and return the source node with this long name
    pub fn remove_source_node(&mut self, long_name: &str) -> Result<SourceNode> {
        let i = self
            .position(long_name)
            .ok_or_else(|| RigError::NotFound(long_name.to_string()))?;
        Ok(self.source_nodes.remove(i))
    }

    /// Source nodes in insertion order
    pub fn iter_source_nodes(&self) -> std::slice::Iter<'_, SourceNode> {
        self.source_nodes.iter()
    }

    /// Mutable walk over the source nodes; nodes cannot be added or removed through it
    pub fn iter_source_nodes_mut(&mut self) -> std::slice::IterMut<'_, SourceNode> {
        self.source_nodes.iter_mut()
    }

    /// Fold another validator's source nodes into this one.
    ///
    /// Without `force`, any long-name collision fails before anything is
    /// added. Returns the number of nodes taken from `other`.
    pub fn merge(&mut self, other: Validator, force: bool) -> Result<usize> {
        if !force {
            if let Some(dup) = other
                .iter_source_nodes()
                .find(|n| self.position(n.long_name()).is_some())
            {
                return Err(RigError::DuplicateNode(dup.long_name().to_string()));
            }
        }

        let count = other.source_nodes.len();
        for node in other.source_nodes {
            self.add_source_node(node, true)?;
        }
        Ok(count)
    }

    /// Recompute `status` as the worst status anywhere in the tree
    pub fn roll_up_status(&mut self) -> Status {
        self.status = Status::roll_up(self.source_nodes.iter().flat_map(|n| n.statuses()));
        self.status
    }

    /// Set every status back to `NotApplicable`
    pub fn reset_status(&mut self) {
        self.status = Status::NotApplicable;
        for node in &mut self.source_nodes {
            node.reset_status();
        }
    }

    pub fn len(&self) -> usize {
        self.source_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_nodes.is_empty()
    }

    fn position(&self, long_name: &str) -> Option<usize> {
        self.source_nodes
            .iter()
            .position(|n| n.long_name() == long_name)
    }
}

impl<'a> IntoIterator for &'a Validator {
    type Item = &'a SourceNode;
    type IntoIter = std::slice::Iter<'a, SourceNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_source_nodes()
    }
}
