//! Validation nodes
//!
//! A [`SourceNode`] owns the checks declared against one authored object.
//! Its children are either [`DefaultValueNode`]s (an attribute must hold a
//! value) or [`ConnectionValidityNode`]s (an attribute must drive another).

use rigcheck_core::name::{display_name, short_name};
use rigcheck_core::{AttrValue, AttributeAddress, Status};

/// Node type discriminator written into documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Source = 10,
    Connection = 20,
    DefaultValue = 30,
}

impl NodeType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            10 => Some(NodeType::Source),
            20 => Some(NodeType::Connection),
            30 => Some(NodeType::DefaultValue),
            _ => None,
        }
    }
}

/// Fields shared by every node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeta {
    pub name: String,
    pub long_name: String,
    pub display_name: String,
    pub status: Status,
}

impl NodeMeta {
    pub fn new(name: impl Into<String>, long_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            long_name: long_name.into(),
            status: Status::NotApplicable,
        }
    }

    /// Meta for a node that stands for a scene object
    pub fn for_object(long_name: impl Into<String>) -> Self {
        let long_name = long_name.into();
        let name = short_name(&long_name).to_string();
        let mut meta = Self::new(name, long_name);
        meta.display_name = display_name(&meta.long_name, None);
        meta
    }
}

/// Expects one attribute on the source object to hold a literal value
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValueNode {
    pub meta: NodeMeta,
    pub address: AttributeAddress,
    pub expected_value: AttrValue,
}

impl DefaultValueNode {
    pub fn new(address: AttributeAddress, expected_value: impl Into<AttrValue>) -> Self {
        Self {
            meta: NodeMeta::new(address.display_attribute(), address.display_path()),
            address,
            expected_value: expected_value.into(),
        }
    }

    /// Replace the address and expected value from a fresh capture.
    ///
    /// The previous outcome no longer applies, so status resets.
    pub fn recapture(&mut self, address: AttributeAddress, expected_value: impl Into<AttrValue>) {
        *self = Self::new(address, expected_value);
    }
}

/// Expects a source attribute to drive a destination attribute, with both
/// ends holding their snapshot values.
///
/// The node's name and long name identify the destination object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionValidityNode {
    pub meta: NodeMeta,
    pub source: AttributeAddress,
    pub destination: AttributeAddress,
}

impl ConnectionValidityNode {
    pub fn new(source: AttributeAddress, destination: AttributeAddress) -> Self {
        Self {
            meta: NodeMeta::for_object(destination.owner_long_name.clone()),
            source,
            destination,
        }
    }

    pub fn destination_long_name(&self) -> &str {
        &self.destination.owner_long_name
    }
}

/// A check owned by a [`SourceNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidityNode {
    DefaultValue(DefaultValueNode),
    Connection(ConnectionValidityNode),
}

impl ValidityNode {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            ValidityNode::DefaultValue(node) => &node.meta,
            ValidityNode::Connection(node) => &node.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            ValidityNode::DefaultValue(node) => &mut node.meta,
            ValidityNode::Connection(node) => &mut node.meta,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            ValidityNode::DefaultValue(_) => NodeType::DefaultValue,
            ValidityNode::Connection(_) => NodeType::Connection,
        }
    }

    pub fn status(&self) -> Status {
        self.meta().status
    }

    pub fn set_status(&mut self, status: Status) {
        self.meta_mut().status = status;
    }

    pub fn as_default_value(&self) -> Option<&DefaultValueNode> {
        match self {
            ValidityNode::DefaultValue(node) => Some(node),
            ValidityNode::Connection(_) => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionValidityNode> {
        match self {
            ValidityNode::Connection(node) => Some(node),
            ValidityNode::DefaultValue(_) => None,
        }
    }

    fn refresh_display_name(&mut self, namespace: Option<&str>) {
        match self {
            ValidityNode::DefaultValue(node) => node.meta.display_name = node.meta.name.clone(),
            ValidityNode::Connection(node) => {
                node.meta.display_name = display_name(&node.meta.long_name, namespace)
            }
        }
    }
}

impl From<DefaultValueNode> for ValidityNode {
    fn from(node: DefaultValueNode) -> Self {
        ValidityNode::DefaultValue(node)
    }
}

impl From<ConnectionValidityNode> for ValidityNode {
    fn from(node: ConnectionValidityNode) -> Self {
        ValidityNode::Connection(node)
    }
}

/// Root of the checks declared against one authored object.
///
/// Children keep insertion order, which is report order. A default value
/// is never kept for an attribute that is also the source of a connection
/// check, whatever element or child slot either one names.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub meta: NodeMeta,
    children: Vec<ValidityNode>,
}

impl SourceNode {
    pub fn new(long_name: impl Into<String>) -> Self {
        Self {
            meta: NodeMeta::for_object(long_name),
            children: Vec::new(),
        }
    }

    pub fn long_name(&self) -> &str {
        &self.meta.long_name
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn status(&self) -> Status {
        self.meta.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.meta.status = status;
    }

    /// Set this node and every child to `status`
    pub fn set_status_recursive(&mut self, status: Status) {
        self.meta.status = status;
        for child in &mut self.children {
            child.set_status(status);
        }
    }

    pub fn reset_status(&mut self) {
        self.set_status_recursive(Status::NotApplicable);
    }

    /// This node's status followed by every child's
    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        std::iter::once(self.meta.status).chain(self.children.iter().map(|c| c.status()))
    }

    pub fn children(&self) -> &[ValidityNode] {
        &self.children
    }

    /// Mutable access to children; the set of children cannot change through it
    pub fn children_mut(&mut self) -> &mut [ValidityNode] {
        &mut self.children
    }

    pub fn default_values(&self) -> impl Iterator<Item = &DefaultValueNode> {
        self.children.iter().filter_map(|c| c.as_default_value())
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionValidityNode> {
        self.children.iter().filter_map(|c| c.as_connection())
    }

    /// Whether any connection check uses `attribute_name` as its source
    pub fn is_connection_source(&self, attribute_name: &str) -> bool {
        self.connections()
            .any(|c| c.source.attribute_name == attribute_name)
    }

    /// Add a default value check.
    ///
    /// The address owner is set to this node's long name. Returns `false`
    /// without adding when a connection check already uses the attribute as
    /// its source. A default for an already declared slot is replaced in
    /// place.
    pub fn add_default_value(&mut self, mut node: DefaultValueNode) -> bool {
        if node.address.owner_long_name != self.meta.long_name {
            node.address.owner_long_name = self.meta.long_name.clone();
            node.meta.long_name = node.address.display_path();
        }

        if self.is_connection_source(&node.address.attribute_name) {
            tracing::debug!(
                source = %self.meta.long_name,
                attribute = %node.address.display_attribute(),
                "default value dropped, attribute is a connection source"
            );
            return false;
        }

        let existing = self.children.iter().position(|c| {
            c.as_default_value()
                .is_some_and(|d| d.address.same_slot(&node.address))
        });
        match existing {
            Some(i) => self.children[i] = node.into(),
            None => self.children.push(node.into()),
        }
        true
    }

    /// Add a connection check, dropping every default value declared for
    /// its source attribute. Returns the number of defaults dropped.
    ///
    /// The source owner is set to this node's long name. A check with the
    /// same source and destination is replaced in place.
    pub fn add_connection(&mut self, mut node: ConnectionValidityNode) -> usize {
        node.source.owner_long_name = self.meta.long_name.clone();

        let before = self.children.len();
        self.children.retain(|c| {
            c.as_default_value()
                .map_or(true, |d| d.address.attribute_name != node.source.attribute_name)
        });
        let culled = before - self.children.len();

        let existing = self.children.iter().position(|c| {
            c.as_connection().is_some_and(|n| {
                n.source.same_slot(&node.source) && n.destination.same_slot(&node.destination)
            })
        });
        match existing {
            Some(i) => self.children[i] = node.into(),
            None => self.children.push(node.into()),
        }
        culled
    }

    /// Add any child, applying the connection precedence rule
    pub fn add_child(&mut self, child: ValidityNode) -> bool {
        match child {
            ValidityNode::DefaultValue(node) => self.add_default_value(node),
            ValidityNode::Connection(node) => {
                self.add_connection(node);
                true
            }
        }
    }

    pub fn find_default_value(&self, address: &AttributeAddress) -> Option<&DefaultValueNode> {
        self.default_values().find(|d| d.address.same_slot(address))
    }

    /// Remove the child at `index`
    pub fn remove_child(&mut self, index: usize) -> Option<ValidityNode> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Recompute display names, dropping `namespace` where it matches
    pub fn apply_namespace(&mut self, namespace: Option<&str>) {
        self.meta.display_name = display_name(&self.meta.long_name, namespace);
        for child in &mut self.children {
            child.refresh_display_name(namespace);
        }
    }
}
