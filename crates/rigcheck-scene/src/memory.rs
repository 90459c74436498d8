//! MemoryScene - an in-memory scene with named objects and connections

use crate::accessor::{Edit, EditBatch, SceneAccessor};
use rigcheck_core::name::short_name;
use rigcheck_core::{AttrSlot, AttrValue, AttributeAddress, Result, RigError};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

/// Maximum number of connection hops followed when reading a driven attribute
const MAX_CONNECTION_DEPTH: usize = 64;

/// Storage for one attribute on a scene object
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Plain scalar, vector, matrix or string attribute
    Value(AttrValue),
    /// Sparse array keyed by logical index
    Array(BTreeMap<u32, AttrValue>),
    /// Compound attribute with ordered, named children
    Compound(Vec<(String, AttrValue)>),
    /// Relationship-only attribute, connectable but without a value
    Message,
}

/// Attributes of one object in the scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneObject {
    attributes: BTreeMap<String, Attribute>,
}

impl SceneObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, attribute: Attribute) -> &mut Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        self.set(name, Attribute::Value(value.into()))
    }

    /// Set one element of an array attribute, creating the array if needed
    pub fn set_element(
        &mut self,
        name: impl Into<String>,
        index: u32,
        value: impl Into<AttrValue>,
    ) -> &mut Self {
        let entry = self
            .attributes
            .entry(name.into())
            .or_insert_with(|| Attribute::Array(BTreeMap::new()));
        if !matches!(entry, Attribute::Array(_)) {
            *entry = Attribute::Array(BTreeMap::new());
        }
        if let Attribute::Array(elements) = entry {
            elements.insert(index, value.into());
        }
        self
    }

    pub fn set_compound<N: Into<String>>(
        &mut self,
        name: impl Into<String>,
        children: Vec<(N, AttrValue)>,
    ) -> &mut Self {
        let children = children.into_iter().map(|(n, v)| (n.into(), v)).collect();
        self.set(name, Attribute::Compound(children))
    }

    pub fn set_message(&mut self, name: impl Into<String>) -> &mut Self {
        self.set(name, Attribute::Message)
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First compound attribute holding a child named `child`, with its ordinal
    pub fn find_child(&self, child: &str) -> Option<(&str, u32)> {
        self.attributes.iter().find_map(|(parent, attr)| match attr {
            Attribute::Compound(children) => children
                .iter()
                .position(|(n, _)| n == child)
                .map(|ordinal| (parent.as_str(), ordinal as u32)),
            _ => None,
        })
    }
}

/// Borrowed view of one resolved slot
enum SlotRef<'a> {
    Value(&'a AttrValue),
    Compound(&'a [(String, AttrValue)]),
    Message,
}

/// An in-memory [`SceneAccessor`].
///
/// Objects are keyed by long name but may be looked up by a unique short
/// name. Each destination slot has at most one incoming connection, and
/// reading a driven slot yields its source's live value.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: BTreeMap<String, SceneObject>,
    /// destination -> source
    connections: HashMap<AttributeAddress, AttributeAddress>,
    reads: Cell<usize>,
    writes: usize,
}

impl MemoryScene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with a long name
    pub fn spawn(&mut self, long_name: impl Into<String>) -> Result<&mut SceneObject> {
        let long_name = long_name.into();
        if self.objects.contains_key(&long_name) {
            return Err(RigError::DuplicateObject(long_name));
        }
        Ok(self.objects.entry(long_name).or_default())
    }

    /// Remove an object and every connection touching it
    pub fn despawn(&mut self, name: &str) -> Result<()> {
        let key = self
            .resolve_name(name)
            .ok_or_else(|| RigError::ObjectNotFound(name.to_string()))?
            .to_string();
        self.objects.remove(&key);
        self.connections
            .retain(|dst, src| dst.owner_long_name != key && src.owner_long_name != key);
        Ok(())
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.resolve_name(name).and_then(|key| self.objects.get(key))
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        let key = self.resolve_name(name)?.to_string();
        self.objects.get_mut(&key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve_name(name).is_some()
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(|k| k.as_str())
    }

    pub fn objects(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All connections as `(source, destination)` pairs
    pub fn connections(&self) -> impl Iterator<Item = (&AttributeAddress, &AttributeAddress)> {
        self.connections.iter().map(|(dst, src)| (src, dst))
    }

    /// Break the incoming connection of `destination`, if any
    pub fn disconnect(&mut self, destination: &AttributeAddress) -> Result<bool> {
        let key = self.locate(destination, true)?;
        Ok(self.connections.remove(&key).is_some())
    }

    /// Number of `read_attribute` calls since creation or the last reset
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of successful attribute writes since creation or the last reset
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn reset_counters(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }

    /// Map a long or unique short name to the stored long name
    fn resolve_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.objects.get_key_value(name) {
            return Some(key.as_str());
        }
        let mut matches = self
            .objects
            .keys()
            .filter(|key| short_name(key) == name || key.trim_start_matches('|') == name);
        match (matches.next(), matches.next()) {
            (Some(key), None) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Canonical key for an address: stored owner name, no value.
    ///
    /// With `allow_new_element`, an element index not yet present in an
    /// existing array is accepted (sparse arrays grow on write/connect).
    fn locate(&self, address: &AttributeAddress, allow_new_element: bool) -> Result<AttributeAddress> {
        let owner = self
            .resolve_name(&address.owner_long_name)
            .ok_or_else(|| RigError::ObjectNotFound(address.owner_long_name.clone()))?;
        let object = &self.objects[owner];

        match lookup(object, address) {
            Ok(_) => {}
            Err(RigError::AttributeNotFound(_))
                if allow_new_element
                    && matches!(address.slot, AttrSlot::Element(_))
                    && matches!(object.get(&address.attribute_name), Some(Attribute::Array(_))) => {}
            Err(e) => return Err(e),
        }

        Ok(AttributeAddress {
            owner_long_name: owner.to_string(),
            attribute_name: address.attribute_name.clone(),
            slot: address.slot,
            value: None,
        })
    }

    fn read_resolved(&self, address: &AttributeAddress, depth: usize) -> Result<AttrValue> {
        let key = self.locate(address, false)?;

        if let Some(source) = self.connections.get(&key) {
            if depth >= MAX_CONNECTION_DEPTH {
                return Err(RigError::InvalidAddress(format!(
                    "{}: connection chain too deep",
                    key.display_path()
                )));
            }
            return self.read_resolved(source, depth + 1);
        }

        match lookup(&self.objects[&key.owner_long_name], &key)? {
            SlotRef::Value(value) => Ok(value.clone()),
            SlotRef::Compound(children) => compound_value(&key, children),
            SlotRef::Message => Err(RigError::UnreadableAttributeKind(key.display_path())),
        }
    }

    fn would_cycle(&self, source: &AttributeAddress, destination: &AttributeAddress) -> bool {
        let mut current = source;
        for _ in 0..MAX_CONNECTION_DEPTH {
            if current == destination {
                return true;
            }
            match self.connections.get(current) {
                Some(upstream) => current = upstream,
                None => return false,
            }
        }
        true
    }
}

fn lookup<'a>(object: &'a SceneObject, address: &AttributeAddress) -> Result<SlotRef<'a>> {
    let path = address.display_path();
    match address.slot {
        AttrSlot::Plain => match object.get(&address.attribute_name) {
            Some(Attribute::Value(value)) => Ok(SlotRef::Value(value)),
            Some(Attribute::Compound(children)) => Ok(SlotRef::Compound(children)),
            Some(Attribute::Message) => Ok(SlotRef::Message),
            Some(Attribute::Array(_)) => Err(RigError::InvalidAddress(format!(
                "{} is an array attribute and needs an element index",
                path
            ))),
            None => Err(RigError::AttributeNotFound(path)),
        },
        AttrSlot::Element(index) => match object.get(&address.attribute_name) {
            Some(Attribute::Array(elements)) => elements
                .get(&index)
                .map(SlotRef::Value)
                .ok_or(RigError::AttributeNotFound(path)),
            Some(_) => Err(RigError::InvalidAddress(format!(
                "{} is not an array attribute",
                path
            ))),
            None => Err(RigError::AttributeNotFound(path)),
        },
        AttrSlot::Child(ordinal) => object
            .attributes
            .values()
            .find_map(|attr| match attr {
                Attribute::Compound(children) => children
                    .get(ordinal as usize)
                    .filter(|(name, _)| *name == address.attribute_name)
                    .map(|(_, value)| SlotRef::Value(value)),
                _ => None,
            })
            .ok_or(RigError::AttributeNotFound(path)),
    }
}

fn compound_value(address: &AttributeAddress, children: &[(String, AttrValue)]) -> Result<AttrValue> {
    children
        .iter()
        .map(|(_, value)| value.as_f64())
        .collect::<Option<Vec<f64>>>()
        .map(AttrValue::from_flat)
        .ok_or_else(|| RigError::TypeMismatch {
            expected: "numeric compound".to_string(),
            got: format!("mixed children on {}", address.display_path()),
        })
}

/// Coerce `value` to the stored kind of `existing`, or fail on incompatible kinds
fn coerce(existing: &AttrValue, value: &AttrValue) -> Result<AttrValue> {
    let mismatch = || RigError::TypeMismatch {
        expected: existing.kind_name().to_string(),
        got: value.kind_name().to_string(),
    };

    match (existing, value.as_f64()) {
        (AttrValue::Bool(_), Some(x)) => Ok(AttrValue::Bool(x != 0.0)),
        (AttrValue::Int(_), Some(x)) => Ok(AttrValue::Int(x.round() as i64)),
        (AttrValue::Float(_), Some(x)) => Ok(AttrValue::Float(x)),
        (AttrValue::String(_), _) if value.as_str().is_some() => Ok(value.clone()),
        (AttrValue::Vector(_) | AttrValue::Matrix(_), _) => {
            match (existing.as_slice(), value.as_slice()) {
                (Some(a), Some(b)) if a.len() == b.len() => Ok(AttrValue::from_flat(b.to_vec())),
                _ => Err(mismatch()),
            }
        }
        _ => Err(mismatch()),
    }
}

fn store(object: &mut SceneObject, address: &AttributeAddress, value: &AttrValue) -> Result<()> {
    let path = address.display_path();
    match address.slot {
        AttrSlot::Plain => match object.attributes.get_mut(&address.attribute_name) {
            Some(Attribute::Value(existing)) => {
                *existing = coerce(existing, value)?;
                Ok(())
            }
            Some(Attribute::Compound(children)) => match value.as_slice() {
                Some(values) if values.len() == children.len() => {
                    // Coerce every child before assigning any
                    let coerced = children
                        .iter()
                        .zip(values)
                        .map(|((_, child), x)| coerce(child, &AttrValue::Float(*x)))
                        .collect::<Result<Vec<_>>>()?;
                    for ((_, child), value) in children.iter_mut().zip(coerced) {
                        *child = value;
                    }
                    Ok(())
                }
                _ => Err(RigError::TypeMismatch {
                    expected: format!("{} numeric values", children.len()),
                    got: value.kind_name().to_string(),
                }),
            },
            Some(Attribute::Message) => Err(RigError::UnreadableAttributeKind(path)),
            Some(Attribute::Array(_)) => Err(RigError::InvalidAddress(format!(
                "{} is an array attribute and needs an element index",
                path
            ))),
            None => Err(RigError::AttributeNotFound(path)),
        },
        AttrSlot::Element(index) => match object.attributes.get_mut(&address.attribute_name) {
            Some(Attribute::Array(elements)) => {
                let stored = match elements.get(&index) {
                    Some(existing) => coerce(existing, value)?,
                    None => value.clone(),
                };
                elements.insert(index, stored);
                Ok(())
            }
            Some(_) => Err(RigError::InvalidAddress(format!(
                "{} is not an array attribute",
                path
            ))),
            None => Err(RigError::AttributeNotFound(path)),
        },
        AttrSlot::Child(ordinal) => {
            let child = object.attributes.values_mut().find_map(|attr| match attr {
                Attribute::Compound(children) => children
                    .get_mut(ordinal as usize)
                    .filter(|(name, _)| *name == address.attribute_name)
                    .map(|(_, child)| child),
                _ => None,
            });
            match child {
                Some(child) => {
                    *child = coerce(child, value)?;
                    Ok(())
                }
                None => Err(RigError::AttributeNotFound(path)),
            }
        }
    }
}

impl SceneAccessor for MemoryScene {
    fn exists(&self, long_name: &str) -> bool {
        self.contains(long_name)
    }

    fn read_attribute(&self, address: &AttributeAddress) -> Result<AttrValue> {
        self.reads.set(self.reads.get() + 1);
        self.read_resolved(address, 0)
    }

    fn write_attribute(&mut self, address: &AttributeAddress, value: &AttrValue) -> Result<()> {
        let key = self.locate(address, true)?;
        if self.connections.contains_key(&key) {
            return Err(RigError::ConnectionLocked(key.display_path()));
        }

        let object = self
            .objects
            .get_mut(&key.owner_long_name)
            .ok_or_else(|| RigError::ObjectNotFound(key.owner_long_name.clone()))?;
        store(object, &key, value)?;
        self.writes += 1;
        Ok(())
    }

    fn is_connected_from(
        &self,
        destination: &AttributeAddress,
        source: &AttributeAddress,
    ) -> Result<bool> {
        let destination = self.locate(destination, false)?;
        let source = self.locate(source, false)?;
        Ok(self.connections.get(&destination) == Some(&source))
    }

    fn connect(&mut self, source: &AttributeAddress, destination: &AttributeAddress) -> Result<()> {
        let source = self.locate(source, false)?;
        let destination = self.locate(destination, true)?;

        if source == destination || self.would_cycle(&source, &destination) {
            return Err(RigError::InvalidAddress(format!(
                "connecting {} to {} would create a cycle",
                source, destination
            )));
        }

        // A new array element takes the source's value when it comes into existence.
        if let AttrSlot::Element(index) = destination.slot {
            let initial = self.read_resolved(&source, 0).ok();
            if let Some(Attribute::Array(elements)) = self
                .objects
                .get_mut(&destination.owner_long_name)
                .and_then(|o| o.attributes.get_mut(&destination.attribute_name))
            {
                if let (false, Some(value)) = (elements.contains_key(&index), initial) {
                    elements.insert(index, value);
                }
            }
        }

        self.connections.insert(destination, source);
        Ok(())
    }

    fn resolve_indexed_address(
        &self,
        owner_long_name: &str,
        attribute_name: &str,
    ) -> Result<AttributeAddress> {
        let owner = self
            .resolve_name(owner_long_name)
            .ok_or_else(|| RigError::ObjectNotFound(owner_long_name.to_string()))?;
        let object = &self.objects[owner];
        let display = attribute_name.trim();

        if display.contains('[') {
            let address = AttributeAddress::parse_display(owner, display)?;
            return match object.get(&address.attribute_name) {
                Some(Attribute::Array(_)) => Ok(address),
                Some(_) => Err(RigError::InvalidAddress(format!(
                    "{} is not an array attribute",
                    address.display_path()
                ))),
                None => Err(RigError::AttributeNotFound(address.display_path())),
            };
        }

        if let Some((parent, child)) = display.split_once('.') {
            return match object.get(parent) {
                Some(Attribute::Compound(children)) => children
                    .iter()
                    .position(|(name, _)| name == child)
                    .map(|ordinal| AttributeAddress::child(owner, child, ordinal as u32))
                    .ok_or_else(|| RigError::AttributeNotFound(format!("{}.{}", owner, display))),
                Some(_) => Err(RigError::InvalidAddress(format!(
                    "{}.{} is not a compound attribute",
                    owner, parent
                ))),
                None => Err(RigError::AttributeNotFound(format!("{}.{}", owner, display))),
            };
        }

        if object.has(display) {
            return Ok(AttributeAddress::new(owner, display));
        }

        object
            .find_child(display)
            .map(|(_, ordinal)| AttributeAddress::child(owner, display, ordinal))
            .ok_or_else(|| RigError::AttributeNotFound(format!("{}.{}", owner, display)))
    }

    fn supports_batching(&self) -> bool {
        true
    }

    fn apply_batch(&mut self, batch: &EditBatch) -> Result<()> {
        let mut staged = MemoryScene {
            objects: self.objects.clone(),
            connections: self.connections.clone(),
            reads: Cell::new(0),
            writes: 0,
        };

        let total = batch.len();
        for (i, edit) in batch.edits().iter().enumerate() {
            let result = match edit {
                Edit::Connect {
                    source,
                    destination,
                } => staged.connect(source, destination),
                Edit::Write { address, value } => staged.write_attribute(address, value),
            };
            result.map_err(|e| {
                tracing::debug!(edit = i + 1, total, error = %e, "batch rejected");
                RigError::BatchRejected(format!("edit {} of {}: {}", i + 1, total, e))
            })?;
        }

        self.objects = staged.objects;
        self.connections = staged.connections;
        self.writes += staged.writes;
        tracing::debug!(edits = total, "batch applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig_scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene
            .spawn("|rig|ctrl_L")
            .unwrap()
            .set_value("rotateOrder", "zxy")
            .set_value("showCloth", true)
            .set_compound(
                "translate",
                vec![
                    ("translateX", AttrValue::Float(1.0)),
                    ("translateY", AttrValue::Float(2.0)),
                    ("translateZ", AttrValue::Float(3.0)),
                ],
            )
            .set_message("message");
        scene
            .spawn("|geo_hrc")
            .unwrap()
            .set_value("visibility", true);
        scene
            .spawn("|rig|skin")
            .unwrap()
            .set_element("weights", 0, 1.0)
            .set_element("weights", 3, 0.5);
        scene
    }

    #[test]
    fn test_short_name_lookup() {
        let mut scene = rig_scene();
        assert!(scene.exists("|rig|ctrl_L"));
        assert!(scene.exists("ctrl_L"));
        assert!(scene.exists("geo_hrc"));
        assert!(!scene.exists("ctrl_R"));

        // Ambiguous short names do not resolve
        scene.spawn("|other|ctrl_L").unwrap();
        assert!(!scene.exists("ctrl_L"));
        assert!(scene.exists("|other|ctrl_L"));
    }

    #[test]
    fn test_duplicate_spawn() {
        let mut scene = rig_scene();
        assert!(matches!(
            scene.spawn("|geo_hrc"),
            Err(RigError::DuplicateObject(_))
        ));
    }

    #[test]
    fn test_read_slots() {
        let scene = rig_scene();
        let value = scene
            .read_attribute(&AttributeAddress::new("ctrl_L", "rotateOrder"))
            .unwrap();
        assert_eq!(value, AttrValue::String("zxy".into()));

        let value = scene
            .read_attribute(&AttributeAddress::element("skin", "weights", 3))
            .unwrap();
        assert_eq!(value, AttrValue::Float(0.5));

        let value = scene
            .read_attribute(&AttributeAddress::child("ctrl_L", "translateY", 1))
            .unwrap();
        assert_eq!(value, AttrValue::Float(2.0));

        let value = scene
            .read_attribute(&AttributeAddress::new("ctrl_L", "translate"))
            .unwrap();
        assert_eq!(value, AttrValue::Vector(vec![1.0, 2.0, 3.0]));

        assert_eq!(scene.read_count(), 4);
    }

    #[test]
    fn test_read_errors() {
        let scene = rig_scene();
        assert!(matches!(
            scene.read_attribute(&AttributeAddress::new("ctrl_L", "message")),
            Err(RigError::UnreadableAttributeKind(_))
        ));
        assert!(matches!(
            scene.read_attribute(&AttributeAddress::new("skin", "weights")),
            Err(RigError::InvalidAddress(_))
        ));
        assert!(matches!(
            scene.read_attribute(&AttributeAddress::element("skin", "weights", 1)),
            Err(RigError::AttributeNotFound(_))
        ));
        // Wrong ordinal for the child name
        assert!(matches!(
            scene.read_attribute(&AttributeAddress::child("ctrl_L", "translateY", 0)),
            Err(RigError::AttributeNotFound(_))
        ));
        assert!(matches!(
            scene.read_attribute(&AttributeAddress::new("ctrl_R", "visibility")),
            Err(RigError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_write_coerces_and_checks_kind() {
        let mut scene = rig_scene();
        let order = AttributeAddress::new("ctrl_L", "rotateOrder");
        scene.write_attribute(&order, &"xyz".into()).unwrap();
        assert_eq!(scene.read_attribute(&order).unwrap(), AttrValue::from("xyz"));

        let vis = AttributeAddress::new("geo_hrc", "visibility");
        scene.write_attribute(&vis, &AttrValue::Int(0)).unwrap();
        assert_eq!(scene.read_attribute(&vis).unwrap(), AttrValue::Bool(false));

        assert!(matches!(
            scene.write_attribute(&vis, &"on".into()),
            Err(RigError::TypeMismatch { .. })
        ));
        assert_eq!(scene.write_count(), 2);
    }

    #[test]
    fn test_failed_compound_write_changes_nothing() {
        let mut scene = rig_scene();
        scene.object_mut("|rig|ctrl_L").unwrap().set_compound(
            "pivot",
            vec![
                ("pivotX", AttrValue::Float(1.0)),
                ("pivotLabel", AttrValue::from("root")),
            ],
        );
        let before = scene.object("|rig|ctrl_L").unwrap().get("pivot").cloned();

        let pivot = AttributeAddress::new("|rig|ctrl_L", "pivot");
        let result = scene.write_attribute(&pivot, &AttrValue::Vector(vec![5.0, 6.0]));
        assert!(matches!(result, Err(RigError::TypeMismatch { .. })));
        assert_eq!(scene.object("|rig|ctrl_L").unwrap().get("pivot").cloned(), before);
        assert_eq!(scene.write_count(), 0);
    }

    #[test]
    fn test_write_new_array_element() {
        let mut scene = rig_scene();
        let addr = AttributeAddress::element("skin", "weights", 7);
        scene.write_attribute(&addr, &AttrValue::Float(0.25)).unwrap();
        assert_eq!(scene.read_attribute(&addr).unwrap(), AttrValue::Float(0.25));
    }

    #[test]
    fn test_connection_drives_destination() {
        let mut scene = rig_scene();
        let src = AttributeAddress::new("|rig|ctrl_L", "showCloth");
        let dst = AttributeAddress::new("|geo_hrc", "visibility");

        assert!(!scene.is_connected_from(&dst, &src).unwrap());
        scene.connect(&src, &dst).unwrap();
        assert!(scene.is_connected_from(&dst, &src).unwrap());

        // Short names resolve to the same slots
        let short_src = AttributeAddress::new("ctrl_L", "showCloth");
        let short_dst = AttributeAddress::new("geo_hrc", "visibility");
        assert!(scene.is_connected_from(&short_dst, &short_src).unwrap());

        scene.write_attribute(&src, &false.into()).unwrap();
        assert_eq!(scene.read_attribute(&dst).unwrap(), AttrValue::Bool(false));

        assert!(matches!(
            scene.write_attribute(&dst, &true.into()),
            Err(RigError::ConnectionLocked(_))
        ));

        assert!(scene.disconnect(&dst).unwrap());
        assert!(!scene.is_connected_from(&dst, &src).unwrap());
    }

    #[test]
    fn test_connection_from_other_source_is_not_match() {
        let mut scene = rig_scene();
        scene
            .object_mut("ctrl_L")
            .unwrap()
            .set_value("hideCloth", false);
        let other = AttributeAddress::new("ctrl_L", "hideCloth");
        let src = AttributeAddress::new("ctrl_L", "showCloth");
        let dst = AttributeAddress::new("geo_hrc", "visibility");

        scene.connect(&other, &dst).unwrap();
        assert!(!scene.is_connected_from(&dst, &src).unwrap());
        scene.connect(&src, &dst).unwrap();
        assert!(scene.is_connected_from(&dst, &src).unwrap());
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut scene = rig_scene();
        let a = AttributeAddress::new("ctrl_L", "showCloth");
        let b = AttributeAddress::new("geo_hrc", "visibility");
        scene.connect(&a, &b).unwrap();
        assert!(scene.connect(&b, &a).is_err());
        assert!(scene.connect(&a, &a).is_err());
    }

    #[test]
    fn test_resolve_indexed_address() {
        let scene = rig_scene();

        let addr = scene.resolve_indexed_address("skin", "weights[3]").unwrap();
        assert_eq!(addr, AttributeAddress::element("|rig|skin", "weights", 3));

        let addr = scene.resolve_indexed_address("ctrl_L", "translateZ").unwrap();
        assert_eq!(addr, AttributeAddress::child("|rig|ctrl_L", "translateZ", 2));

        let addr = scene
            .resolve_indexed_address("ctrl_L", "translate.translateX")
            .unwrap();
        assert_eq!(addr, AttributeAddress::child("|rig|ctrl_L", "translateX", 0));

        let addr = scene.resolve_indexed_address("ctrl_L", "rotateOrder").unwrap();
        assert_eq!(addr, AttributeAddress::new("|rig|ctrl_L", "rotateOrder"));

        assert!(scene.resolve_indexed_address("ctrl_L", "rotateOrder[0]").is_err());
        assert!(scene.resolve_indexed_address("ctrl_L", "nothing").is_err());
        assert!(scene.resolve_indexed_address("ctrl_R", "visibility").is_err());
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut scene = rig_scene();
        let src = AttributeAddress::new("ctrl_L", "showCloth");
        let dst = AttributeAddress::new("geo_hrc", "visibility");

        let mut batch = EditBatch::new();
        batch.connect(src.clone(), dst.clone());
        batch.write(AttributeAddress::new("ctrl_L", "missingAttr"), true.into());

        assert!(matches!(
            scene.apply_batch(&batch),
            Err(RigError::BatchRejected(_))
        ));
        assert!(!scene.is_connected_from(&dst, &src).unwrap());

        let mut batch = EditBatch::new();
        batch.connect(src.clone(), dst.clone());
        batch.write(src.clone(), false.into());
        scene.apply_batch(&batch).unwrap();
        assert!(scene.is_connected_from(&dst, &src).unwrap());
        assert_eq!(scene.read_attribute(&dst).unwrap(), AttrValue::Bool(false));
    }

    #[test]
    fn test_despawn_drops_connections() {
        let mut scene = rig_scene();
        let src = AttributeAddress::new("ctrl_L", "showCloth");
        let dst = AttributeAddress::new("geo_hrc", "visibility");
        scene.connect(&src, &dst).unwrap();

        scene.despawn("ctrl_L").unwrap();
        assert!(!scene.exists("ctrl_L"));
        assert_eq!(scene.connections().count(), 0);
        assert!(scene.despawn("ctrl_L").is_err());
    }
}
