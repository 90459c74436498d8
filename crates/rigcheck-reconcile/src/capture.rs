//! Build validity nodes from the live state of a scene

use rigcheck_core::{split_plug_path, AttributeAddress, Result, RigError};
use rigcheck_model::{ConnectionValidityNode, DefaultValueNode, SourceNode};
use rigcheck_scene::SceneAccessor;

/// Snapshot the current value of `owner.attribute` as an expected default.
///
/// `attribute` may be any display form the accessor resolves (`weights[2]`,
/// `translateX`). The node keeps `owner` as given so it matches the long
/// name of the source node it is added to.
pub fn capture_default_value<S: SceneAccessor + ?Sized>(
    scene: &S,
    owner: &str,
    attribute: &str,
) -> Result<DefaultValueNode> {
    let mut address = scene.resolve_indexed_address(owner, attribute)?;
    address.owner_long_name = owner.to_string();
    let value = scene.read_attribute(&address)?;
    Ok(DefaultValueNode::new(address, value))
}

/// Snapshot a connection from `source_owner.source_attribute` to a
/// destination plug path (`|grp|obj.attr[2]`).
///
/// Both sides keep their current values; a relationship-only attribute has
/// no value to keep.
pub fn capture_connection<S: SceneAccessor + ?Sized>(
    scene: &S,
    source_owner: &str,
    source_attribute: &str,
    destination_plug: &str,
) -> Result<ConnectionValidityNode> {
    let mut source = scene.resolve_indexed_address(source_owner, source_attribute)?;
    source.owner_long_name = source_owner.to_string();

    let (object, attribute) = split_plug_path(destination_plug)?;
    if !scene.exists(object) {
        return Err(RigError::ObjectNotFound(object.to_string()));
    }
    let destination = scene.resolve_indexed_address(object, attribute)?;

    let source = snapshot(scene, source)?;
    let destination = snapshot(scene, destination)?;
    Ok(ConnectionValidityNode::new(source, destination))
}

fn snapshot<S: SceneAccessor + ?Sized>(
    scene: &S,
    address: AttributeAddress,
) -> Result<AttributeAddress> {
    match scene.read_attribute(&address) {
        Ok(value) => Ok(address.with_value(value)),
        Err(RigError::UnreadableAttributeKind(_)) => Ok(address),
        Err(e) => Err(e),
    }
}

/// Capture a whole source node: one default per attribute, one connection
/// per `(source attribute, destination plug)` pair.
///
/// Connections are added last, so an attribute listed in both places ends
/// up as a connection source only.
pub fn capture_source_node<S: SceneAccessor + ?Sized>(
    scene: &S,
    long_name: &str,
    attributes: &[&str],
    connections: &[(&str, &str)],
) -> Result<SourceNode> {
    if !scene.exists(long_name) {
        return Err(RigError::ObjectNotFound(long_name.to_string()));
    }

    let mut node = SourceNode::new(long_name);
    for attribute in attributes {
        node.add_default_value(capture_default_value(scene, long_name, attribute)?);
    }
    for (source_attribute, destination_plug) in connections {
        let culled = node.add_connection(capture_connection(
            scene,
            long_name,
            source_attribute,
            destination_plug,
        )?);
        if culled > 0 {
            tracing::debug!(
                source = %long_name,
                attribute = %source_attribute,
                "connection replaces captured default"
            );
        }
    }

    tracing::debug!(
        source = %long_name,
        children = node.children().len(),
        "captured source node"
    );
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigcheck_core::{AttrSlot, AttrValue};
    use rigcheck_scene::MemoryScene;

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene
            .spawn("|rig|ctrl_L")
            .unwrap()
            .set_value("rotateOrder", "xyz")
            .set_value("showCloth", true)
            .set_message("message")
            .set_element("weights", 2, 0.25);
        scene.spawn("|geo|geo_hrc").unwrap().set_value("visibility", false);
        scene
    }

    #[test]
    fn test_capture_default_value() {
        let scene = scene();
        let node = capture_default_value(&scene, "|rig|ctrl_L", "rotateOrder").unwrap();
        assert_eq!(node.address.owner_long_name, "|rig|ctrl_L");
        assert_eq!(node.expected_value, AttrValue::from("xyz"));
    }

    #[test]
    fn test_capture_array_element() {
        let scene = scene();
        let node = capture_default_value(&scene, "|rig|ctrl_L", "weights[2]").unwrap();
        assert_eq!(node.address.slot, AttrSlot::Element(2));
        assert_eq!(node.expected_value, AttrValue::Float(0.25));
        assert_eq!(node.meta.name, "weights[2]");
    }

    #[test]
    fn test_capture_missing_attribute_fails() {
        let scene = scene();
        assert!(capture_default_value(&scene, "|rig|ctrl_L", "noSuchAttr").is_err());
    }

    #[test]
    fn test_capture_connection_snapshots_both_sides() {
        let scene = scene();
        let node =
            capture_connection(&scene, "|rig|ctrl_L", "showCloth", "|geo|geo_hrc.visibility")
                .unwrap();
        assert_eq!(node.source.value, Some(AttrValue::Bool(true)));
        assert_eq!(node.destination.value, Some(AttrValue::Bool(false)));
        assert_eq!(node.destination_long_name(), "|geo|geo_hrc");
    }

    #[test]
    fn test_capture_message_connection_has_no_value() {
        let mut scene = scene();
        scene.object_mut("|geo|geo_hrc").unwrap().set_message("rigRoot");
        let node =
            capture_connection(&scene, "|rig|ctrl_L", "message", "|geo|geo_hrc.rigRoot").unwrap();
        assert_eq!(node.source.value, None);
        assert_eq!(node.destination.value, None);
    }

    #[test]
    fn test_capture_connection_missing_destination() {
        let scene = scene();
        let result = capture_connection(&scene, "|rig|ctrl_L", "showCloth", "|geo|nope.visibility");
        assert!(matches!(result, Err(RigError::ObjectNotFound(_))));
    }

    #[test]
    fn test_capture_source_node_connection_wins() {
        let scene = scene();
        let node = capture_source_node(
            &scene,
            "|rig|ctrl_L",
            &["rotateOrder", "showCloth"],
            &[("showCloth", "|geo|geo_hrc.visibility")],
        )
        .unwrap();

        assert_eq!(node.default_values().count(), 1);
        assert_eq!(node.connections().count(), 1);
        assert!(node.is_connection_source("showCloth"));
    }

    #[test]
    fn test_capture_source_node_missing_object() {
        let scene = scene();
        let result = capture_source_node(&scene, "|rig|ctrl_R", &["rotateOrder"], &[]);
        assert!(matches!(result, Err(RigError::ObjectNotFound(_))));
    }

    #[test]
    fn test_captured_validator_survives_save_and_validates() {
        use crate::evaluator::ValidityEvaluator;
        use rigcheck_core::Status;
        use rigcheck_model::Validator;

        let mut scene = scene();
        scene
            .object_mut("|geo|geo_hrc")
            .unwrap()
            .set_value("visibility", true);
        let node = capture_source_node(
            &scene,
            "|rig|ctrl_L",
            &["rotateOrder", "weights[2]"],
            &[("showCloth", "|geo|geo_hrc.visibility")],
        )
        .unwrap();
        let mut validator = Validator::new("biped");
        validator.add_source_node(node, false).unwrap();

        let json = rigcheck_codec::save_validators_string([&validator]).unwrap();
        let mut loaded = rigcheck_codec::load_validators_string(&json)
            .unwrap()
            .remove("biped")
            .unwrap();

        // captured connections are not yet live
        let report = ValidityEvaluator::new(&scene).validate(&mut loaded);
        assert_eq!(report.status, Status::Failed);

        scene
            .connect(
                &AttributeAddress::new("|rig|ctrl_L", "showCloth"),
                &AttributeAddress::new("|geo|geo_hrc", "visibility"),
            )
            .unwrap();
        let report = ValidityEvaluator::new(&scene).validate(&mut loaded);
        assert!(report.is_valid(), "{}", report.summary());
    }
}
