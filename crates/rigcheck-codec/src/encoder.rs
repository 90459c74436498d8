//! Validator encoding and document saving

use crate::format::{AddressRecord, Document, NodeRecord, ValidatorRecord, FORMAT_VERSION};
use rigcheck_core::{AttributeAddress, Result};
use rigcheck_model::{NodeType, SourceNode, ValidityNode, Validator};
use std::io::Write;
use std::path::Path;

/// Encode one validator into a single-entry document
pub fn encode(validator: &Validator) -> Result<Document> {
    encode_all([validator])
}

/// Encode several validators into one document
pub fn encode_all<'a, I>(validators: I) -> Result<Document>
where
    I: IntoIterator<Item = &'a Validator>,
{
    let mut document = Document::new();
    for validator in validators {
        document.insert(&to_record(validator))?;
    }
    Ok(document)
}

/// Convert a validator to its record form
pub fn to_record(validator: &Validator) -> ValidatorRecord {
    ValidatorRecord {
        name: validator.name.clone(),
        namespace: validator.namespace().map(str::to_string),
        version: FORMAT_VERSION,
        status: validator.status,
        nodes: validator.iter_source_nodes().map(source_to_record).collect(),
    }
}

fn source_to_record(node: &SourceNode) -> NodeRecord {
    NodeRecord {
        node_type: Some(NodeType::Source.code()),
        name: Some(node.meta.name.clone()),
        long_name: Some(node.meta.long_name.clone()),
        status: node.meta.status,
        children: node.children().iter().map(child_to_record).collect(),
        ..NodeRecord::default()
    }
}

fn child_to_record(child: &ValidityNode) -> NodeRecord {
    let meta = child.meta();
    let mut record = NodeRecord {
        node_type: Some(child.node_type().code()),
        name: Some(meta.name.clone()),
        long_name: Some(meta.long_name.clone()),
        status: meta.status,
        ..NodeRecord::default()
    };

    match child {
        ValidityNode::DefaultValue(node) => {
            record.address = Some(address_to_record(&node.address));
            record.expected_value = Some(node.expected_value.clone());
        }
        ValidityNode::Connection(node) => {
            record.source = Some(address_to_record(&node.source));
            record.destination = Some(address_to_record(&node.destination));
        }
    }
    record
}

fn address_to_record(address: &AttributeAddress) -> AddressRecord {
    AddressRecord {
        owner: address.owner_long_name.clone(),
        attribute: address.attribute_name.clone(),
        array_element: address.is_array_element(),
        compound_child: address.is_compound_child(),
        index: address.index().map(i64::from),
        value: address.value.clone(),
    }
}

/// Save a document, replacing the file as a whole.
///
/// The document is written to a temporary file next to `path` and then
/// renamed over it, so a failed save leaves any previous file untouched.
pub fn save_document<P: AsRef<Path>>(path: P, document: &Document) -> Result<()> {
    let path = path.as_ref();
    let content = document.to_json_string()?;
    write_atomic(path, content.as_bytes())?;
    tracing::debug!(path = %path.display(), validators = document.len(), "saved document");
    Ok(())
}

/// Encode validators and save them as one document
pub fn save_validators<'a, P, I>(path: P, validators: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Validator>,
{
    let document = encode_all(validators)?;
    save_document(path, &document)
}

/// Encode validators to a JSON string
pub fn save_validators_string<'a, I>(validators: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Validator>,
{
    encode_all(validators)?.to_json_string()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigcheck_core::{AttrValue, Status};
    use rigcheck_model::{ConnectionValidityNode, DefaultValueNode};
    use serde_json::json;

    fn ctrl_l() -> SourceNode {
        let mut node = SourceNode::new("ctrl_L");
        node.add_default_value(DefaultValueNode::new(
            AttributeAddress::new("ctrl_L", "rotateOrder"),
            "xyz",
        ));
        node.add_connection(ConnectionValidityNode::new(
            AttributeAddress::new("ctrl_L", "showCloth").with_value(true),
            AttributeAddress::new("geo_hrc", "visibility").with_value(true),
        ));
        node
    }

    #[test]
    fn test_source_record_discriminators() {
        let mut validator = Validator::new("biped");
        validator.add_source_node(ctrl_l(), false).unwrap();

        let document = encode(&validator).unwrap();
        let record = document.get("biped").unwrap();
        let source = &record["nodes"][0];

        assert_eq!(source["t"], json!(10));
        let children = source["ch"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["t"], json!(30));
        assert_eq!(children[1]["t"], json!(20));
    }

    #[test]
    fn test_record_fields() {
        let mut validator = Validator::new("biped").with_namespace("char");
        validator.add_source_node(ctrl_l(), false).unwrap();
        validator.status = Status::Failed;

        let record = to_record(&validator);
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.namespace.as_deref(), Some("char"));
        assert_eq!(record.status, Status::Failed);

        let default = &record.nodes[0].children[0];
        assert_eq!(default.name.as_deref(), Some("rotateOrder"));
        assert_eq!(default.expected_value, Some(AttrValue::from("xyz")));
        assert!(default.source.is_none());

        let connection = &record.nodes[0].children[1];
        assert_eq!(connection.long_name.as_deref(), Some("geo_hrc"));
        assert_eq!(
            connection.source.as_ref().unwrap().value,
            Some(AttrValue::Bool(true))
        );
    }

    #[test]
    fn test_indexed_address_record() {
        let record = address_to_record(&AttributeAddress::element("skin", "weights", 4));
        assert!(record.array_element);
        assert!(!record.compound_child);
        assert_eq!(record.index, Some(4));

        let record = address_to_record(&AttributeAddress::child("ctrl", "translateY", 1));
        assert!(record.compound_child);
        assert_eq!(record.index, Some(1));
    }

    #[test]
    fn test_encode_all_keys_by_name() {
        let a = Validator::new("arms");
        let b = Validator::new("legs");
        let document = encode_all([&a, &b]).unwrap();
        assert_eq!(document.names().collect::<Vec<_>>(), vec!["arms", "legs"]);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.json");

        let validator = Validator::new("biped");
        save_validators(&path, [&validator]).unwrap();
        save_validators(&path, [&validator]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"biped\""));
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rig.json");
        assert!(save_validators(&path, [&Validator::new("biped")]).is_err());
        assert!(!path.exists());
    }
}
