//! Document decoding and loading

use crate::format::{AddressRecord, Document, NodeRecord, ValidatorRecord, FORMAT_VERSION};
use rigcheck_core::{AttributeAddress, Result, RigError};
use rigcheck_model::{
    ConnectionValidityNode, DefaultValueNode, NodeType, SourceNode, ValidityNode, Validator,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Decode every validator in a document, failing on the first bad record
pub fn decode(document: &Document) -> Result<BTreeMap<String, Validator>> {
    document
        .records()
        .map(|(name, record)| decode_record(name, record).map(|v| (name.to_string(), v)))
        .collect()
}

/// Decode each validator independently; a bad record only fails its own entry
pub fn decode_each(document: &Document) -> BTreeMap<String, Result<Validator>> {
    document
        .records()
        .map(|(name, record)| {
            let result = decode_record(name, record);
            if let Err(e) = &result {
                tracing::warn!(validator = %name, error = %e, "rejected validator record");
            }
            (name.to_string(), result)
        })
        .collect()
}

/// Decode the raw record stored under `name`
pub fn decode_record(name: &str, record: &serde_json::Value) -> Result<Validator> {
    let record: ValidatorRecord = serde_json::from_value(record.clone())
        .map_err(|e| RigError::SchemaError(format!("validator '{}': {}", name, e)))?;
    if record.name != name {
        return Err(RigError::SchemaError(format!(
            "validator stored under '{}' is named '{}'",
            name, record.name
        )));
    }
    from_record(&record).map_err(|e| in_context(e, &format!("validator '{}'", name)))
}

/// Rebuild a validator from its record form
pub fn from_record(record: &ValidatorRecord) -> Result<Validator> {
    if record.version != FORMAT_VERSION {
        return Err(RigError::SchemaError(format!(
            "unsupported format version {}",
            record.version
        )));
    }

    let mut validator = Validator::new(record.name.clone());
    validator.set_namespace(record.namespace.clone());

    for (i, node) in record.nodes.iter().enumerate() {
        let source = source_from_record(node).map_err(|e| in_context(e, &format!("node {}", i)))?;
        validator
            .add_source_node(source, false)
            .map_err(|e| match e {
                RigError::DuplicateNode(name) => {
                    RigError::SchemaError(format!("duplicate source node '{}'", name))
                }
                other => other,
            })?;
    }

    validator.status = record.status;
    Ok(validator)
}

fn source_from_record(record: &NodeRecord) -> Result<SourceNode> {
    expect_type(record, NodeType::Source)?;
    let (name, long_name) = names(record)?;

    let mut node = SourceNode::new(long_name);
    node.meta.name = name;
    node.meta.status = record.status;

    for (i, child) in record.children.iter().enumerate() {
        let child = child_from_record(child)
            .map_err(|e| in_context(e, &format!("{} child {}", node.long_name(), i)))?;
        match child {
            ValidityNode::DefaultValue(default) => {
                let attribute = default.address.display_attribute();
                if !node.add_default_value(default) {
                    tracing::warn!(
                        source = %node.long_name(),
                        attribute = %attribute,
                        "dropped default value declared on a connection source"
                    );
                }
            }
            ValidityNode::Connection(connection) => {
                let culled = node.add_connection(connection);
                if culled > 0 {
                    tracing::warn!(
                        source = %node.long_name(),
                        culled,
                        "dropped default values declared on a connection source"
                    );
                }
            }
        }
    }
    Ok(node)
}

fn child_from_record(record: &NodeRecord) -> Result<ValidityNode> {
    let node_type = node_type(record)?;
    let (name, long_name) = names(record)?;

    let mut child: ValidityNode = match node_type {
        NodeType::DefaultValue => {
            let address = address_from_record(required(&record.address, "a")?)?;
            let expected = required(&record.expected_value, "ev")?.clone();
            DefaultValueNode::new(address, expected).into()
        }
        NodeType::Connection => {
            let source = address_from_record(required(&record.source, "src")?)?;
            let destination = address_from_record(required(&record.destination, "dst")?)?;
            ConnectionValidityNode::new(source, destination).into()
        }
        NodeType::Source => {
            return Err(RigError::SchemaError(
                "source node record nested inside a source node".to_string(),
            ))
        }
    };

    let meta = child.meta_mut();
    meta.display_name = name.clone();
    meta.name = name;
    meta.long_name = long_name;
    meta.status = record.status;
    Ok(child)
}

fn address_from_record(record: &AddressRecord) -> Result<AttributeAddress> {
    let mut address = AttributeAddress::from_flags(
        record.owner.clone(),
        record.attribute.clone(),
        record.array_element,
        record.compound_child,
        record.index,
    )
    .map_err(|e| RigError::SchemaError(e.to_string()))?;
    address.value = record.value.clone();
    Ok(address)
}

fn node_type(record: &NodeRecord) -> Result<NodeType> {
    let code = record.node_type.ok_or_else(|| {
        RigError::SchemaError("node record is missing its type discriminator 't'".to_string())
    })?;
    NodeType::from_code(code)
        .ok_or_else(|| RigError::SchemaError(format!("unknown node type {}", code)))
}

fn expect_type(record: &NodeRecord, expected: NodeType) -> Result<()> {
    let found = node_type(record)?;
    if found != expected {
        return Err(RigError::SchemaError(format!(
            "expected node type {}, found {}",
            expected.code(),
            found.code()
        )));
    }
    Ok(())
}

fn names(record: &NodeRecord) -> Result<(String, String)> {
    let name = required(&record.name, "n")?;
    if name.is_empty() {
        return Err(RigError::SchemaError("node name is empty".to_string()));
    }
    let long_name = record.long_name.clone().unwrap_or_else(|| name.clone());
    Ok((name.clone(), long_name))
}

fn required<'a, T>(field: &'a Option<T>, key: &str) -> Result<&'a T> {
    field
        .as_ref()
        .ok_or_else(|| RigError::SchemaError(format!("missing field '{}'", key)))
}

fn in_context(err: RigError, context: &str) -> RigError {
    match err {
        RigError::SchemaError(msg) => RigError::SchemaError(format!("{}: {}", context, msg)),
        other => other,
    }
}

/// Load a document from a JSON file
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    Document::from_json_str(&content)
}

/// Load and decode every validator in a document file
pub fn load_validators<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, Validator>> {
    let document = load_document(path)?;
    decode(&document)
}

/// Decode every validator in a JSON string
pub fn load_validators_string(content: &str) -> Result<BTreeMap<String, Validator>> {
    let document = Document::from_json_str(content)?;
    decode(&document)
}
