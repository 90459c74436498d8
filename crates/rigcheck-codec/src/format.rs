//! Document format definitions
//!
//! A document is a JSON object keyed by validator name. Record keys are
//! compressed; node records are flat and dispatch on the `t` discriminator.
//!
//! ```json
//! {
//!   "biped": {
//!     "n": "biped", "v": 1, "st": "failed",
//!     "nodes": [
//!       { "t": 10, "n": "ctrl_L", "ln": "|rig|ctrl_L", "st": "failed", "ch": [
//!         { "t": 30, "n": "rotateOrder", "ln": "|rig|ctrl_L.rotateOrder", "st": "failed",
//!           "a": { "o": "|rig|ctrl_L", "a": "rotateOrder" }, "ev": { "str": "xyz" } },
//!         { "t": 20, "n": "geo_hrc", "ln": "|geo_hrc", "st": "failed",
//!           "src": { "o": "|rig|ctrl_L", "a": "showCloth", "val": { "bool": true } },
//!           "dst": { "o": "|geo_hrc", "a": "visibility", "val": { "bool": true } } }
//!       ] }
//!     ]
//!   }
//! }
//! ```

use rigcheck_core::{AttrValue, Result, RigError, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A persisted document: validator name -> raw validator record.
///
/// Records stay as raw JSON until decoded so that one malformed record
/// cannot prevent its siblings from loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    records: BTreeMap<String, serde_json::Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record stored under its validator name
    pub fn insert(&mut self, record: &ValidatorRecord) -> Result<()> {
        self.records
            .insert(record.name.clone(), serde_json::to_value(record)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.records.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<serde_json::Value> {
        self.records.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fold another document in; its records win on name collisions
    pub fn extend(&mut self, other: Document) {
        self.records.extend(other.records);
    }

    /// Parse a document from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| RigError::SchemaError(format!("malformed document: {}", e)))?;
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                records: map.into_iter().collect(),
            }),
            other => Err(RigError::SchemaError(format!(
                "document must be an object keyed by validator name, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// One validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "ns", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "v", default = "default_version")]
    pub version: u32,
    #[serde(rename = "st", default)]
    pub status: Status,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// Any node. Which optional fields are present depends on `t`:
/// source nodes carry `ch`, default values `a` and `ev`,
/// connections `src` and `dst`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<u8>,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "ln", default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(rename = "st", default)]
    pub status: Status,
    #[serde(rename = "ch", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
    #[serde(rename = "a", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressRecord>,
    #[serde(rename = "ev", default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<AttrValue>,
    #[serde(rename = "src", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AddressRecord>,
    #[serde(rename = "dst", default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<AddressRecord>,
}

/// An attribute address in its flag-and-index form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "o")]
    pub owner: String,
    #[serde(rename = "a")]
    pub attribute: String,
    #[serde(rename = "ae", default, skip_serializing_if = "is_false")]
    pub array_element: bool,
    #[serde(rename = "cc", default, skip_serializing_if = "is_false")]
    pub compound_child: bool,
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(rename = "val", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AttrValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_record_without_discriminator_parses() {
        // Missing `t` is caught when decoding, not when parsing
        let record: NodeRecord = serde_json::from_str(r#"{"n": "ctrl_L"}"#).unwrap();
        assert_eq!(record.node_type, None);
        assert_eq!(record.status, Status::NotApplicable);
    }

    #[test]
    fn test_address_record_omits_defaults() {
        let record = AddressRecord {
            owner: "|geo_hrc".into(),
            attribute: "visibility".into(),
            array_element: false,
            compound_child: false,
            index: None,
            value: Some(AttrValue::Bool(true)),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"o":"|geo_hrc","a":"visibility","val":{"bool":true}}"#);
    }

    #[test]
    fn test_document_must_be_object() {
        assert!(matches!(
            Document::from_json_str("[1, 2]"),
            Err(RigError::SchemaError(_))
        ));
        assert!(matches!(
            Document::from_json_str("{ not json"),
            Err(RigError::SchemaError(_))
        ));
        assert!(Document::from_json_str("{}").unwrap().is_empty());
    }

    #[test]
    fn test_validator_record_defaults_version() {
        let record: ValidatorRecord = serde_json::from_str(r#"{"n": "biped"}"#).unwrap();
        assert_eq!(record.version, FORMAT_VERSION);
        assert!(record.nodes.is_empty());
        assert!(record.namespace.is_none());
    }
}
