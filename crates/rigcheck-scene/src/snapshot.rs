//! Scene snapshots - TOML files describing a `MemoryScene`
//!
//! ```toml
//! [scene]
//! name = "biped"
//!
//! [objects."|rig|ctrl_L"]
//! rotateOrder = "zxy"
//! showCloth = true
//! message = { kind = "message" }
//! translate = { children = [{ name = "translateX", value = 0.0 }] }
//!
//! [objects."|rig|skin"]
//! weights = { elements = { "0" = 1.0, "3" = 0.5 } }
//!
//! [[connection]]
//! source = "|rig|ctrl_L.showCloth"
//! destination = "|geo_hrc.visibility"
//! ```

use crate::accessor::SceneAccessor;
use crate::memory::{Attribute, MemoryScene, SceneObject};
use rigcheck_core::{split_plug_path, AttrValue, Result, RigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Root structure of a scene snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: SceneMetadata,
    #[serde(default)]
    pub objects: BTreeMap<String, BTreeMap<String, toml::Value>>,
    #[serde(default, rename = "connection", skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One connection, both ends given as plug paths (`object.attribute`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub source: String,
    pub destination: String,
}

impl SceneFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scene: SceneMetadata {
                name: name.into(),
                description: None,
            },
            objects: BTreeMap::new(),
            connections: Vec::new(),
        }
    }
}

/// Load a scene from a TOML snapshot file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<(MemoryScene, SceneFile)> {
    let content = fs::read_to_string(path)?;
    load_scene_string(&content)
}

/// Load a scene from a TOML string
pub fn load_scene_string(content: &str) -> Result<(MemoryScene, SceneFile)> {
    let scene_file: SceneFile = toml::from_str(content)?;
    let mut scene = MemoryScene::new();

    // First pass: objects and their attributes
    for (name, attributes) in &scene_file.objects {
        let object = scene.spawn(name.clone())?;
        for (attr_name, def) in attributes {
            let attribute = attribute_from_toml(def)
                .map_err(|e| RigError::SchemaError(format!("{}.{}: {}", name, attr_name, e)))?;
            object.set(attr_name.clone(), attribute);
        }
    }

    // Second pass: connections, once every endpoint exists
    for def in &scene_file.connections {
        let source = resolve_plug(&scene, &def.source)?;
        let destination = resolve_plug(&scene, &def.destination)?;
        scene.connect(&source, &destination)?;
    }

    tracing::debug!(
        objects = scene.object_count(),
        connections = scene_file.connections.len(),
        "loaded scene '{}'",
        scene_file.scene.name
    );

    Ok((scene, scene_file))
}

/// Save a scene to a TOML snapshot file
pub fn save_scene<P: AsRef<Path>>(
    path: P,
    scene: &MemoryScene,
    name: impl Into<String>,
) -> Result<()> {
    let content = save_scene_string(scene, name)?;
    fs::write(path, content)?;
    Ok(())
}

/// Save a scene to a TOML string
pub fn save_scene_string(scene: &MemoryScene, name: impl Into<String>) -> Result<String> {
    let scene_file = scene_to_file(scene, name);
    let content = toml::to_string_pretty(&scene_file)?;
    Ok(content)
}

/// Convert a MemoryScene to a SceneFile
pub fn scene_to_file(scene: &MemoryScene, name: impl Into<String>) -> SceneFile {
    let mut file = SceneFile::new(name);

    for (object_name, object) in scene.objects() {
        file.objects
            .insert(object_name.to_string(), object_to_toml(object));
    }

    let mut connections: Vec<ConnectionDef> = scene
        .connections()
        .map(|(source, destination)| ConnectionDef {
            source: source.display_path(),
            destination: destination.display_path(),
        })
        .collect();
    connections.sort_by(|a, b| a.destination.cmp(&b.destination));
    file.connections = connections;

    file
}

fn resolve_plug(scene: &MemoryScene, path: &str) -> Result<rigcheck_core::AttributeAddress> {
    let (object, attribute) = split_plug_path(path)?;
    scene.resolve_indexed_address(object, attribute)
}

fn attribute_from_toml(value: &toml::Value) -> Result<Attribute> {
    let table = match value {
        toml::Value::Table(table) => table,
        other => return Ok(Attribute::Value(AttrValue::from_toml(other)?)),
    };

    if let Some(kind) = table.get("kind") {
        return match kind.as_str() {
            Some("message") => Ok(Attribute::Message),
            _ => Err(RigError::SchemaError(format!("unknown attribute kind {}", kind))),
        };
    }

    if let Some(elements) = table.get("elements") {
        let elements = elements
            .as_table()
            .ok_or_else(|| RigError::SchemaError("'elements' must be a table".to_string()))?;
        let mut array = BTreeMap::new();
        for (index, value) in elements {
            let index: u32 = index
                .parse()
                .map_err(|_| RigError::SchemaError(format!("bad element index '{}'", index)))?;
            array.insert(index, AttrValue::from_toml(value)?);
        }
        return Ok(Attribute::Array(array));
    }

    if let Some(children) = table.get("children") {
        let children = children
            .as_array()
            .ok_or_else(|| RigError::SchemaError("'children' must be an array".to_string()))?;
        let mut parsed = Vec::with_capacity(children.len());
        for child in children {
            let name = child
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| RigError::SchemaError("compound child needs a name".to_string()))?;
            let value = child
                .get("value")
                .ok_or_else(|| RigError::SchemaError(format!("child '{}' has no value", name)))?;
            parsed.push((name.to_string(), AttrValue::from_toml(value)?));
        }
        return Ok(Attribute::Compound(parsed));
    }

    Err(RigError::SchemaError(
        "attribute table needs 'kind', 'elements' or 'children'".to_string(),
    ))
}

fn object_to_toml(object: &SceneObject) -> BTreeMap<String, toml::Value> {
    object
        .attributes()
        .map(|(name, attribute)| (name.to_string(), attribute_to_toml(attribute)))
        .collect()
}

fn attribute_to_toml(attribute: &Attribute) -> toml::Value {
    let mut table = toml::Table::new();
    match attribute {
        Attribute::Value(value) => return value.to_toml(),
        Attribute::Message => {
            table.insert("kind".into(), toml::Value::String("message".into()));
        }
        Attribute::Array(elements) => {
            let elements = elements
                .iter()
                .map(|(i, v)| (i.to_string(), v.to_toml()))
                .collect();
            table.insert("elements".into(), toml::Value::Table(elements));
        }
        Attribute::Compound(children) => {
            let children = children
                .iter()
                .map(|(name, value)| {
                    let mut child = toml::Table::new();
                    child.insert("name".into(), toml::Value::String(name.clone()));
                    child.insert("value".into(), value.to_toml());
                    toml::Value::Table(child)
                })
                .collect();
            table.insert("children".into(), toml::Value::Array(children));
        }
    }
    toml::Value::Table(table)
}
