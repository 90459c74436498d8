//! CLI command implementations

pub mod capture;
pub mod repair;
pub mod show;
pub mod validate;

use anyhow::{bail, Result};
use rigcheck_model::Validator;
use std::collections::BTreeMap;

/// The validators a command works on: one by name, or all of them
pub(crate) fn select<'a>(
    validators: &'a mut BTreeMap<String, Validator>,
    name: Option<&str>,
) -> Result<Vec<&'a mut Validator>> {
    match name {
        Some(name) => match validators.get_mut(name) {
            Some(validator) => Ok(vec![validator]),
            None => bail!("validator '{}' not found in document", name),
        },
        None => Ok(validators.values_mut().collect()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const SCENE: &str = r#"
[scene]
name = "biped"

[objects.ctrl_L]
rotateOrder = "zxy"
showCloth = true

[objects.geo_hrc]
visibility = true
"#;

    pub const DOCUMENT: &str = r#"{
  "biped": {
    "n": "biped",
    "v": 1,
    "st": "not_applicable",
    "nodes": [
      {
        "t": 10,
        "n": "ctrl_L",
        "ln": "ctrl_L",
        "st": "not_applicable",
        "ch": [
          {
            "t": 30,
            "n": "rotateOrder",
            "ln": "ctrl_L.rotateOrder",
            "st": "not_applicable",
            "a": { "o": "ctrl_L", "a": "rotateOrder" },
            "ev": { "str": "xyz" }
          }
        ]
      }
    ]
  }
}"#;

    pub fn fixture(dir: &tempfile::TempDir) -> (String, String) {
        let document = dir.path().join("rig.json");
        let scene = dir.path().join("scene.toml");
        std::fs::write(&document, DOCUMENT).unwrap();
        std::fs::write(&scene, SCENE).unwrap();
        (
            document.to_string_lossy().into_owned(),
            scene.to_string_lossy().into_owned(),
        )
    }
}
