//! Capture live scene state into a validator

use anyhow::{anyhow, Result};
use rigcheck_codec::{load_validators, save_validators};
use rigcheck_model::Validator;
use rigcheck_reconcile::capture_source_node;
use rigcheck_scene::load_scene;
use std::path::Path;

pub struct CaptureArgs {
    pub document: String,
    pub scene: String,
    pub source: String,
    pub attrs: Vec<String>,
    /// `SRC_ATTR=DEST_PLUG` pairs
    pub connect: Vec<String>,
    pub validator: Option<String>,
    pub force: bool,
}

pub fn run(args: CaptureArgs) -> Result<()> {
    let (validator, replaced) = capture(&args)?;
    let action = if replaced { "Replaced" } else { "Captured" };
    println!("{} {} in validator '{}'", action, args.source, validator);
    println!("Saved to {}", args.document);
    Ok(())
}

/// Capture one source node and save it into the document.
///
/// The document is created when missing. Returns the validator name and
/// whether an existing source node was replaced.
pub fn capture(args: &CaptureArgs) -> Result<(String, bool)> {
    let (scene, scene_file) = load_scene(&args.scene)?;
    let name = args
        .validator
        .clone()
        .unwrap_or_else(|| scene_file.scene.name.clone());

    let connections = args
        .connect
        .iter()
        .map(|pair| parse_connection(pair))
        .collect::<Result<Vec<_>>>()?;
    let attributes: Vec<&str> = args.attrs.iter().map(String::as_str).collect();

    let node = capture_source_node(&scene, &args.source, &attributes, &connections)?;

    let mut validators = if Path::new(&args.document).exists() {
        load_validators(&args.document)?
    } else {
        Default::default()
    };
    let validator = validators
        .entry(name.clone())
        .or_insert_with(|| Validator::new(name.clone()));
    let replaced = validator
        .find_source_node_by_long_name(node.long_name())
        .is_some();
    validator.add_source_node(node, args.force)?;

    save_validators(&args.document, validators.values())?;
    tracing::info!(
        document = %args.document,
        validator = %name,
        source = %args.source,
        "captured source node"
    );
    Ok((name, replaced))
}

/// Split `SRC_ATTR=DEST_PLUG`
fn parse_connection(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .map(|(src, dst)| (src.trim(), dst.trim()))
        .filter(|(src, dst)| !src.is_empty() && !dst.is_empty())
        .ok_or_else(|| anyhow!("expected SRC_ATTR=DEST_PLUG, got '{}'", pair))
}
