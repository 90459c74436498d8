//! Print the validator tree stored in a document

use anyhow::{bail, Result};
use rigcheck_codec::load_validators;
use rigcheck_model::{SourceNode, ValidityNode, Validator};
use std::fmt::Write;

pub struct ShowArgs {
    pub document: String,
    pub validator: Option<String>,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let validators = load_validators(&args.document)?;

    if let Some(name) = &args.validator {
        match validators.get(name) {
            Some(validator) => print!("{}", render(validator)),
            None => bail!("validator '{}' not found in document", name),
        }
        return Ok(());
    }

    if validators.is_empty() {
        println!("No validators in {}", args.document);
    }
    for validator in validators.values() {
        print!("{}", render(validator));
    }
    Ok(())
}

/// Render one validator as an indented tree with statuses
pub fn render(validator: &Validator) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} [{}]", validator.name, validator.status);
    if let Some(namespace) = validator.namespace() {
        let _ = write!(out, " (namespace: {})", namespace);
    }
    out.push('\n');

    for node in validator {
        render_source(&mut out, node);
    }
    out
}

fn render_source(out: &mut String, node: &SourceNode) {
    let _ = writeln!(out, "  {} [{}]", node.meta.display_name, node.status());
    for child in node.children() {
        let _ = match child {
            ValidityNode::DefaultValue(default) => writeln!(
                out,
                "    default {} = {} [{}]",
                default.meta.display_name, default.expected_value, default.meta.status
            ),
            ValidityNode::Connection(connection) => writeln!(
                out,
                "    connection {} -> {} [{}]",
                connection.source, connection.destination, connection.meta.status
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigcheck_core::{AttributeAddress, Status};
    use rigcheck_model::{ConnectionValidityNode, DefaultValueNode};

    #[test]
    fn test_render_tree() {
        let mut node = SourceNode::new("ctrl_L");
        node.add_default_value(DefaultValueNode::new(
            AttributeAddress::new("ctrl_L", "rotateOrder"),
            "xyz",
        ));
        node.add_connection(ConnectionValidityNode::new(
            AttributeAddress::new("ctrl_L", "showCloth"),
            AttributeAddress::new("geo_hrc", "visibility"),
        ));
        let mut validator = Validator::new("biped");
        validator.add_source_node(node, false).unwrap();
        validator.status = Status::Failed;

        let text = render(&validator);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "biped [failed]");
        assert!(lines[1].starts_with("  ctrl_L ["));
        assert!(lines[2].starts_with("    default rotateOrder = "));
        assert!(lines[3].contains("ctrl_L.showCloth -> geo_hrc.visibility"));
    }
}
