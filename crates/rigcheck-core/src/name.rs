//! Object path helpers
//!
//! Long names are `|`-separated DAG paths; each segment may carry
//! `:`-separated namespaces (`|rig|ns:ctrl_L`).

/// Leaf segment of a long name, namespaces kept
pub fn short_name(long_name: &str) -> &str {
    long_name.rsplit('|').next().unwrap_or(long_name)
}

/// Name with every namespace prefix removed
pub fn strip_namespace(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Namespace of a name, if any (`ns:sub:obj` gives `ns:sub`)
pub fn namespace_of(name: &str) -> Option<&str> {
    name.rfind(':').map(|i| &name[..i])
}

/// Human-facing name for a node.
///
/// Uses the leaf of the long name and drops `namespace` when the leaf
/// lives in exactly that namespace.
pub fn display_name(long_name: &str, namespace: Option<&str>) -> String {
    let leaf = short_name(long_name);
    match (namespace, namespace_of(leaf)) {
        (Some(ns), Some(leaf_ns)) if ns.trim_end_matches(':') == leaf_ns => {
            strip_namespace(leaf).to_string()
        }
        _ => leaf.to_string(),
    }
}
