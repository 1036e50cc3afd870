//! Plain-text rendering of lineage views.
//!
//! Every function returns lines rather than printing, so the layout can be
//! checked without a terminal.

use prochist_core::{Fields, LineageNode, NodePath, ParentSummary};
use serde_json::Value;
use textwrap::Options;

const PARENT_INDENT: &str = "    ";

/// Strings print bare; everything else prints as compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One `key: value` row per field, wrapped to `width` with continuation
/// lines indented past the key.
pub fn field_rows(fields: &Fields, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in fields {
        let row = format!("{key}: {}", format_value(value));
        let indent = " ".repeat(key.chars().count() + 2);
        let options = Options::new(width.max(1)).subsequent_indent(&indent);
        lines.extend(textwrap::wrap(&row, options).into_iter().map(|l| l.into_owned()));
    }
    lines
}

/// Short descriptor of a node: its file name and timestamp.
pub fn describe(node: &LineageNode) -> String {
    if node.is_empty() {
        return "(no history)".to_string();
    }
    let mut label = node.filename().unwrap_or("(unnamed)").to_string();
    if let Some(timestamp) = node.timestamp() {
        label.push_str(" @ ");
        label.push_str(timestamp);
    }
    label
}

/// The node's descriptor followed by its direct parents, one per line.
pub fn parent_rows(node: &LineageNode, parents: &[ParentSummary]) -> Vec<String> {
    let mut lines = vec![describe(node)];
    if parents.is_empty() {
        lines.push(format!("{PARENT_INDENT}No parents"));
    }
    lines.extend(parents.iter().map(|p| format!("{PARENT_INDENT}{p}")));
    lines
}

/// The whole lineage as an ASCII tree, one line per node with its path.
pub fn lineage_tree(root: &LineageNode) -> Vec<String> {
    let mut lines = Vec::new();
    tree_node(root, &NodePath::root(), "", true, &mut lines);
    lines
}

fn tree_node(
    node: &LineageNode,
    path: &NodePath,
    prefix: &str,
    is_last: bool,
    lines: &mut Vec<String>,
) {
    let connector = if path.is_root() {
        ""
    } else if is_last {
        "└─ "
    } else {
        "├─ "
    };
    lines.push(format!("{prefix}{connector}[{path}] {}", describe(node)));

    let child_prefix = if path.is_root() {
        String::new()
    } else if is_last {
        format!("{prefix}   ")
    } else {
        format!("{prefix}│  ")
    };

    for (index, parent) in node.parents.iter().enumerate() {
        let is_last_parent = index + 1 == node.parents.len();
        tree_node(parent, &path.child(index), &child_prefix, is_last_parent, lines);
    }
}
