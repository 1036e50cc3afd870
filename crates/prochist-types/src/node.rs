//! The lineage node: one recorded processing-history entry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keys;
use crate::path::NodePath;

/// Ordered mapping of field name → JSON value.
///
/// Insertion order is kept for stable display only; it carries no meaning.
pub type Fields = IndexMap<String, Value>;

/// One processing-history entry.
///
/// Parents are owned deep copies, never references to the live parent file's
/// record: the parent may be rewritten after this node was made.
///
/// The default value is the *empty node* (no fields, no parents), which stands
/// in for any ancestor whose history is missing or unreadable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    /// Automatic and caller-supplied fields, merged.
    #[serde(default)]
    pub fields: Fields,
    /// Direct parents, in the order the inputs were supplied.
    #[serde(default)]
    pub parents: Vec<LineageNode>,
}

impl LineageNode {
    pub fn new(fields: Fields, parents: Vec<LineageNode>) -> Self {
        Self { fields, parents }
    }

    /// The empty node.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty node (no fields and no parents).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.parents.is_empty()
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The recorded file name of this node, if any.
    pub fn filename(&self) -> Option<&str> {
        self.get(keys::FILENAME).and_then(Value::as_str)
    }

    /// The recorded write timestamp of this node, if any.
    pub fn timestamp(&self) -> Option<&str> {
        self.get(keys::TIMESTAMP).and_then(Value::as_str)
    }

    /// Number of ancestor levels below this node (0 for a node without parents).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.parents.iter().map(|p| (depth + 1, p)));
        }
        deepest
    }

    /// Total number of nodes in this tree, including `self`.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Drop every ancestor deeper than `max_depth` levels below this node.
    ///
    /// Returns `true` if anything was removed.
    pub fn truncate(&mut self, max_depth: usize) -> bool {
        if max_depth == 0 {
            let pruned = !self.parents.is_empty();
            self.parents.clear();
            return pruned;
        }
        let mut pruned = false;
        for parent in &mut self.parents {
            pruned |= parent.truncate(max_depth - 1);
        }
        pruned
    }

    /// Pre-order walk over this node and all its ancestors, with the path of
    /// each node relative to `self`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(NodePath::root(), self)],
        }
    }
}

/// Levels of array/object nesting in `value` (0 for a scalar).
pub fn value_nesting(value: &Value) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(0usize, value)];
    while let Some((depth, value)) = stack.pop() {
        match value {
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                stack.extend(items.iter().map(|v| (depth + 1, v)));
            }
            Value::Object(map) => {
                deepest = deepest.max(depth + 1);
                stack.extend(map.values().map(|v| (depth + 1, v)));
            }
            _ => {}
        }
    }
    deepest
}

/// Pre-order iterator returned by [`LineageNode::walk`].
pub struct Walk<'a> {
    stack: Vec<(NodePath, &'a LineageNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (NodePath, &'a LineageNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        // Push in reverse so the first parent is visited first
        for (index, parent) in node.parents.iter().enumerate().rev() {
            self.stack.push((path.child(index), parent));
        }
        Some((path, node))
    }
}
