//! Lineage navigation: locate one node of a tree and describe it.

use std::fmt;

use prochist_types::{Fields, LineageNode, NodePath};
use strum::{Display, EnumString};

use crate::error::{HistoryError, Result};

/// What to show for a resolved node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Fields,
    Parents,
}

/// Rendered result of [`navigate`].
#[derive(Clone, Debug, PartialEq)]
pub enum View<'a> {
    Fields(&'a Fields),
    Parents(Vec<ParentSummary>),
}

/// Short description of one direct parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentSummary {
    /// Position among the parents; also the next path step to reach it.
    pub index: usize,
    pub filename: Option<String>,
    pub timestamp: Option<String>,
    /// Number of parents the parent itself has.
    pub parent_count: usize,
    /// Whether the parent had no readable history.
    pub is_empty: bool,
}

impl ParentSummary {
    fn of(index: usize, node: &LineageNode) -> Self {
        Self {
            index,
            filename: node.filename().map(str::to_string),
            timestamp: node.timestamp().map(str::to_string),
            parent_count: node.parents.len(),
            is_empty: node.is_empty(),
        }
    }
}

impl fmt::Display for ParentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.index)?;
        if self.is_empty {
            return f.write_str("(no history)");
        }
        f.write_str(self.filename.as_deref().unwrap_or("(unnamed)"))?;
        if let Some(timestamp) = &self.timestamp {
            write!(f, " @ {timestamp}")?;
        }
        Ok(())
    }
}

/// Walk `path` from `root` one parent index at a time.
pub fn resolve<'a>(root: &'a LineageNode, path: &NodePath) -> Result<&'a LineageNode> {
    let mut current = root;
    for (position, index) in path.iter().enumerate() {
        current = current
            .parents
            .get(index)
            .ok_or_else(|| HistoryError::OutOfRange {
                path: path.clone(),
                position,
                index,
                available: current.parents.len(),
            })?;
    }
    Ok(current)
}

pub fn fields_view(node: &LineageNode) -> &Fields {
    &node.fields
}

/// One summary per direct parent; does not descend further.
pub fn parents_view(node: &LineageNode) -> Vec<ParentSummary> {
    node.parents
        .iter()
        .enumerate()
        .map(|(index, parent)| ParentSummary::of(index, parent))
        .collect()
}

/// Resolve `path` and render the node in the requested mode.
pub fn navigate<'a>(root: &'a LineageNode, path: &NodePath, mode: ViewMode) -> Result<View<'a>> {
    let node = resolve(root, path)?;
    Ok(match mode {
        ViewMode::Fields => View::Fields(fields_view(node)),
        ViewMode::Parents => View::Parents(parents_view(node)),
    })
}

/// Paths of every node in the tree recorded under file name `name`.
///
/// Matches either the recorded name exactly or its final path component.
pub fn find_by_name(root: &LineageNode, name: &str) -> Vec<NodePath> {
    let wanted = base_name(name);
    root.walk()
        .filter(|(_, node)| {
            node.filename()
                .is_some_and(|recorded| recorded == name || base_name(recorded) == wanted)
        })
        .map(|(path, _)| path)
        .collect()
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
