//! Write and read entry points.

use prochist_types::LineageNode;

use crate::builder::{ParentSource, RecordBuilder, UserFields};
use crate::codec;
use crate::error::Result;
use crate::store::{self, MetadataStore};

/// Build a record for `target`, serialize it and replace the target's history.
///
/// Any earlier history of `target` is discarded, not nested. If the record
/// cannot be built or stored, `target` keeps its previous history.
#[tracing::instrument(skip_all, fields(file = ?target.name(), parents = parents.len()))]
pub fn write_history(
    builder: &RecordBuilder<'_>,
    user: &UserFields,
    parents: &[ParentSource<'_>],
    target: &mut dyn MetadataStore,
) -> Result<LineageNode> {
    let name = target.name();
    let node = builder.build_for(name.as_deref(), user, parents)?;
    let text = codec::serialize(&node)?;
    store::write_raw(target, &text)?;
    tracing::debug!(bytes = text.len(), nodes = node.node_count(), "history written");
    Ok(node)
}

/// Read the history of `target`.
///
/// A target without history yields the empty node; unreadable history is an
/// error, since the caller asked about this file specifically.
#[tracing::instrument(skip_all, fields(file = ?target.name()))]
pub fn read_history(target: &dyn MetadataStore) -> Result<LineageNode> {
    match store::read_raw(target)? {
        Some(text) => Ok(codec::deserialize(&text)?),
        None => Ok(LineageNode::empty()),
    }
}

/// Like [`read_history`], but any failure yields the empty node.
pub fn read_history_or_empty(target: &dyn MetadataStore) -> LineageNode {
    read_history(target).unwrap_or_else(|e| {
        tracing::debug!(file = ?target.name(), error = %e, "history unreadable, using empty node");
        LineageNode::empty()
    })
}

/// Whether any history item is stored on `target`.
pub fn has_history(target: &dyn MetadataStore) -> Result<bool> {
    Ok(target.get_item(store::HISTORY_ITEM)?.is_some()
        || target.get_item(store::HISTORY_ITEM_PACKED)?.is_some())
}
