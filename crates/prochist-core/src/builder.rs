//! Record builder: automatic facts + caller fields + parent history → one node.
//!
//! Parent history is collected on a best-effort basis. A parent that has no
//! history, cannot be opened, or holds unreadable text becomes the empty node
//! and the build carries on; partial lineage beats no new record at all.
//!
//! On a literal key collision between a caller field and an automatic field,
//! the caller's value is recorded.

use std::path::Path;

use indexmap::IndexMap;
use prochist_types::{Fields, LineageNode, MAX_LINEAGE_DEPTH, keys};
use serde::Serialize;
use serde_json::Value;

use crate::codec;
use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::facts::FactProvider;
use crate::store::{self, MetadataStore, StoreOpener};

/// Where a parent's history comes from.
pub enum ParentSource<'a> {
    /// A file opened read-only through the builder's [`StoreOpener`].
    Path(&'a Path),
    /// A store the caller already holds open.
    Store(&'a dyn MetadataStore),
    /// History already in memory.
    Node(&'a LineageNode),
}

impl<'a> From<&'a Path> for ParentSource<'a> {
    fn from(path: &'a Path) -> Self {
        ParentSource::Path(path)
    }
}

impl<'a> From<&'a LineageNode> for ParentSource<'a> {
    fn from(node: &'a LineageNode) -> Self {
        ParentSource::Node(node)
    }
}

/// Which automatic fields a caller wants recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldSelection {
    #[default]
    All,
    /// Only these automatic fields (plus any forced by configuration).
    Only(Vec<String>),
}

/// Caller-supplied fields.
///
/// Values are converted to JSON on insert, but a conversion failure is held
/// until the record is built, so the write fails naming the field.
#[derive(Clone, Debug, Default)]
pub struct UserFields {
    entries: IndexMap<String, std::result::Result<Value, String>>,
}

impl UserFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`; a repeated key keeps its first position and takes the new value.
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> &mut Self {
        let key = key.into();
        let value = held(codec::encode_value(&key, value));
        self.entries.insert(key, value);
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The fields as JSON, or the first field that has no JSON form.
    pub fn resolve(&self) -> Result<Fields> {
        self.entries
            .iter()
            .map(|(key, value)| match value {
                Ok(value) => Ok((key.clone(), value.clone())),
                Err(reason) => Err(HistoryError::UnencodableValue {
                    key: key.clone(),
                    reason: reason.clone(),
                }),
            })
            .collect()
    }
}

impl From<Fields> for UserFields {
    fn from(fields: Fields) -> Self {
        fields.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for UserFields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| {
                    let key = k.into();
                    let value = held(codec::check_value(&key, v));
                    (key, value)
                })
                .collect(),
        }
    }
}

/// Keep only the reason of a conversion failure until the record is built.
fn held(value: Result<Value>) -> std::result::Result<Value, String> {
    value.map_err(|e| match e {
        HistoryError::UnencodableValue { reason, .. } => reason,
        other => other.to_string(),
    })
}

/// Builds lineage nodes.
pub struct RecordBuilder<'a> {
    facts: &'a dyn FactProvider,
    opener: &'a dyn StoreOpener,
    selection: FieldSelection,
    force_fields: Vec<String>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(facts: &'a dyn FactProvider, opener: &'a dyn StoreOpener) -> Self {
        Self {
            facts,
            opener,
            selection: FieldSelection::All,
            force_fields: Vec::new(),
        }
    }

    /// Apply the forced fields from `config`.
    pub fn with_config(self, config: &HistoryConfig) -> Self {
        self.force_fields(config.force_fields.iter().cloned())
    }

    pub fn select(mut self, selection: FieldSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Automatic fields recorded whatever the selection says.
    pub fn force_fields(mut self, names: impl IntoIterator<Item = String>) -> Self {
        for name in names {
            if !keys::is_automatic(&name) {
                tracing::warn!(field = %name, "forced field is not an automatic field, ignoring");
                continue;
            }
            if !self.force_fields.contains(&name) {
                self.force_fields.push(name);
            }
        }
        self
    }

    /// Build a node from caller fields and parent sources.
    pub fn build(&self, user: &UserFields, parents: &[ParentSource<'_>]) -> Result<LineageNode> {
        self.build_for(None, user, parents)
    }

    /// Build a node for the file called `target_name`, recorded as `filename`.
    pub fn build_for(
        &self,
        target_name: Option<&str>,
        user: &UserFields,
        parents: &[ParentSource<'_>],
    ) -> Result<LineageNode> {
        // Checked first so a bad field costs no parent reads
        let user_fields = user.resolve()?;

        let mut fields = self.automatic_fields(target_name);
        for (key, value) in user_fields {
            if fields.contains_key(&key) {
                tracing::debug!(field = %key, "caller value replaces automatic value");
            }
            fields.insert(key, value);
        }

        let parents = parents
            .iter()
            .enumerate()
            .map(|(index, source)| self.resolve_parent(index, source))
            .collect();

        Ok(LineageNode::new(fields, parents))
    }

    fn automatic_fields(&self, target_name: Option<&str>) -> Fields {
        let mut facts = self.facts.facts();
        if let Some(name) = target_name {
            facts.insert(keys::FILENAME.to_string(), Value::String(name.to_string()));
        }

        match &self.selection {
            FieldSelection::All => facts,
            FieldSelection::Only(names) => facts
                .into_iter()
                .filter(|(key, _)| names.contains(key) || self.force_fields.contains(key))
                .collect(),
        }
    }

    fn resolve_parent(&self, index: usize, source: &ParentSource<'_>) -> LineageNode {
        let mut node = match source {
            ParentSource::Node(node) => (*node).clone(),
            ParentSource::Store(store) => read_parent(index, *store),
            ParentSource::Path(path) => match self.opener.open(path) {
                Ok(store) => read_parent(index, store.as_ref()),
                Err(e) => {
                    tracing::warn!(parent = index, path = %path.display(), error = %e, "cannot open parent, recording empty history");
                    LineageNode::empty()
                }
            },
        };

        // Keep the new record within what the parser accepts
        if node.truncate(MAX_LINEAGE_DEPTH - 1) {
            tracing::warn!(parent = index, limit = MAX_LINEAGE_DEPTH, "parent lineage truncated");
        }
        if let Err(e) = codec::check_nesting(&node) {
            tracing::warn!(parent = index, error = %e, "parent history cannot be stored, recording empty history");
            return LineageNode::empty();
        }
        node
    }
}

fn read_parent(index: usize, store: &dyn MetadataStore) -> LineageNode {
    let text = match store::read_raw(store) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::debug!(parent = index, file = ?store.name(), "parent has no history");
            return LineageNode::empty();
        }
        Err(e) => {
            tracing::warn!(parent = index, file = ?store.name(), error = %e, "cannot read parent history, recording empty history");
            return LineageNode::empty();
        }
    };

    match codec::deserialize(&text) {
        Ok(node) => node,
        Err(e) => {
            tracing::warn!(parent = index, file = ?store.name(), error = %e, "unreadable parent history, recording empty history");
            LineageNode::empty()
        }
    }
}
