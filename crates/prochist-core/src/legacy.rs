//! Reader for the older keyed history layout.
//!
//! Older records kept the whole lineage flat, as two maps keyed by a file key:
//!
//! ```text
//! {
//!   "metadataByKey": { "CURRENTFILE": {...}, "('dem.img', '2019-...')": {...} },
//!   "parentsByKey":  { "CURRENTFILE": ["('dem.img', '2019-...')"], ... }
//! }
//! ```
//!
//! The same key may appear as a parent of several nodes; each occurrence gets
//! its own deep copy in the rebuilt tree. Copies are counted against
//! [`MAX_LEGACY_NODES`], since shared keys can grow the tree exponentially.

use prochist_types::{Fields, LineageNode, MAX_LINEAGE_DEPTH, keys};
use serde_json::{Map, Value};

use crate::error::ParseError;

const METADATA_BY_KEY: &str = "metadataByKey";
const PARENTS_BY_KEY: &str = "parentsByKey";
const CURRENT_FILE_KEY: &str = "CURRENTFILE";

/// Most nodes a keyed record may expand to.
pub(crate) const MAX_LEGACY_NODES: usize = 100_000;

pub(crate) fn is_keyed(value: &Value) -> bool {
    value.get(METADATA_BY_KEY).is_some() && value.get(PARENTS_BY_KEY).is_some()
}

pub(crate) fn from_keyed(value: &Value) -> Result<LineageNode, ParseError> {
    let metadata = value
        .get(METADATA_BY_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::Shape(format!("{METADATA_BY_KEY} is not an object")))?;
    let parents = value
        .get(PARENTS_BY_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::Shape(format!("{PARENTS_BY_KEY} is not an object")))?;

    let mut layout = Keyed {
        metadata,
        parents,
        nodes: 0,
    };
    layout.node(CURRENT_FILE_KEY, 0)
}

struct Keyed<'a> {
    metadata: &'a Map<String, Value>,
    parents: &'a Map<String, Value>,
    nodes: usize,
}

impl Keyed<'_> {
    fn node(&mut self, key: &str, depth: usize) -> Result<LineageNode, ParseError> {
        // A key listing itself as an ancestor would recurse forever
        if depth > MAX_LINEAGE_DEPTH {
            return Err(ParseError::TooDeep {
                depth,
                limit: MAX_LINEAGE_DEPTH,
            });
        }
        self.nodes += 1;
        if self.nodes > MAX_LEGACY_NODES {
            return Err(ParseError::TooManyNodes {
                limit: MAX_LEGACY_NODES,
            });
        }

        let mut fields: Fields = match self.metadata.get(key) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(_) => {
                return Err(ParseError::Shape(format!("metadata for {key} is not an object")));
            }
            None => Fields::new(),
        };
        if key != CURRENT_FILE_KEY && !fields.contains_key(keys::FILENAME) {
            if let Some(name) = key_filename(key) {
                fields.insert(keys::FILENAME.to_string(), Value::String(name));
            }
        }

        let parents_by_key = self.parents;
        let parent_keys = match parents_by_key.get(key) {
            Some(Value::Array(list)) => list.as_slice(),
            Some(_) => {
                return Err(ParseError::Shape(format!("parents of {key} are not a list")));
            }
            None => &[],
        };

        let mut parents = Vec::with_capacity(parent_keys.len());
        for parent_key in parent_keys {
            let parent_key = parent_key
                .as_str()
                .ok_or_else(|| ParseError::Shape(format!("parent key under {key} is not a string")))?;
            parents.push(self.node(parent_key, depth + 1)?);
        }

        Ok(LineageNode::new(fields, parents))
    }
}

/// File name out of a `('name', 'timestamp')` key string.
fn key_filename(key: &str) -> Option<String> {
    let inner = key.trim().strip_prefix('(')?.trim_start();
    let quote = inner.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &inner[quote.len_utf8()..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}
