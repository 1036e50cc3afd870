//! Text form of a lineage tree.
//!
//! A whole tree, parents included, is one JSON document stored in a single
//! metadata item. Parsing is strict here and exposes [`ParseError`]; callers
//! that must never fail on an ancestor use [`deserialize_or_empty`].
//!
//! Size-limited stores keep the document packed: zlib at level 9, then
//! standard base64. See [`pack`] and [`unpack`].

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use prochist_types::{LineageNode, MAX_LINEAGE_DEPTH, MAX_VALUE_NESTING, value_nesting};
use serde::Serialize;
use serde_json::Value;

use crate::error::{HistoryError, ParseError, Result};
use crate::{finite, legacy};

/// Convert one caller value to JSON, naming `key` if it has no representation.
///
/// Non-finite floats and values nested deeper than [`MAX_VALUE_NESTING`] are
/// rejected, since neither would read back as written.
pub fn encode_value<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Value> {
    let unencodable = |reason: String| HistoryError::UnencodableValue {
        key: key.to_string(),
        reason,
    };
    finite::check(value).map_err(|e| unencodable(e.to_string()))?;
    let value = serde_json::to_value(value).map_err(|e| unencodable(e.to_string()))?;
    check_value(key, value)
}

/// Accept an already converted value if its nesting fits the stored format.
pub fn check_value(key: &str, value: Value) -> Result<Value> {
    let depth = value_nesting(&value);
    if depth > MAX_VALUE_NESTING {
        return Err(HistoryError::UnencodableValue {
            key: key.to_string(),
            reason: format!("nests {depth} levels, limit is {MAX_VALUE_NESTING}"),
        });
    }
    Ok(value)
}

/// Every field value in the tree is within [`MAX_VALUE_NESTING`].
pub fn check_nesting(node: &LineageNode) -> std::result::Result<(), ParseError> {
    for (_, n) in node.walk() {
        for (key, value) in &n.fields {
            let depth = value_nesting(value);
            if depth > MAX_VALUE_NESTING {
                return Err(ParseError::ValueTooDeep {
                    key: key.clone(),
                    depth,
                    limit: MAX_VALUE_NESTING,
                });
            }
        }
    }
    Ok(())
}

/// Render a tree as compact JSON.
///
/// Output is deterministic: fields keep their insertion order and parents
/// their input order. A field nested too deeply to be parsed again is
/// rejected here, before anything is stored.
pub fn serialize(node: &LineageNode) -> Result<String> {
    if let Err(ParseError::ValueTooDeep { key, depth, limit }) = check_nesting(node) {
        return Err(HistoryError::UnencodableValue {
            key,
            reason: format!("nests {depth} levels, limit is {limit}"),
        });
    }
    serde_json::to_string(node).map_err(|e| {
        let key = node
            .walk()
            .flat_map(|(_, n)| n.fields.iter())
            .find(|(_, v)| serde_json::to_string(v).is_err())
            .map(|(k, _)| k.clone())
            .unwrap_or_default();
        HistoryError::UnencodableValue {
            key,
            reason: e.to_string(),
        }
    })
}

/// Parse stored text back into a tree.
///
/// Unknown top-level keys are ignored; missing `fields` or `parents` default to
/// empty. Records in the older keyed layout (`metadataByKey`/`parentsByKey`)
/// are rebuilt into a tree.
pub fn deserialize(text: &str) -> std::result::Result<LineageNode, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let value: Value = serde_json::from_str(text)?;
    let node = if legacy::is_keyed(&value) {
        legacy::from_keyed(&value)?
    } else {
        serde_json::from_value::<LineageNode>(value).map_err(|e| ParseError::Shape(e.to_string()))?
    };

    let depth = node.depth();
    if depth > MAX_LINEAGE_DEPTH {
        return Err(ParseError::TooDeep {
            depth,
            limit: MAX_LINEAGE_DEPTH,
        });
    }
    check_nesting(&node)?;
    Ok(node)
}

/// Parse stored text, substituting the empty node for absent or bad text.
pub fn deserialize_or_empty(text: Option<&str>) -> LineageNode {
    let Some(text) = text else {
        return LineageNode::empty();
    };
    match deserialize(text) {
        Ok(node) => node,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable history, using empty node");
            LineageNode::empty()
        }
    }
}

/// Compress and base64-encode serialized history.
pub fn pack(text: &str) -> std::io::Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Reverse of [`pack`].
pub fn unpack(packed: &str) -> std::result::Result<String, ParseError> {
    let compressed = BASE64
        .decode(packed.trim())
        .map_err(|e| ParseError::Packed(e.to_string()))?;
    let mut text = String::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| ParseError::Packed(e.to_string()))?;
    Ok(text)
}
