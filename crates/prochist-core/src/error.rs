//! Error types for history operations.

use std::path::PathBuf;

use prochist_types::NodePath;
use thiserror::Error;

/// Errors surfaced by the write, view and navigate entry points.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A caller-supplied field value has no JSON representation.
    #[error("field '{key}' cannot be encoded: {reason}")]
    UnencodableValue { key: String, reason: String },

    /// Stored history text is present but unreadable.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A navigation step selected a parent that does not exist.
    #[error(
        "lineage path {path}: step {position} selects parent {index}, but the node has {available} parent(s)"
    )]
    OutOfRange {
        path: NodePath,
        position: usize,
        index: usize,
        available: usize,
    },

    /// The metadata store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stored history text could not be turned into a lineage node.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("stored history is empty")]
    Empty,

    #[error("stored history is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("stored history has an unexpected shape: {0}")]
    Shape(String),

    #[error("stored history nests {depth} ancestor levels, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("field '{key}' nests {depth} levels, limit is {limit}")]
    ValueTooDeep {
        key: String,
        depth: usize,
        limit: usize,
    },

    /// A keyed record whose shared ancestors expand past the node budget.
    #[error("stored history expands to more than {limit} nodes")]
    TooManyNodes { limit: usize },

    /// The compressed item could not be unpacked.
    #[error("packed history cannot be unpacked: {0}")]
    Packed(String),
}

/// Failures of the underlying metadata store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read metadata of {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write metadata of {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata of {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("{0} is open read-only")]
    ReadOnly(String),

    #[error("history needs {size} bytes (packed), store is limited to {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("no store registered for {0}")]
    NotFound(PathBuf),
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
