//! Lineage types for prochist.
//!
//! A derived file carries a self-describing record of how it was produced:
//! which process made it, with what parameters and environment, and from which
//! parent files, each parent carrying its own record in turn. This crate holds
//! the data model of that record and has **no internal prochist dependencies**.
//!
//! # Shape of a record
//!
//! ```text
//! LineageNode (slope.img)
//!     ├── fields: DESCRIPTION, timestamp, login, cwd, ...
//!     └── parents
//!         └── LineageNode (dem.img)
//!             ├── fields: DESCRIPTION, UNITS, timestamp, ...
//!             └── parents: []
//! ```
//!
//! # Key Types
//!
//! |-----------------|----------------------------------------------------|
//! | Type            | Purpose                                            |
//! |-----------------|----------------------------------------------------|
//! | [`LineageNode`] | One history entry: fields + embedded parent nodes  |
//! | [`Fields`]      | Ordered key → JSON value mapping                   |
//! | [`NodePath`]    | Parent-index path addressing one node in the tree  |
//! |-----------------|----------------------------------------------------|

pub mod keys;
pub mod node;
pub mod path;

pub use node::{Fields, LineageNode, Walk, value_nesting};
pub use path::{NodePath, PathParseError};

/// Maximum number of ancestor levels a stored record may carry.
///
/// Each level costs two levels of JSON nesting (node object + parents array).
/// Together with [`MAX_VALUE_NESTING`] this keeps every stored document inside
/// `serde_json`'s 128-level recursion limit:
///
/// ```text
/// 2 * MAX_LINEAGE_DEPTH + 2 + MAX_VALUE_NESTING = 96 + 2 + 24 = 122 < 128
/// ```
pub const MAX_LINEAGE_DEPTH: usize = 48;

/// Maximum nesting of arrays and objects inside one field value.
pub const MAX_VALUE_NESTING: usize = 24;
