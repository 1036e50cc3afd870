//! Navigation paths into a lineage tree.
//!
//! A path is a sequence of zero-based parent indices walked from the root:
//! `[0]` is the first direct parent, `[0, 2]` the third parent of the first
//! parent. The text form joins indices with `.` (`"0.2"`); `"."` or the empty
//! string is the root itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a [`NodePath`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lineage path '{input}': '{segment}' is not a parent index")]
pub struct PathParseError {
    pub input: String,
    pub segment: String,
}

/// Sequence of parent indices addressing one node of a lineage tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// This path extended by one parent index.
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl From<&[usize]> for NodePath {
    fn from(steps: &[usize]) -> Self {
        Self(steps.to_vec())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathParseError;

    /// Accepts `.`, `,` or `/` between indices, with optional surrounding
    /// brackets, so `0.2`, `0,2` and `[0, 2]` are the same path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();
        if inner.is_empty() || inner == "." {
            return Ok(Self::root());
        }

        inner
            .split(['.', ',', '/'])
            .map(|segment| {
                segment.trim().parse::<usize>().map_err(|_| PathParseError {
                    input: s.to_string(),
                    segment: segment.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
