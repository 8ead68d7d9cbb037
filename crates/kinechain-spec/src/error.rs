//! Error types for segment spec loading and topology resolution.

use std::path::PathBuf;

/// Errors that can occur while loading segment specs.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Failed to read the segment file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the JSON content.
    #[error("segment spec parse error: {0}")]
    Parse(String),

    /// A segment's `name` field disagrees with its key.
    #[error("segment keyed {key:?} declares name {name:?}")]
    NameMismatch { key: String, name: String },

    /// A numeric field holds NaN or infinity.
    #[error("segment {segment:?}: non-finite value in {field}")]
    NonFinite { segment: String, field: &'static str },
}

/// The segment set cannot be ordered parents-first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// There are no segments at all.
    #[error("segment set is empty")]
    Empty,

    /// Some segments never found a resolved parent: a cycle, a missing
    /// parent, or no `"root"` segment at all.
    #[error("unresolvable topology: segments {unresolved:?} never resolved (missing parents: {missing_parents:?})")]
    Unresolvable {
        /// Segments left pending, sorted by name.
        unresolved: Vec<String>,
        /// Parent names referenced but never declared, sorted.
        missing_parents: Vec<String>,
    },
}

impl TopologyError {
    /// Names of the segments that failed to resolve.
    pub fn unresolved(&self) -> &[String] {
        match self {
            Self::Empty => &[],
            Self::Unresolvable { unresolved, .. } => unresolved,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
