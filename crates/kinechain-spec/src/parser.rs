//! JSON loading of segment declarations.
//!
//! The format is an object keyed by segment name:
//!
//! ```json
//! {
//!   "hip":  { "parent": "root", "dimensions": [12, 3, 6] },
//!   "knee": { "parent": "hip", "anchor_abs": [0, 5, 0], "position_abs": [0, -10, 0] }
//! }
//! ```
//!
//! Unknown fields are ignored so renderer-only settings can live alongside
//! the geometry.

use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::error::SpecError;
use crate::types::{SegmentSet, SegmentSpec};

/// Read and parse a segment file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SegmentSet, SpecError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_str(&content)?;
    debug!("loaded {} segments from {}", set.len(), path.display());
    Ok(set)
}

/// Parse segment declarations from a JSON string.
pub fn parse_str(json: &str) -> Result<SegmentSet, SpecError> {
    let value: Value = serde_json::from_str(json).map_err(|e| SpecError::Parse(e.to_string()))?;
    parse_value(&value)
}

/// Build a [`SegmentSet`] from an already-parsed JSON value.
pub fn parse_value(value: &Value) -> Result<SegmentSet, SpecError> {
    let Value::Object(entries) = value else {
        return Err(SpecError::Parse(
            "expected an object keyed by segment name".into(),
        ));
    };

    let mut set = SegmentSet::new();
    for (key, entry) in entries {
        let mut spec: SegmentSpec = serde_json::from_value(entry.clone())
            .map_err(|e| SpecError::Parse(format!("segment {key:?}: {e}")))?;

        if spec.name.is_empty() {
            spec.name.clone_from(key);
        } else if spec.name != *key {
            return Err(SpecError::NameMismatch {
                key: key.clone(),
                name: spec.name,
            });
        }

        spec.check_finite()?;
        set.insert(spec);
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
