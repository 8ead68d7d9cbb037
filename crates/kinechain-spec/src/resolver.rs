//! Parents-first ordering of a segment set.
//!
//! Resolution is an iterative scan over the pending segments. A segment
//! moves to the build order once its parent is [`ROOT_PARENT`] or already
//! placed. Scanning stops when nothing is pending, when a full pass makes no
//! progress, or when the visit budget runs out. Whatever is still pending at
//! that point is reported by name.

use std::collections::{BTreeSet, HashSet};

use kinechain_core::EngineConfig;
use log::debug;

use crate::error::TopologyError;
use crate::types::{ROOT_PARENT, SegmentSet, SegmentSpec};

// ---------------------------------------------------------------------------
// BuildOrder
// ---------------------------------------------------------------------------

/// Segment names ordered so that every parent precedes its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
    order: Vec<String>,
    roots: Vec<String>,
}

impl BuildOrder {
    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index of `name` in the order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    /// Segments whose parent is [`ROOT_PARENT`], in build order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl<'a> IntoIterator for &'a BuildOrder {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve with the default budget of `iteration_factor * len` visits.
pub fn resolve(set: &SegmentSet) -> Result<BuildOrder, TopologyError> {
    resolve_with_limit(set, EngineConfig::default().iteration_limit(set.len()))
}

/// Resolve with an explicit cap on segment visits.
pub fn resolve_with_limit(set: &SegmentSet, limit: usize) -> Result<BuildOrder, TopologyError> {
    if set.is_empty() {
        return Err(TopologyError::Empty);
    }

    let mut pending: Vec<&SegmentSpec> = set.iter().collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(set.len());
    let mut order = Vec::with_capacity(set.len());
    let mut roots = Vec::new();
    let mut budget = limit;
    let mut passes = 0usize;

    while !pending.is_empty() && budget > 0 {
        let before = pending.len();
        passes += 1;

        pending.retain(|spec| {
            let spec: &SegmentSpec = *spec;
            if budget == 0 {
                return true;
            }
            budget -= 1;

            let ready = spec.is_root() || placed.contains(spec.parent.as_str());
            if ready {
                placed.insert(spec.name.as_str());
                order.push(spec.name.clone());
                if spec.is_root() {
                    roots.push(spec.name.clone());
                }
            }
            !ready
        });

        if pending.len() == before {
            break;
        }
    }

    if pending.is_empty() {
        debug!("resolved {} segments in {passes} passes ({} roots)", order.len(), roots.len());
        return Ok(BuildOrder { order, roots });
    }

    let unresolved: Vec<String> = pending.iter().map(|s| s.name.clone()).collect();
    let missing_parents: Vec<String> = pending
        .iter()
        .filter(|s| !s.is_root() && !set.contains(&s.parent))
        .map(|s| s.parent.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    debug!(
        "resolution stopped after {passes} passes with {} pending (budget left {budget})",
        unresolved.len()
    );
    Err(TopologyError::Unresolvable {
        unresolved,
        missing_parents,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
