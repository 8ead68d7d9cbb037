//! Author-facing segment declarations.
//!
//! A [`SegmentSpec`] describes one rigid segment: its box dimensions, the
//! anchor point it rotates about, where it attaches on its parent, its rest
//! orientation and which signal drives it. Specs reference their parent by
//! name; [`ROOT_PARENT`] marks the top of an independent tree.

use std::collections::BTreeMap;

use kinechain_core::{Quaternion, Vec3, scaled_offset};
use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Parent name that marks a root segment.
pub const ROOT_PARENT: &str = "root";

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_dimensions() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

// ---------------------------------------------------------------------------
// SegmentSpec
// ---------------------------------------------------------------------------

/// Declaration of one rigid segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Segment name. Filled from the map key when loading JSON.
    #[serde(default)]
    pub name: String,

    /// Parent segment name, or [`ROOT_PARENT`].
    pub parent: String,

    /// Box size `[dx, dy, dz]`.
    #[serde(default = "default_dimensions")]
    pub dimensions: [f64; 3],

    /// Anchor, relative part (multiplied by own dimensions).
    #[serde(default)]
    pub anchor_rel: [f64; 3],

    /// Anchor, absolute part.
    #[serde(default)]
    pub anchor_abs: [f64; 3],

    /// Attachment point on the parent, relative part (multiplied by the
    /// parent's dimensions).
    #[serde(default)]
    pub position_rel: Option<[f64; 3]>,

    /// Attachment point on the parent, absolute part.
    #[serde(default)]
    pub position_abs: Option<[f64; 3]>,

    /// Rest orientation used until the first sample arrives.
    #[serde(default)]
    pub orientation: Quaternion,

    /// Sample key for this segment's raw orientation. Defaults to `name`.
    #[serde(default)]
    pub signal: Option<String>,

    /// Static segment-to-bone offset.
    #[serde(default, rename = "qSeg2Bone", alias = "q_seg2bone")]
    pub q_seg2bone: Quaternion,

    /// Display color, passed through to the renderer.
    #[serde(default)]
    pub color: Option<String>,
}

impl SegmentSpec {
    /// A unit box attached at its parent's anchor, with identity rotations.
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            dimensions: default_dimensions(),
            anchor_rel: [0.0; 3],
            anchor_abs: [0.0; 3],
            position_rel: None,
            position_abs: None,
            orientation: Quaternion::IDENTITY,
            signal: None,
            q_seg2bone: Quaternion::IDENTITY,
            color: None,
        }
    }

    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: [f64; 3]) -> Self {
        self.dimensions = dimensions;
        self
    }

    #[must_use]
    pub const fn with_anchor(mut self, rel: [f64; 3], abs: [f64; 3]) -> Self {
        self.anchor_rel = rel;
        self.anchor_abs = abs;
        self
    }

    #[must_use]
    pub const fn with_position(mut self, rel: [f64; 3], abs: [f64; 3]) -> Self {
        self.position_rel = Some(rel);
        self.position_abs = Some(abs);
        self
    }

    #[must_use]
    pub const fn with_orientation(mut self, orientation: Quaternion) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    #[must_use]
    pub const fn with_bone_offset(mut self, q_seg2bone: Quaternion) -> Self {
        self.q_seg2bone = q_seg2bone;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Whether this segment starts an independent tree.
    pub fn is_root(&self) -> bool {
        self.parent == ROOT_PARENT
    }

    /// Key used to look up this segment in a sample.
    pub fn signal_key(&self) -> &str {
        self.signal.as_deref().unwrap_or(&self.name)
    }

    /// Anchor in the segment's own frame: `dimensions ∘ anchor_rel + anchor_abs`.
    pub fn anchor(&self) -> Vec3 {
        scaled_offset(
            &Vec3::from(self.dimensions),
            &Vec3::from(self.anchor_rel),
            &Vec3::from(self.anchor_abs),
        )
    }

    /// Attachment point in the parent's frame, before the parent's bone
    /// offset is applied: `parent_dimensions ∘ position_rel + position_abs`.
    ///
    /// A missing half of the pair counts as zero; with neither given the
    /// segment attaches at the parent's anchor.
    pub fn attachment(&self, parent_dimensions: &[f64; 3]) -> Vec3 {
        scaled_offset(
            &Vec3::from(*parent_dimensions),
            &Vec3::from(self.position_rel.unwrap_or_default()),
            &Vec3::from(self.position_abs.unwrap_or_default()),
        )
    }

    /// Reject NaN / infinite geometry.
    pub fn check_finite(&self) -> Result<(), SpecError> {
        let fields: [(&'static str, Option<&[f64; 3]>); 5] = [
            ("dimensions", Some(&self.dimensions)),
            ("anchor_rel", Some(&self.anchor_rel)),
            ("anchor_abs", Some(&self.anchor_abs)),
            ("position_rel", self.position_rel.as_ref()),
            ("position_abs", self.position_abs.as_ref()),
        ];
        for (field, values) in fields {
            if values.is_some_and(|v| !v.iter().all(|c| c.is_finite())) {
                return Err(SpecError::NonFinite {
                    segment: self.name.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SegmentSet
// ---------------------------------------------------------------------------

/// All segment specs of one chain, keyed by name.
///
/// Iteration is in name order, which makes resolution deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSet {
    segments: BTreeMap<String, SegmentSpec>,
}

impl SegmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec under its own name, returning any spec it replaced.
    pub fn insert(&mut self, spec: SegmentSpec) -> Option<SegmentSpec> {
        self.segments.insert(spec.name.clone(), spec)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, spec: SegmentSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SegmentSpec> {
        self.segments.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SegmentSpec> {
        self.segments.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.segments.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    /// Specs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &SegmentSpec> {
        self.segments.values()
    }

    /// Specs whose parent is [`ROOT_PARENT`].
    pub fn roots(&self) -> impl Iterator<Item = &SegmentSpec> {
        self.iter().filter(|s| s.is_root())
    }
}

impl FromIterator<SegmentSpec> for SegmentSet {
    fn from_iter<I: IntoIterator<Item = SegmentSpec>>(iter: I) -> Self {
        let mut set = Self::new();
        for spec in iter {
            set.insert(spec);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
