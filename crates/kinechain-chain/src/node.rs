//! Runtime nodes and joint markers.

use kinechain_core::{Quaternion, Vec3};

// ---------------------------------------------------------------------------
// ChainNode
// ---------------------------------------------------------------------------

/// One resolved rigid segment.
///
/// `position` is the world position of the segment's anchor, the point it
/// rotates about. The renderer's box sits at [`box_center`](Self::box_center).
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    /// Slot of the parent in the chain's build order.
    pub(crate) parent_slot: Option<usize>,
    pub(crate) signal: String,
    pub(crate) dimensions: Vec3,
    pub(crate) anchor: Vec3,
    /// Attach point in the parent frame before the parent's bone offset.
    pub(crate) attachment: Vec3,
    pub(crate) position_in_parent: Vec3,
    pub(crate) position: Vec3,
    pub(crate) orientation: Quaternion,
    pub(crate) q_seg2bone: Quaternion,
    /// Declared bone offset, restored by `clear_calibration`.
    pub(crate) rest_seg2bone: Quaternion,
    pub(crate) color: Option<String>,
}

impl ChainNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent name; `None` for a root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Sample key that drives this node.
    pub fn signal(&self) -> &str {
        &self.signal
    }

    pub const fn dimensions(&self) -> &Vec3 {
        &self.dimensions
    }

    /// Anchor in the node's own frame.
    pub const fn anchor(&self) -> &Vec3 {
        &self.anchor
    }

    /// Cached attach point in the parent's frame, bone offset applied.
    pub const fn position_in_parent(&self) -> &Vec3 {
        &self.position_in_parent
    }

    /// World position of the anchor.
    pub const fn position(&self) -> &Vec3 {
        &self.position
    }

    /// World orientation.
    pub const fn orientation(&self) -> &Quaternion {
        &self.orientation
    }

    pub const fn bone_offset(&self) -> &Quaternion {
        &self.q_seg2bone
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Map a point given relative to the anchor in the node frame to world
    /// coordinates.
    pub fn global_point(&self, local: &Vec3) -> Vec3 {
        self.position + self.orientation.rotate(local)
    }

    /// World position of the anchor.
    pub fn anchor_global(&self) -> Vec3 {
        self.global_point(&Vec3::zeros())
    }

    /// World position of the box centre, with the bone offset applied.
    pub fn box_center(&self) -> Vec3 {
        self.position - (self.orientation * self.q_seg2bone).rotate(&self.anchor)
    }
}

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// Marker at the point where a non-root segment attaches to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub segment: String,
    pub parent: String,
    /// World position, equal to the child's anchor.
    pub position: Vec3,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
