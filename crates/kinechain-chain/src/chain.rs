//! Chain construction, queries and calibration setters.
//!
//! Nodes live in a `Vec` in build order and refer to their parent by name
//! (plus the parent's slot in that `Vec`). Since every parent precedes its
//! children, a single forward pass updates the whole chain.

use std::collections::{BTreeMap, HashMap, HashSet};

use kinechain_core::{EngineConfig, Quaternion, Vec3};
use kinechain_spec::{BuildOrder, SegmentSet, resolve_with_limit};
use log::{debug, trace, warn};

use crate::calibration::CalibrationState;
use crate::error::ChainError;
use crate::node::{ChainNode, Joint};
use crate::sample::Sample;

/// A resolved tree of segments plus their joints and calibration.
#[derive(Debug, Clone)]
pub struct Chain {
    pub(crate) nodes: Vec<ChainNode>,
    pub(crate) slots: HashMap<String, usize>,
    pub(crate) order: BuildOrder,
    pub(crate) joints: BTreeMap<String, Joint>,
    pub(crate) calibration: CalibrationState,
    pub(crate) config: EngineConfig,
    pub(crate) root_position: Vec3,
    pub(crate) last_sample: Sample,
    pub(crate) final_orientations: BTreeMap<String, Quaternion>,
}

impl Chain {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build a chain with default settings and every root at `root_position`.
    pub fn build(set: &SegmentSet, root_position: Vec3) -> Result<Self, ChainError> {
        let config = EngineConfig {
            root_position: [root_position.x, root_position.y, root_position.z],
            ..EngineConfig::default()
        };
        Self::build_with_config(set, &config)
    }

    /// Validate `config`, resolve `set` and place every node at its rest
    /// pose.
    ///
    /// Nothing is returned on a config or topology error: the chain is
    /// either built completely or not at all.
    pub fn build_with_config(set: &SegmentSet, config: &EngineConfig) -> Result<Self, ChainError> {
        config.validate()?;
        let order = resolve_with_limit(set, config.iteration_limit(set.len()))?;
        let root_position = Vec3::from(config.root_position);

        let mut chain = Self {
            nodes: Vec::with_capacity(order.len()),
            slots: HashMap::with_capacity(order.len()),
            order: order.clone(),
            joints: BTreeMap::new(),
            calibration: CalibrationState::new(),
            config: config.clone(),
            root_position,
            last_sample: Sample::new(),
            final_orientations: BTreeMap::new(),
        };

        for name in order.iter() {
            let spec = set
                .get(name)
                .ok_or_else(|| ChainError::UnknownSegment(name.to_owned()))?;
            let anchor = spec.anchor();

            let node = if spec.is_root() {
                ChainNode {
                    name: spec.name.clone(),
                    parent: None,
                    parent_slot: None,
                    signal: spec.signal_key().to_owned(),
                    dimensions: Vec3::from(spec.dimensions),
                    anchor,
                    attachment: Vec3::zeros(),
                    position_in_parent: Vec3::zeros(),
                    position: root_position,
                    orientation: spec.orientation,
                    q_seg2bone: spec.q_seg2bone,
                    rest_seg2bone: spec.q_seg2bone,
                    color: spec.color.clone(),
                }
            } else {
                let slot = chain.slot(&spec.parent)?;
                let parent = &chain.nodes[slot];
                let parent_spec = set
                    .get(&spec.parent)
                    .ok_or_else(|| ChainError::UnknownSegment(spec.parent.clone()))?;
                let attachment = spec.attachment(&parent_spec.dimensions);
                let position_in_parent = parent.q_seg2bone.rotate(&attachment);
                ChainNode {
                    name: spec.name.clone(),
                    parent: Some(spec.parent.clone()),
                    parent_slot: Some(slot),
                    signal: spec.signal_key().to_owned(),
                    dimensions: Vec3::from(spec.dimensions),
                    anchor,
                    attachment,
                    position_in_parent,
                    position: parent.global_point(&position_in_parent),
                    orientation: spec.orientation,
                    q_seg2bone: spec.q_seg2bone,
                    rest_seg2bone: spec.q_seg2bone,
                    color: spec.color.clone(),
                }
            };

            if let Some(parent) = &node.parent {
                chain.joints.insert(
                    node.name.clone(),
                    Joint {
                        segment: node.name.clone(),
                        parent: parent.clone(),
                        position: node.anchor_global(),
                    },
                );
            }
            chain.final_orientations.insert(node.signal.clone(), node.orientation);
            chain.last_sample.insert(node.signal.clone(), node.orientation);
            chain.slots.insert(node.name.clone(), chain.nodes.len());
            chain.nodes.push(node);
        }

        debug!(
            "built chain of {} segments ({} joints, roots {:?})",
            chain.nodes.len(),
            chain.joints.len(),
            chain.order.roots()
        );
        Ok(chain)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in build order.
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&ChainNode> {
        self.slots.get(name).map(|&slot| &self.nodes[slot])
    }

    pub const fn build_order(&self) -> &BuildOrder {
        &self.order
    }

    pub fn roots(&self) -> impl Iterator<Item = &ChainNode> {
        self.nodes.iter().filter(|n| n.is_root())
    }

    /// Joint of a non-root segment.
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.get(name)
    }

    /// All joints in build order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.nodes.iter().filter_map(|n| self.joints.get(&n.name))
    }

    /// World coordinates of `local`, a point relative to `name`'s anchor.
    pub fn global_point(&self, name: &str, local: &Vec3) -> Result<Vec3, ChainError> {
        let slot = self.slot(name)?;
        Ok(self.nodes[slot].global_point(local))
    }

    /// Direct children of `name`, in build order.
    pub fn children(&self, name: &str) -> Result<Vec<&str>, ChainError> {
        let slot = self.slot(name)?;
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.parent_slot == Some(slot))
            .map(ChainNode::name)
            .collect())
    }

    /// Every segment below `name`, in build order.
    pub fn descendants(&self, name: &str) -> Result<Vec<&str>, ChainError> {
        let slot = self.slot(name)?;
        let mut below = HashSet::from([slot]);
        let mut out = Vec::new();
        for (i, node) in self.nodes.iter().enumerate().skip(slot + 1) {
            if node.parent_slot.is_some_and(|p| below.contains(&p)) {
                below.insert(i);
                out.push(node.name());
            }
        }
        Ok(out)
    }

    pub const fn root_position(&self) -> &Vec3 {
        &self.root_position
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// The last sample applied, or the rest orientations before any sample.
    pub const fn last_sample(&self) -> &Sample {
        &self.last_sample
    }

    /// Last composed orientation per signal key.
    pub const fn final_orientations(&self) -> &BTreeMap<String, Quaternion> {
        &self.final_orientations
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Move every root to `position` and carry the rest of the chain along.
    pub fn set_root_position(&mut self, position: Vec3) {
        self.root_position = position;
        self.update_positions();
    }

    /// Change which sample key drives each named segment. Unknown segment
    /// names are skipped with a warning. Returns the number of segments
    /// remapped.
    ///
    /// The stored last sample and final orientations move to the new key,
    /// so [`reapply`](Self::reapply) keeps the current pose.
    pub fn remap_signals<I, K, V>(&mut self, signals: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut applied = 0;
        for (segment, signal) in signals {
            let segment = segment.as_ref();
            match self.slots.get(segment) {
                Some(&slot) => {
                    let signal = signal.into();
                    let old = std::mem::replace(&mut self.nodes[slot].signal, signal.clone());
                    if old != signal {
                        self.rekey_signal(&old, &signal);
                    }
                    applied += 1;
                }
                None => warn!("signal remap for unknown segment {segment:?} ignored"),
            }
        }
        applied
    }

    pub fn set_heading(&mut self, name: &str, heading: Quaternion) -> Result<(), ChainError> {
        self.slot(name)?;
        self.calibration.set_heading(name, heading);
        Ok(())
    }

    /// Heading as a yaw angle (radians) about world z.
    pub fn set_heading_angle(&mut self, name: &str, yaw: f64) -> Result<(), ChainError> {
        self.set_heading(name, Quaternion::heading(yaw)?)
    }

    pub fn set_slider(&mut self, name: &str, slider: Quaternion) -> Result<(), ChainError> {
        self.slot(name)?;
        self.calibration.set_slider(name, slider);
        Ok(())
    }

    /// Slider from raw `[w, x, y, z]` components, normalised.
    pub fn set_slider_components(&mut self, name: &str, components: [f64; 4]) -> Result<(), ChainError> {
        let slider = Quaternion::from_array(components)?;
        self.set_slider(name, slider)
    }

    /// Replace the segment-to-bone offset of `name`.
    ///
    /// The children's cached attach points are rotated by the new offset and
    /// positions are recomputed immediately.
    pub fn set_bone_offset(&mut self, name: &str, q_seg2bone: Quaternion) -> Result<(), ChainError> {
        let slot = self.slot(name)?;
        self.nodes[slot].q_seg2bone = q_seg2bone;
        for node in &mut self.nodes[slot + 1..] {
            if node.parent_slot == Some(slot) {
                node.position_in_parent = q_seg2bone.rotate(&node.attachment);
            }
        }
        self.update_positions();
        Ok(())
    }

    /// Install a full calibration state, e.g. one loaded from disk.
    pub fn set_calibration(&mut self, calibration: CalibrationState) -> Result<(), ChainError> {
        if let Some(unknown) = calibration.names().find(|n| !self.slots.contains_key(*n)) {
            return Err(ChainError::UnknownSegment(unknown.to_owned()));
        }
        self.calibration = calibration;
        Ok(())
    }

    /// Reset headings and sliders to identity and bone offsets to their
    /// declared values.
    pub fn clear_calibration(&mut self) {
        self.calibration.clear();
        for slot in 0..self.nodes.len() {
            let (done, rest) = self.nodes.split_at_mut(slot);
            let node = &mut rest[0];
            node.q_seg2bone = node.rest_seg2bone;
            if let Some(p) = node.parent_slot {
                node.position_in_parent = done[p].q_seg2bone.rotate(&node.attachment);
            }
        }
        self.update_positions();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Carry the stored values of signal `old` over to `new`. Values already
    /// stored under `new` win; `old` is kept while another node reads it.
    fn rekey_signal(&mut self, old: &str, new: &str) {
        let shared = self.nodes.iter().any(|n| n.signal == old);
        let last = if shared {
            self.last_sample.get(old).copied()
        } else {
            self.last_sample.remove(old)
        };
        let last_final = if shared {
            self.final_orientations.get(old).copied()
        } else {
            self.final_orientations.remove(old)
        };
        if let Some(q) = last.filter(|_| !self.last_sample.contains(new)) {
            self.last_sample.insert(new, q);
        }
        if let Some(q) = last_final {
            self.final_orientations.entry(new.to_owned()).or_insert(q);
        }
        debug!("signal {old:?} remapped to {new:?}");
    }

    pub(crate) fn slot(&self, name: &str) -> Result<usize, ChainError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| ChainError::UnknownSegment(name.to_owned()))
    }

    /// Recompute the world position of the node at `slot` from its parent.
    pub(crate) fn place(&mut self, slot: usize) {
        let (done, rest) = self.nodes.split_at_mut(slot);
        let Some(node) = rest.first_mut() else {
            return;
        };
        node.position = match node.parent_slot {
            Some(p) => done[p].global_point(&node.position_in_parent),
            None => self.root_position,
        };
        if let Some(joint) = self.joints.get_mut(&node.name) {
            joint.position = node.anchor_global();
        }
        trace!("{} at {:?}", node.name, node.position.as_slice());
    }

    pub(crate) fn update_positions(&mut self) {
        for slot in 0..self.nodes.len() {
            self.place(slot);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinechain_core::{Axis, RotationError, vec3};
    use kinechain_spec::{ROOT_PARENT, SegmentSpec, TopologyError};
    use std::f64::consts::FRAC_PI_2;

    fn hip_knee() -> SegmentSet {
        SegmentSet::new()
            .with(SegmentSpec::new("knee", "hip").with_anchor([0.0; 3], [0.0, 5.0, 0.0]).with_position([0.0; 3], [0.0, -10.0, 0.0]))
            .with(SegmentSpec::new("hip", ROOT_PARENT))
    }

    #[test]
    fn hip_knee_rest_pose() {
        let chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        assert_eq!(chain.build_order().as_slice(), ["hip", "knee"]);

        let knee = chain.node("knee").unwrap();
        assert_relative_eq!(*knee.position(), vec3(0.0, -10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(*knee.position_in_parent(), vec3(0.0, -10.0, 0.0), epsilon = 1e-12);
        assert_eq!(knee.parent(), Some("hip"));
        assert!(chain.node("hip").unwrap().is_root());
    }

    #[test]
    fn joints_only_for_children() {
        let chain = Chain::build(&hip_knee(), vec3(1.0, 2.0, 3.0)).unwrap();
        assert!(chain.joint("hip").is_none());
        let joint = chain.joint("knee").unwrap();
        assert_eq!(joint.parent, "hip");
        assert_relative_eq!(joint.position, vec3(1.0, -8.0, 3.0), epsilon = 1e-12);
        assert_eq!(chain.joints().count(), 1);
    }

    #[test]
    fn unresolvable_topology_builds_nothing() {
        let set = SegmentSet::new()
            .with(SegmentSpec::new("a", "b"))
            .with(SegmentSpec::new("b", "a"));
        match Chain::build(&set, Vec3::zeros()) {
            Err(ChainError::Topology(TopologyError::Unresolvable { unresolved, .. })) => {
                assert_eq!(unresolved, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected topology error, got {other:?}"),
        }
    }

    #[test]
    fn parent_rest_orientation_rotates_children() {
        let set = SegmentSet::new()
            .with(SegmentSpec::new("base", ROOT_PARENT).with_orientation(Quaternion::about(FRAC_PI_2, Axis::Z).unwrap()))
            .with(SegmentSpec::new("arm", "base").with_position([0.0; 3], [2.0, 0.0, 0.0]));
        let chain = Chain::build(&set, Vec3::zeros()).unwrap();
        assert_relative_eq!(*chain.node("arm").unwrap().position(), vec3(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn bone_offset_applies_to_attach_point() {
        let set = SegmentSet::new()
            .with(SegmentSpec::new("base", ROOT_PARENT).with_bone_offset(Quaternion::about(FRAC_PI_2, Axis::Z).unwrap()))
            .with(SegmentSpec::new("arm", "base").with_position([0.0; 3], [2.0, 0.0, 0.0]));
        let chain = Chain::build(&set, Vec3::zeros()).unwrap();
        let arm = chain.node("arm").unwrap();
        assert_relative_eq!(*arm.position_in_parent(), vec3(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn set_bone_offset_refreshes_children() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.set_bone_offset("hip", Quaternion::about(FRAC_PI_2, Axis::Z).unwrap()).unwrap();
        let knee = chain.node("knee").unwrap();
        assert_relative_eq!(*knee.position(), vec3(10.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(chain.joint("knee").unwrap().position, vec3(10.0, 0.0, 0.0), epsilon = 1e-12);

        chain.clear_calibration();
        assert_relative_eq!(*chain.node("knee").unwrap().position(), vec3(0.0, -10.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn set_root_position_moves_everything() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.set_root_position(vec3(5.0, 5.0, 0.0));
        assert_relative_eq!(*chain.node("hip").unwrap().position(), vec3(5.0, 5.0, 0.0));
        assert_relative_eq!(*chain.node("knee").unwrap().position(), vec3(5.0, -5.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn setters_validate_names() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        assert_eq!(
            chain.set_heading("elbow", Quaternion::IDENTITY),
            Err(ChainError::UnknownSegment("elbow".into()))
        );
        assert!(chain.set_slider("elbow", Quaternion::IDENTITY).is_err());
        assert!(chain.set_bone_offset("elbow", Quaternion::IDENTITY).is_err());
        assert!(chain.set_heading_angle("knee", 0.3).is_ok());
        assert_eq!(chain.calibration().len(), 1);
    }

    #[test]
    fn slider_components_are_normalised() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.set_slider_components("knee", [2.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(chain.calibration().get("knee").slider, Quaternion::IDENTITY);
        assert!(matches!(
            chain.set_slider_components("knee", [0.0; 4]),
            Err(ChainError::Rotation(_))
        ));
    }

    #[test]
    fn set_calibration_rejects_unknown_names() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let mut state = CalibrationState::new();
        state.set_heading("knee", Quaternion::heading(0.2).unwrap());
        chain.set_calibration(state.clone()).unwrap();
        assert_eq!(chain.calibration(), &state);

        state.set_slider("ankle", Quaternion::IDENTITY);
        assert!(matches!(chain.set_calibration(state), Err(ChainError::UnknownSegment(n)) if n == "ankle"));
    }

    #[test]
    fn children_and_descendants() {
        let set = SegmentSet::new()
            .with(SegmentSpec::new("hip", ROOT_PARENT))
            .with(SegmentSpec::new("thigh", "hip"))
            .with(SegmentSpec::new("shin", "thigh"))
            .with(SegmentSpec::new("foot", "shin"))
            .with(SegmentSpec::new("back", "hip"));
        let chain = Chain::build(&set, Vec3::zeros()).unwrap();

        let mut children = chain.children("hip").unwrap();
        children.sort_unstable();
        assert_eq!(children, vec!["back", "thigh"]);

        let mut below = chain.descendants("thigh").unwrap();
        below.sort_unstable();
        assert_eq!(below, vec!["foot", "shin"]);

        assert!(chain.descendants("foot").unwrap().is_empty());
        assert!(chain.children("neck").is_err());
    }

    #[test]
    fn remap_signals_skips_unknown() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let applied = chain.remap_signals([("knee", "imu.2"), ("elbow", "imu.3")]);
        assert_eq!(applied, 1);
        assert_eq!(chain.node("knee").unwrap().signal(), "imu.2");
    }

    #[test]
    fn remap_moves_stored_orientations() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.remap_signals([("knee", "imu.2")]);
        assert!(chain.last_sample().get("knee").is_none());
        assert_eq!(chain.last_sample().get("imu.2"), Some(&Quaternion::IDENTITY));
        assert!(chain.final_orientations().contains_key("imu.2"));
        assert!(!chain.final_orientations().contains_key("knee"));
        assert!(chain.reapply().is_complete());
    }

    #[test]
    fn remap_keeps_signal_shared_with_another_node() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.remap_signals([("knee", "hip")]);
        chain.remap_signals([("knee", "imu.2")]);
        assert!(chain.last_sample().contains("hip"));
        assert!(chain.last_sample().contains("imu.2"));
        assert!(chain.reapply().is_complete());
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let config = EngineConfig {
            iteration_factor: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Chain::build_with_config(&hip_knee(), &config),
            Err(ChainError::Config(msg)) if msg.contains("iteration_factor")
        ));
        assert!(matches!(
            Chain::build(&hip_knee(), vec3(f64::NAN, 0.0, 0.0)),
            Err(ChainError::Config(msg)) if msg.contains("root_position")
        ));
    }

    #[test]
    fn heading_angle_rejects_non_finite() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        assert_eq!(
            chain.set_heading_angle("hip", f64::NAN),
            Err(ChainError::Rotation(RotationError::NonFinite))
        );
        assert!(chain.calibration().is_empty());
        chain.reapply();
        assert!(chain.node("knee").unwrap().position().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn rest_orientations_seed_outputs() {
        let chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        assert_eq!(chain.final_orientations().len(), 2);
        assert_eq!(chain.last_sample().get("knee"), Some(&Quaternion::IDENTITY));
    }

    #[test]
    fn global_point_query() {
        let chain = Chain::build(&hip_knee(), vec3(0.0, 0.0, 1.0)).unwrap();
        let p = chain.global_point("knee", &vec3(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(p, vec3(1.0, -10.0, 1.0), epsilon = 1e-12);
        assert!(chain.global_point("elbow", &Vec3::zeros()).is_err());
    }

    #[test]
    fn every_root_at_root_position() {
        let set = SegmentSet::new()
            .with(SegmentSpec::new("a", ROOT_PARENT))
            .with(SegmentSpec::new("b", ROOT_PARENT));
        let chain = Chain::build(&set, vec3(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(chain.roots().count(), 2);
        for root in chain.roots() {
            assert_relative_eq!(*root.position(), vec3(1.0, 1.0, 1.0));
        }
    }
}
