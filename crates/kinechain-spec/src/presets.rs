//! Built-in segment sets.
//!
//! `offset` is the gap between neighbouring boxes, normally the joint
//! diameter from [`EngineConfig`](kinechain_core::EngineConfig).

use std::f64::consts::FRAC_PI_2;

use kinechain_core::{Axis, Quaternion};

use crate::types::{ROOT_PARENT, SegmentSet, SegmentSpec};

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: [&str; 3] = ["human", "knee", "ankle"];

/// Look up a preset by name.
pub fn by_name(name: &str, offset: f64) -> Option<SegmentSet> {
    match name {
        "human" => Some(human(offset)),
        "knee" => Some(knee()),
        "ankle" => Some(ankle(offset)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Human body
// ---------------------------------------------------------------------------

struct Limb {
    name: &'static str,
    parent: &'static str,
    dimensions: [f64; 3],
    anchor_rel: [f64; 3],
    /// Multiplied by `offset`.
    anchor_abs: [f64; 3],
    position_rel: [f64; 3],
    /// Multiplied by `offset`.
    position_abs: [f64; 3],
    color: &'static str,
}

const HANGING: [f64; 3] = [0.0, 0.5, 0.0];
const BELOW: [f64; 3] = [0.0, -1.0, 0.0];
const STANDING: [f64; 3] = [0.0, -0.5, 0.0];
const ABOVE: [f64; 3] = [0.0, 1.0, 0.0];

#[rustfmt::skip]
const HUMAN_LIMBS: [Limb; 15] = [
    Limb { name: "upper_leg_left",  parent: "hip",             dimensions: [3.0, 12.0, 3.0], anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: [0.0, -0.5, -0.5], position_abs: [0.0, -0.5, 0.5],  color: "red" },
    Limb { name: "lower_leg_left",  parent: "upper_leg_left",  dimensions: [3.0, 12.0, 3.0], anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "red" },
    Limb { name: "foot_left",       parent: "lower_leg_left",  dimensions: [6.0, 3.0, 3.0],  anchor_rel: [-0.5, 0.5, 0.0], anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "red" },
    Limb { name: "upper_leg_right", parent: "hip",             dimensions: [3.0, 12.0, 3.0], anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: [0.0, -0.5, 0.5],  position_abs: [0.0, -0.5, -0.5], color: "green" },
    Limb { name: "lower_leg_right", parent: "upper_leg_right", dimensions: [3.0, 12.0, 3.0], anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "green" },
    Limb { name: "foot_right",      parent: "lower_leg_right", dimensions: [6.0, 3.0, 3.0],  anchor_rel: [-0.5, 0.5, 0.0], anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "green" },
    Limb { name: "lower_back",      parent: "hip",             dimensions: [3.0, 6.0, 6.0],  anchor_rel: STANDING,         anchor_abs: STANDING,         position_rel: [0.0, 0.5, 0.0],   position_abs: [0.0, 0.5, 0.0],  color: "blue" },
    Limb { name: "upper_back",      parent: "lower_back",      dimensions: [3.0, 9.0, 9.0],  anchor_rel: STANDING,         anchor_abs: STANDING,         position_rel: ABOVE,             position_abs: ABOVE,            color: "blue" },
    Limb { name: "upper_arm_left",  parent: "upper_back",      dimensions: [3.0, 9.0, 3.0],  anchor_rel: HANGING,          anchor_abs: [0.0, 0.5, 0.5],  position_rel: [0.0, 1.0, -0.5],  position_abs: [0.0, 0.0, -0.5], color: "red" },
    Limb { name: "lower_arm_left",  parent: "upper_arm_left",  dimensions: [3.0, 7.5, 3.0],  anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: [0.0, -1.0, -0.5], position_abs: BELOW,            color: "red" },
    Limb { name: "hand_left",       parent: "lower_arm_left",  dimensions: [3.0, 3.0, 3.0],  anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "red" },
    Limb { name: "upper_arm_right", parent: "upper_back",      dimensions: [3.0, 9.0, 3.0],  anchor_rel: HANGING,          anchor_abs: [0.0, 0.5, -0.5], position_rel: [0.0, 1.0, 0.5],   position_abs: [0.0, 0.0, 0.5],  color: "green" },
    Limb { name: "lower_arm_right", parent: "upper_arm_right", dimensions: [3.0, 7.5, 3.0],  anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: [0.0, -1.0, 0.5],  position_abs: BELOW,            color: "green" },
    Limb { name: "hand_right",      parent: "lower_arm_right", dimensions: [3.0, 3.0, 3.0],  anchor_rel: HANGING,          anchor_abs: HANGING,          position_rel: BELOW,             position_abs: BELOW,            color: "green" },
    Limb { name: "head",            parent: "upper_back",      dimensions: [3.0, 7.5, 4.5],  anchor_rel: STANDING,         anchor_abs: STANDING,         position_rel: ABOVE,             position_abs: ABOVE,            color: "blue" },
];

fn scaled(v: [f64; 3], offset: f64) -> [f64; 3] {
    v.map(|c| c * offset)
}

/// Rest orientation shared by every built-in segment: a quarter turn
/// about x. Samples replace it once they arrive.
pub fn rest_orientation() -> Quaternion {
    Quaternion::about(FRAC_PI_2, Axis::X).unwrap_or_default()
}

/// Sixteen-segment body rooted at `hip`, legs hanging along -y.
pub fn human(offset: f64) -> SegmentSet {
    let hip = SegmentSpec::new("hip", ROOT_PARENT)
        .with_dimensions([3.0, 6.0, 9.0])
        .with_orientation(rest_orientation())
        .with_color("blue");

    std::iter::once(hip)
        .chain(HUMAN_LIMBS.iter().map(|limb| {
            SegmentSpec::new(limb.name, limb.parent)
                .with_dimensions(limb.dimensions)
                .with_anchor(limb.anchor_rel, scaled(limb.anchor_abs, offset))
                .with_position(limb.position_rel, scaled(limb.position_abs, offset))
                .with_orientation(rest_orientation())
                .with_color(limb.color)
        }))
        .collect()
}

// ---------------------------------------------------------------------------
// Two-segment rigs
// ---------------------------------------------------------------------------

/// Two hanging segments driven by `quat1` and `quat2`.
pub fn knee() -> SegmentSet {
    let seg1 = SegmentSpec::new("seg1", ROOT_PARENT)
        .with_dimensions([3.0, 15.0, 3.0])
        .with_anchor(HANGING, [0.0, 1.5, 0.0])
        .with_orientation(rest_orientation())
        .with_signal("quat1")
        .with_color("red");
    let seg2 = SegmentSpec::new("seg2", "seg1")
        .with_dimensions([3.0, 10.0, 3.0])
        .with_anchor(HANGING, [0.0, 1.5, 0.0])
        .with_position(BELOW, [0.0, -3.0, 0.0])
        .with_orientation(rest_orientation())
        .with_signal("quat2")
        .with_color("green");
    SegmentSet::new().with(seg1).with(seg2)
}

/// Shank and foot driven by `quat1` and `quat2`.
pub fn ankle(offset: f64) -> SegmentSet {
    let seg1 = SegmentSpec::new("seg1", ROOT_PARENT)
        .with_dimensions([3.0, 12.0, 3.0])
        .with_anchor(HANGING, scaled(HANGING, offset))
        .with_orientation(rest_orientation())
        .with_signal("quat1")
        .with_color("red");
    let seg2 = SegmentSpec::new("seg2", "seg1")
        .with_dimensions([6.0, 3.0, 3.0])
        .with_anchor([-0.5, 0.5, 0.0], scaled(HANGING, offset))
        .with_position(BELOW, scaled(BELOW, offset))
        .with_orientation(rest_orientation())
        .with_signal("quat2")
        .with_color("green");
    SegmentSet::new().with(seg1).with(seg2)
}

/// Template for a segment of a mechanical arm: a 3x3x16 bar that rotates
/// about one end and carries its child at the other.
pub fn mechanical_segment(name: &str, parent: &str, offset: f64) -> SegmentSpec {
    SegmentSpec::new(name, parent)
        .with_dimensions([3.0, 3.0, 16.0])
        .with_anchor([-0.5, 0.0, 0.0], [-0.5 * offset, 0.0, 0.0])
        .with_position([1.0, 0.0, 0.0], [offset, 0.0, 0.0])
        .with_orientation(rest_orientation())
        .with_color("red")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use approx::assert_relative_eq;

    #[test]
    fn human_resolves_from_hip() {
        let set = human(3.0);
        assert_eq!(set.len(), 16);
        let order = resolve(&set).unwrap();
        assert_eq!(order.as_slice()[0], "hip");
        assert_eq!(order.roots(), ["hip"]);
    }

    #[test]
    fn human_is_mirror_symmetric() {
        let set = human(3.0);
        for (left, right) in [
            ("upper_leg_left", "upper_leg_right"),
            ("lower_arm_left", "lower_arm_right"),
            ("upper_arm_left", "upper_arm_right"),
        ] {
            let l = set.get(left).unwrap();
            let r = set.get(right).unwrap();
            let pl = l.attachment(&[3.0, 6.0, 9.0]);
            let pr = r.attachment(&[3.0, 6.0, 9.0]);
            assert_relative_eq!(pl.y, pr.y);
            assert_relative_eq!(pl.z, -pr.z);
            assert_relative_eq!(l.anchor().z, -r.anchor().z);
        }
    }

    #[test]
    fn human_offsets_scale() {
        let thigh = human(2.0).get("upper_leg_left").cloned().unwrap();
        // 12 * 0.5 + 2 * 0.5
        assert_relative_eq!(thigh.anchor().y, 7.0);
    }

    #[test]
    fn knee_signals() {
        let set = knee();
        assert_eq!(set.get("seg1").unwrap().signal_key(), "quat1");
        assert_eq!(set.get("seg2").unwrap().signal_key(), "quat2");
        let seg2 = set.get("seg2").unwrap();
        assert_relative_eq!(seg2.attachment(&[3.0, 15.0, 3.0]).y, -18.0);
        assert_eq!(resolve(&set).unwrap().as_slice(), ["seg1", "seg2"]);
    }

    #[test]
    fn ankle_foot_hangs_below_shank() {
        let set = ankle(3.0);
        let foot = set.get("seg2").unwrap();
        assert_relative_eq!(foot.attachment(&[3.0, 12.0, 3.0]).y, -15.0);
        assert_relative_eq!(foot.anchor().x, -3.0);
    }

    #[test]
    fn mechanical_template_geometry() {
        let seg = mechanical_segment("link1", ROOT_PARENT, 3.0);
        assert_relative_eq!(seg.anchor().x, -3.0);
        assert_relative_eq!(seg.attachment(&[3.0, 3.0, 16.0]).x, 6.0);
        assert_relative_eq!(seg.orientation.angle(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn presets_rest_at_quarter_turn_about_x() {
        let expected = Quaternion::new(1.0, 1.0, 0.0, 0.0).unwrap();
        for name in PRESET_NAMES {
            for spec in by_name(name, 3.0).unwrap().iter() {
                assert_relative_eq!(spec.orientation.angle_to(&expected), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        for name in PRESET_NAMES {
            assert!(by_name(name, 3.0).is_some(), "{name}");
        }
        assert!(by_name("drone", 3.0).is_none());
    }
}
