//! Per-sample pose propagation.

use std::collections::BTreeMap;

use kinechain_core::Quaternion;
use log::{debug, warn};
use serde::Serialize;

use crate::chain::Chain;
use crate::sample::Sample;

/// Outcome of one [`Chain::apply_sample`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoseReport {
    /// Segments whose signal was absent, in build order. They were posed
    /// with an identity raw orientation.
    pub missing: Vec<String>,
    /// Composed orientation per signal key, when enabled in the config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_orientations: Option<BTreeMap<String, Quaternion>>,
}

impl PoseReport {
    /// Whether every segment found its signal.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Chain {
    /// Pose every node from `sample`, parents first.
    ///
    /// Each node's orientation becomes `heading * (raw * slider)` for its
    /// calibration, then its position is recomputed from the already
    /// updated parent. A missing signal never aborts the pass.
    pub fn apply_sample(&mut self, sample: &Sample) -> PoseReport {
        let mut missing = Vec::new();

        for slot in 0..self.nodes.len() {
            let node = &self.nodes[slot];
            let raw = if let Some(q) = sample.get(&node.signal) {
                *q
            } else {
                if self.config.warn_missing_signal {
                    warn!(
                        "sample has no signal {:?} for segment {:?}, using identity",
                        node.signal, node.name
                    );
                }
                missing.push(node.name.clone());
                Quaternion::IDENTITY
            };

            let orientation = self.calibration.compose(&node.name, &raw);
            self.final_orientations.insert(node.signal.clone(), orientation);
            self.nodes[slot].orientation = orientation;
            self.place(slot);
        }

        self.last_sample = sample.clone();
        if !missing.is_empty() {
            debug!("posed {} segments, {} without signal", self.nodes.len(), missing.len());
        }

        PoseReport {
            missing,
            final_orientations: self
                .config
                .emit_final_orientations
                .then(|| self.final_orientations.clone()),
        }
    }

    /// Apply the last sample again, e.g. after a calibration change.
    pub fn reapply(&mut self) -> PoseReport {
        let sample = self.last_sample.clone();
        self.apply_sample(&sample)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinechain_core::{Axis, EngineConfig, Vec3, vec3};
    use kinechain_spec::{ROOT_PARENT, SegmentSet, SegmentSpec};
    use std::f64::consts::FRAC_PI_2;

    fn hip_knee() -> SegmentSet {
        SegmentSet::new()
            .with(SegmentSpec::new("hip", ROOT_PARENT))
            .with(
                SegmentSpec::new("knee", "hip")
                    .with_anchor([0.0; 3], [0.0, 5.0, 0.0])
                    .with_position([0.0; 3], [0.0, -10.0, 0.0]),
            )
    }

    fn identity_sample() -> Sample {
        Sample::new()
            .with("hip", Quaternion::IDENTITY)
            .with("knee", Quaternion::IDENTITY)
    }

    #[test]
    fn identity_sample_keeps_rest_offsets() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let report = chain.apply_sample(&identity_sample());
        assert!(report.is_complete());
        let knee = chain.node("knee").unwrap();
        assert_relative_eq!(*knee.position(), vec3(0.0, -10.0, 0.0), epsilon = 1e-12);
        assert_eq!(*knee.orientation(), Quaternion::IDENTITY);
    }

    #[test]
    fn parent_rotation_carries_child() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let sample = identity_sample().with("hip", Quaternion::about(FRAC_PI_2, Axis::X).unwrap());
        chain.apply_sample(&sample);
        let knee = chain.node("knee").unwrap();
        // (0, -10, 0) turned a quarter about x lands on -z.
        assert_relative_eq!(*knee.position(), vec3(0.0, 0.0, -10.0), epsilon = 1e-12);
        assert_relative_eq!(chain.joint("knee").unwrap().position, vec3(0.0, 0.0, -10.0), epsilon = 1e-12);
        assert_eq!(*knee.orientation(), Quaternion::IDENTITY);
    }

    #[test]
    fn missing_signal_degrades_to_identity() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let hip_q = Quaternion::about(0.4, Axis::Y).unwrap();
        let report = chain.apply_sample(&Sample::new().with("hip", hip_q));
        assert_eq!(report.missing, vec!["knee".to_string()]);
        assert_eq!(*chain.node("knee").unwrap().orientation(), Quaternion::IDENTITY);
        assert_eq!(*chain.node("hip").unwrap().orientation(), hip_q);
    }

    #[test]
    fn bad_json_leaf_only_affects_its_segment() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let sample = Sample::from_json_str(r#"{ "t": 1.5, "hip": [0.7, 0.7, 0, 0], "knee": [0, 0, 0, 0] }"#).unwrap();
        let report = chain.apply_sample(&sample);
        assert_eq!(report.missing, vec!["knee".to_string()]);
        assert_relative_eq!(chain.node("hip").unwrap().orientation().angle(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(*chain.node("knee").unwrap().position(), vec3(0.0, 0.0, -10.0), epsilon = 1e-12);
    }

    #[test]
    fn missing_signal_still_reported_when_quiet() {
        let config = EngineConfig {
            warn_missing_signal: false,
            emit_final_orientations: false,
            ..EngineConfig::default()
        };
        let mut chain = Chain::build_with_config(&hip_knee(), &config).unwrap();
        let report = chain.apply_sample(&Sample::new());
        assert_eq!(report.missing.len(), 2);
        assert!(report.final_orientations.is_none());
    }

    #[test]
    fn heading_only_touches_its_segment() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let sample = identity_sample()
            .with("hip", Quaternion::about(0.3, Axis::X).unwrap())
            .with("knee", Quaternion::about(-0.6, Axis::X).unwrap());
        chain.apply_sample(&sample);
        let hip_before = *chain.node("hip").unwrap().orientation();
        let knee_before = *chain.node("knee").unwrap().orientation();

        chain.set_heading_angle("knee", 0.9).unwrap();
        let report = chain.reapply();

        assert_eq!(*chain.node("hip").unwrap().orientation(), hip_before);
        assert_eq!(chain.last_sample().get("knee"), sample.get("knee"));
        let knee_after = *chain.node("knee").unwrap().orientation();
        assert_relative_eq!(knee_before.angle_to(&knee_after), 0.9, epsilon = 1e-10);
        let finals = report.final_orientations.unwrap();
        assert_eq!(finals.get("knee"), Some(&knee_after));
    }

    #[test]
    fn slider_is_applied_before_raw() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        let raw = Quaternion::about(FRAC_PI_2, Axis::Z).unwrap();
        let slider = Quaternion::about(FRAC_PI_2, Axis::X).unwrap();
        chain.set_slider("hip", slider).unwrap();
        chain.apply_sample(&identity_sample().with("hip", raw));
        let hip = *chain.node("hip").unwrap().orientation();
        let v = vec3(0.0, 1.0, 0.0);
        assert_relative_eq!(hip.rotate(&v), raw.rotate(&slider.rotate(&v)), epsilon = 1e-12);
    }

    #[test]
    fn shared_signal_drives_both_segments() {
        let mut chain = Chain::build(&hip_knee(), Vec3::zeros()).unwrap();
        chain.remap_signals([("knee", "hip")]);
        let q = Quaternion::about(0.5, Axis::Z).unwrap();
        let report = chain.apply_sample(&Sample::new().with("hip", q));
        assert!(report.is_complete());
        assert_eq!(*chain.node("knee").unwrap().orientation(), q);
    }
}
