//! Per-segment calibration offsets.
//!
//! A raw sensor orientation `raw` becomes the segment's world orientation as
//!
//! ```text
//! final = heading * (raw * slider)
//! ```
//!
//! The slider corrects sensor-to-segment mounting and is applied first. The
//! heading is a yaw reset in the world frame and is applied last, so it acts
//! the same way whatever the sensor reports.

use std::collections::BTreeMap;

use kinechain_core::Quaternion;
use serde::{Deserialize, Serialize};

/// Calibration of one segment. Both offsets default to identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentCalibration {
    #[serde(default)]
    pub heading: Quaternion,
    #[serde(default)]
    pub slider: Quaternion,
}

impl SegmentCalibration {
    /// Apply this calibration to a raw orientation.
    pub fn compose(&self, raw: &Quaternion) -> Quaternion {
        self.heading * (*raw * self.slider)
    }

    pub fn is_identity(&self) -> bool {
        self.heading == Quaternion::IDENTITY && self.slider == Quaternion::IDENTITY
    }
}

/// Calibration for every tuned segment, keyed by segment name.
///
/// Segments without an entry use identity offsets. Serialises as a JSON
/// object `{ "knee": { "heading": [w, x, y, z], "slider": [...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationState {
    segments: BTreeMap<String, SegmentCalibration>,
}

impl CalibrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibration for `name`, identity when untouched.
    pub fn get(&self, name: &str) -> SegmentCalibration {
        self.segments.get(name).copied().unwrap_or_default()
    }

    /// Mutable entry for `name`, created on first access.
    pub fn entry(&mut self, name: &str) -> &mut SegmentCalibration {
        self.segments.entry(name.to_owned()).or_default()
    }

    pub fn set_heading(&mut self, name: &str, heading: Quaternion) {
        self.entry(name).heading = heading;
    }

    pub fn set_slider(&mut self, name: &str, slider: Quaternion) {
        self.entry(name).slider = slider;
    }

    /// `heading * (raw * slider)` for `name`.
    pub fn compose(&self, name: &str, raw: &Quaternion) -> Quaternion {
        self.get(name).compose(raw)
    }

    /// Drop the entry for `name`.
    pub fn reset(&mut self, name: &str) -> Option<SegmentCalibration> {
        self.segments.remove(name)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Segment names with an entry.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SegmentCalibration)> {
        self.segments.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
