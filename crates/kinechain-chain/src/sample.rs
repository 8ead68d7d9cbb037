//! Orientation samples keyed by signal path.
//!
//! JSON input may nest objects; nested keys are joined with `.`:
//!
//! ```json
//! { "quat1": [1, 0, 0, 0], "imu": { "left": [0.7, 0.7, 0, 0] } }
//! ```
//!
//! yields the signals `quat1` and `imu.left`. Scalar fields such as a
//! timestamp `t` are not signals and are skipped.

use std::collections::BTreeMap;

use kinechain_core::Quaternion;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SampleError;

/// Raw orientations for one instant, keyed by signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    signals: BTreeMap<String, Quaternion>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, signal: impl Into<String>, orientation: Quaternion) -> Option<Quaternion> {
        self.signals.insert(signal.into(), orientation)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, signal: impl Into<String>, orientation: Quaternion) -> Self {
        self.insert(signal, orientation);
        self
    }

    pub fn get(&self, signal: &str) -> Option<&Quaternion> {
        self.signals.get(signal)
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.signals.contains_key(signal)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quaternion)> {
        self.signals.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn remove(&mut self, signal: &str) -> Option<Quaternion> {
        self.signals.remove(signal)
    }

    /// Parse a JSON sample, flattening nested objects into dotted keys.
    ///
    /// Bad leaves are logged and left out; see [`decode`](Self::decode).
    pub fn from_json_str(json: &str) -> Result<Self, SampleError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, SampleError> {
        let (sample, rejected) = Self::decode(value)?;
        for err in &rejected {
            warn!("{err}; signal dropped from sample");
        }
        Ok(sample)
    }

    /// Decode a JSON sample, returning the leaves that could not be used
    /// alongside the signals that could.
    ///
    /// Scalar leaves (numbers, strings, booleans, null) are metadata such
    /// as a timestamp `t` and are skipped. A leaf that is an array but not
    /// a usable `[w, x, y, z]` quaternion is rejected on its own, so its
    /// segment falls back to the missing-signal path while every other
    /// signal is kept. Only a parse failure or a non-object top level fails
    /// the whole sample.
    pub fn decode(value: &Value) -> Result<(Self, Vec<SampleError>), SampleError> {
        let Value::Object(entries) = value else {
            return Err(SampleError::NotAnObject);
        };
        let mut sample = Self::new();
        let mut rejected = Vec::new();
        for (key, entry) in entries {
            sample.collect(key.clone(), entry, &mut rejected);
        }
        Ok((sample, rejected))
    }

    fn collect(&mut self, key: String, value: &Value, rejected: &mut Vec<SampleError>) {
        match value {
            Value::Object(entries) => {
                for (child, entry) in entries {
                    self.collect(format!("{key}.{child}"), entry, rejected);
                }
            }
            Value::Array(items) => {
                let Some(components) = quaternion_components(items) else {
                    rejected.push(SampleError::InvalidLeaf {
                        key,
                        found: value.to_string(),
                    });
                    return;
                };
                match Quaternion::from_array(components) {
                    Ok(q) => {
                        self.signals.insert(key, q);
                    }
                    Err(source) => rejected.push(SampleError::Rotation { key, source }),
                }
            }
            other => debug!("sample field {key:?} = {other} is not a signal"),
        }
    }
}

fn quaternion_components(items: &[Value]) -> Option<[f64; 4]> {
    match items {
        [w, x, y, z] => Some([w.as_f64()?, x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}

impl FromIterator<(String, Quaternion)> for Sample {
    fn from_iter<I: IntoIterator<Item = (String, Quaternion)>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
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
    use kinechain_core::RotationError;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn flat_sample() {
        let s = Sample::from_json_str(r#"{ "quat1": [1, 0, 0, 0], "quat2": [0, 0, 0, 2] }"#).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("quat1"), Some(&Quaternion::IDENTITY));
        assert_relative_eq!(s.get("quat2").unwrap().z(), 1.0);
    }

    #[test]
    fn nested_keys_are_dotted() {
        let s = Sample::from_json_str(r#"{ "imu": { "left": [1, 1, 0, 0], "right": { "q": [1, 0, 0, 0] } } }"#)
            .unwrap();
        assert!(s.contains("imu.left"));
        assert!(s.contains("imu.right.q"));
        assert!(!s.contains("imu"));
        assert_relative_eq!(s.get("imu.left").unwrap().w(), FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn scalar_fields_are_metadata() {
        let s = Sample::from_json_str(r#"{ "t": 0.25, "hip": [1, 0, 0, 0], "knee": [1, 0, 0, 0], "tag": "walk" }"#)
            .unwrap();
        assert_eq!(s.len(), 2);
        assert!(s.contains("hip"));
        assert!(s.contains("knee"));
        assert!(!s.contains("t"));
    }

    #[test]
    fn malformed_arrays_are_rejected_individually() {
        let value: Value = serde_json::from_str(r#"{ "a": [1, 0, 0], "b": [1, 0, "x", 0], "c": [0, 0, 1, 0] }"#).unwrap();
        let (s, rejected) = Sample::decode(&value).unwrap();
        assert_eq!(s.len(), 1);
        assert!(s.contains("c"));
        assert_eq!(rejected.len(), 2);
        assert!(matches!(&rejected[0], SampleError::InvalidLeaf { key, .. } if key == "a"));
        assert!(matches!(&rejected[1], SampleError::InvalidLeaf { key, .. } if key == "b"));
    }

    #[test]
    fn zero_quaternion_keeps_other_signals() {
        let value: Value =
            serde_json::from_str(r#"{ "hip": [0.7, 0.7, 0, 0], "leg": { "knee": [0, 0, 0, 0] } }"#).unwrap();
        let (s, rejected) = Sample::decode(&value).unwrap();
        assert!(s.contains("hip"));
        assert!(!s.contains("leg.knee"));
        assert!(matches!(
            rejected.as_slice(),
            [SampleError::Rotation { key, source: RotationError::ZeroNorm }] if key == "leg.knee"
        ));
    }

    #[test]
    fn remove_drops_signal() {
        let mut s = Sample::new().with("a", Quaternion::IDENTITY);
        assert_eq!(s.remove("a"), Some(Quaternion::IDENTITY));
        assert!(s.is_empty());
        assert_eq!(s.remove("a"), None);
    }

    #[test]
    fn top_level_must_be_object() {
        assert!(matches!(Sample::from_json_str("[1, 0, 0, 0]"), Err(SampleError::NotAnObject)));
        assert!(matches!(Sample::from_json_str("{"), Err(SampleError::Parse(_))));
    }

    #[test]
    fn builder_and_iter() {
        let s = Sample::new()
            .with("b", Quaternion::IDENTITY)
            .with("a", Quaternion::heading(0.1).unwrap());
        let keys: Vec<_> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
