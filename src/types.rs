use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number of landmarks in a standard face mesh detection.
pub const FACE_LANDMARK_COUNT: usize = 468;

/// Number of face landmarks when the detector refines iris points (468 + 2x5).
pub const REFINED_FACE_LANDMARK_COUNT: usize = 478;

/// Number of landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Number of landmarks in a body pose detection.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// A single tracked 3D point in normalized image/world space.
///
/// `x` and `y` are in [0,1] image coordinates (y increases downward);
/// `z` is relative depth (negative = toward the camera).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Euclidean distance in the image plane (z ignored).
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Midpoint between two landmarks.
    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

impl std::ops::Add for Landmark {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Landmark {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::Mul<f32> for Landmark {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

/// Immutable snapshot of one video frame's detector output.
///
/// Each slot is `None` when the detector reported no result for that body
/// part. Frames are ephemeral: they are consumed by one analyzer pass and
/// dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Face mesh landmarks (468, or 478 with refined iris points).
    pub face: Option<Vec<Landmark>>,
    /// Left hand landmarks (21).
    pub left_hand: Option<Vec<Landmark>>,
    /// Right hand landmarks (21).
    pub right_hand: Option<Vec<Landmark>>,
    /// Body pose landmarks (33).
    pub pose: Option<Vec<Landmark>>,
    /// Detector timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: f64,
}

impl LandmarkFrame {
    /// A detected face with at least the full 468-point mesh.
    pub fn has_full_face(&self) -> bool {
        self.face
            .as_ref()
            .map(|f| f.len() >= FACE_LANDMARK_COUNT)
            .unwrap_or(false)
    }

    /// Whether the face set includes refined iris landmarks.
    pub fn has_iris(&self) -> bool {
        self.face
            .as_ref()
            .map(|f| f.len() >= REFINED_FACE_LANDMARK_COUNT)
            .unwrap_or(false)
    }
}

/// Load a JSON landmark recording (an array of frames) from disk.
pub fn load_recording(path: &Path) -> Result<Vec<LandmarkFrame>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Angle at the middle joint of three points, in degrees (180 = straight).
pub fn joint_angle(a: Landmark, b: Landmark, c: Landmark) -> f32 {
    let ba = a - b;
    let bc = c - b;
    let dot = ba.x * bc.x + ba.y * bc.y + ba.z * bc.z;
    let mag = ((ba.x * ba.x + ba.y * ba.y + ba.z * ba.z)
        * (bc.x * bc.x + bc.y * bc.y + bc.z * bc.z))
        .sqrt();
    if mag < 1e-6 {
        return 180.0;
    }
    (dot / mag).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_arithmetic() {
        let a = Landmark::new(1.0, 2.0, 3.0);
        let b = Landmark::new(4.0, 6.0, 3.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 8.0);

        let diff = b - a;
        assert_eq!(diff.x, 3.0);
        assert_eq!(diff.y, 4.0);

        assert!((a.distance_2d(&b) - 5.0).abs() < 1e-6);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn midpoint_is_halfway() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(1.0, 2.0, 4.0);
        let m = a.midpoint(&b);
        assert_eq!(m.x, 0.5);
        assert_eq!(m.y, 1.0);
        assert_eq!(m.z, 2.0);
    }

    #[test]
    fn frame_face_presence() {
        let mut frame = LandmarkFrame::default();
        assert!(!frame.has_full_face());

        frame.face = Some(vec![Landmark::zero(); 100]);
        assert!(!frame.has_full_face());

        frame.face = Some(vec![Landmark::zero(); FACE_LANDMARK_COUNT]);
        assert!(frame.has_full_face());
        assert!(!frame.has_iris());

        frame.face = Some(vec![Landmark::zero(); REFINED_FACE_LANDMARK_COUNT]);
        assert!(frame.has_iris());
    }

    #[test]
    fn recording_loads_from_disk() {
        let path = std::env::temp_dir().join("mimic-rig-recording-test.json");
        let frames = vec![LandmarkFrame::default(), LandmarkFrame::default()];
        std::fs::write(&path, serde_json::to_string(&frames).unwrap()).unwrap();

        let loaded = load_recording(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        std::fs::remove_file(&path).ok();

        assert!(load_recording(Path::new("/nonexistent/recording.json")).is_err());
    }

    #[test]
    fn joint_angle_straight_and_right() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(1.0, 0.0, 0.0);
        let c = Landmark::new(2.0, 0.0, 0.0);
        assert!((joint_angle(a, b, c) - 180.0).abs() < 0.01);

        let c_up = Landmark::new(1.0, 1.0, 0.0);
        assert!((joint_angle(a, b, c_up) - 90.0).abs() < 0.01);
    }
}
