//! Hand gesture and body posture analysis.
//!
//! Hand gestures come from counting extended fingers (tip above its proximal
//! joint in the vertical axis); posture comes from the signed angle between
//! the shoulder-midpoint-to-hip-midpoint line and vertical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::indices::{hand, pose};
use crate::types::{joint_angle, Landmark, HAND_LANDMARK_COUNT, LandmarkFrame, POSE_LANDMARK_COUNT};

/// Closed gesture vocabulary. Each classification carries a fixed confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandGesture {
    Open,
    Fist,
    Point,
    Peace,
    Partial,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandSignal {
    pub detected: bool,
    pub landmark_count: usize,
    pub gesture: HandGesture,
    pub confidence: f32,
}

/// Posture buckets from torso lean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Upright,
    LeaningLeft,
    LeaningRight,
    Neutral,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodySignal {
    pub posture: Posture,
    pub confidence: f32,
    /// Signed torso lean in degrees; positive leans toward the subject's left.
    pub lean_deg: f32,
    /// Named joint angles in degrees (180 = straight).
    pub joint_angles: BTreeMap<String, f32>,
}

/// Per-frame gesture/pose bundle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureSignal {
    pub left_hand: HandSignal,
    pub right_hand: HandSignal,
    pub body: BodySignal,
}

/// Lean within this many degrees of vertical is upright.
pub const UPRIGHT_TOLERANCE_DEG: f32 = 10.0;
/// Lean between the upright tolerance and this bound is the transitional
/// `Neutral` bucket; beyond it is a definite lean.
pub const NEUTRAL_TOLERANCE_DEG: f32 = 15.0;

const CONF_OPEN: f32 = 0.9;
const CONF_FIST: f32 = 0.9;
const CONF_POINT: f32 = 0.85;
const CONF_PEACE: f32 = 0.85;
const CONF_PARTIAL: f32 = 0.6;
const CONF_UPRIGHT: f32 = 0.9;
const CONF_LEANING: f32 = 0.8;
const CONF_NEUTRAL: f32 = 0.6;

/// Classify a 21-point hand. Fewer landmarks yield an undetected signal.
pub fn analyze_hand(landmarks: &[Landmark]) -> HandSignal {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return HandSignal {
            detected: false,
            landmark_count: landmarks.len(),
            gesture: HandGesture::None,
            confidence: 0.0,
        };
    }

    // A finger counts as extended when its tip sits above its proximal
    // joint (y increases downward).
    let extended: Vec<bool> = hand::FINGERS
        .iter()
        .map(|&(tip, pip)| landmarks[tip].y < landmarks[pip].y)
        .collect();
    let count = extended.iter().filter(|e| **e).count();

    // The vertical test is unreliable for thumbs; use lateral distance from
    // the wrist instead, and only to split `open` from `partial`.
    let wrist_x = landmarks[hand::WRIST].x;
    let thumb_out = (landmarks[hand::THUMB_TIP].x - wrist_x).abs()
        > (landmarks[hand::THUMB_MCP].x - wrist_x).abs() * 1.2;

    let (gesture, confidence) = match count {
        0 => (HandGesture::Fist, CONF_FIST),
        1 if extended[0] => (HandGesture::Point, CONF_POINT),
        2 if extended[0] && extended[1] => (HandGesture::Peace, CONF_PEACE),
        4 if thumb_out => (HandGesture::Open, CONF_OPEN),
        _ => (HandGesture::Partial, CONF_PARTIAL),
    };

    HandSignal {
        detected: true,
        landmark_count: landmarks.len(),
        gesture,
        confidence,
    }
}

/// Classify a 33-point body pose into a posture bucket plus joint angles.
pub fn analyze_pose(landmarks: &[Landmark]) -> BodySignal {
    if landmarks.len() < POSE_LANDMARK_COUNT {
        return BodySignal::default();
    }

    let shoulder_mid =
        landmarks[pose::LEFT_SHOULDER].midpoint(&landmarks[pose::RIGHT_SHOULDER]);
    let hip_mid = landmarks[pose::LEFT_HIP].midpoint(&landmarks[pose::RIGHT_HIP]);

    // Signed angle of the hip→shoulder line against vertical; positive =
    // leaning toward the subject's left.
    let dx = shoulder_mid.x - hip_mid.x;
    let dy = hip_mid.y - shoulder_mid.y; // positive when shoulders are above hips
    let lean_deg = dx.atan2(dy.max(1e-4)).to_degrees();

    let (posture, confidence) = if lean_deg.abs() <= UPRIGHT_TOLERANCE_DEG {
        (Posture::Upright, CONF_UPRIGHT)
    } else if lean_deg.abs() <= NEUTRAL_TOLERANCE_DEG {
        (Posture::Neutral, CONF_NEUTRAL)
    } else if lean_deg > 0.0 {
        (Posture::LeaningLeft, CONF_LEANING)
    } else {
        (Posture::LeaningRight, CONF_LEANING)
    };

    let mut joint_angles = BTreeMap::new();
    let mut insert = |name: &str, a: usize, b: usize, c: usize| {
        joint_angles.insert(
            name.to_string(),
            joint_angle(landmarks[a], landmarks[b], landmarks[c]),
        );
    };
    insert("leftElbow", pose::LEFT_SHOULDER, pose::LEFT_ELBOW, pose::LEFT_WRIST);
    insert("rightElbow", pose::RIGHT_SHOULDER, pose::RIGHT_ELBOW, pose::RIGHT_WRIST);
    insert("leftShoulder", pose::LEFT_ELBOW, pose::LEFT_SHOULDER, pose::LEFT_HIP);
    insert("rightShoulder", pose::RIGHT_ELBOW, pose::RIGHT_SHOULDER, pose::RIGHT_HIP);
    insert("leftKnee", pose::LEFT_HIP, pose::LEFT_KNEE, pose::LEFT_ANKLE);
    insert("rightKnee", pose::RIGHT_HIP, pose::RIGHT_KNEE, pose::RIGHT_ANKLE);

    BodySignal {
        posture,
        confidence,
        lean_deg,
        joint_angles,
    }
}

/// Stateless analyzer wrapping the per-part functions over a full frame.
#[derive(Debug, Default)]
pub struct GestureAnalyzer;

impl GestureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, frame: &LandmarkFrame) -> GestureSignal {
        GestureSignal {
            left_hand: frame
                .left_hand
                .as_deref()
                .map(analyze_hand)
                .unwrap_or_default(),
            right_hand: frame
                .right_hand
                .as_deref()
                .map(analyze_hand)
                .unwrap_or_default(),
            body: frame.pose.as_deref().map(analyze_pose).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{
        fist_hand, open_hand, partial_hand, peace_hand, pointing_hand, pose_with_lean,
        upright_pose,
    };

    #[test]
    fn classifies_the_gesture_vocabulary() {
        assert_eq!(analyze_hand(&open_hand()).gesture, HandGesture::Open);
        assert_eq!(analyze_hand(&fist_hand()).gesture, HandGesture::Fist);
        assert_eq!(analyze_hand(&pointing_hand()).gesture, HandGesture::Point);
        assert_eq!(analyze_hand(&peace_hand()).gesture, HandGesture::Peace);
        assert_eq!(analyze_hand(&partial_hand()).gesture, HandGesture::Partial);
    }

    #[test]
    fn gesture_confidences_are_fixed() {
        assert!((analyze_hand(&open_hand()).confidence - 0.9).abs() < 1e-6);
        assert!((analyze_hand(&fist_hand()).confidence - 0.9).abs() < 1e-6);
        assert!((analyze_hand(&pointing_hand()).confidence - 0.85).abs() < 1e-6);
        assert!((analyze_hand(&partial_hand()).confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn short_hand_is_undetected() {
        let signal = analyze_hand(&[Landmark::zero(); 10]);
        assert!(!signal.detected);
        assert_eq!(signal.gesture, HandGesture::None);
        assert_eq!(signal.landmark_count, 10);
    }

    #[test]
    fn upright_within_tolerance() {
        for lean in [-9.0, 0.0, 9.0] {
            let body = analyze_pose(&pose_with_lean(lean));
            assert_eq!(body.posture, Posture::Upright, "lean {lean}");
        }
    }

    #[test]
    fn transitional_band_is_neutral() {
        let body = analyze_pose(&pose_with_lean(12.0));
        assert_eq!(body.posture, Posture::Neutral);
    }

    #[test]
    fn strong_lean_picks_a_side() {
        assert_eq!(
            analyze_pose(&pose_with_lean(25.0)).posture,
            Posture::LeaningLeft
        );
        assert_eq!(
            analyze_pose(&pose_with_lean(-25.0)).posture,
            Posture::LeaningRight
        );
    }

    #[test]
    fn joint_angles_are_reported() {
        let body = analyze_pose(&upright_pose());
        for name in [
            "leftElbow",
            "rightElbow",
            "leftShoulder",
            "rightShoulder",
            "leftKnee",
            "rightKnee",
        ] {
            let angle = body.joint_angles.get(name).copied().unwrap_or(-1.0);
            assert!(
                (0.0..=180.0).contains(&angle),
                "{name} angle {angle} out of range"
            );
        }
        // Legs hang straight in the synthetic pose.
        assert!(body.joint_angles["leftKnee"] > 150.0);
    }

    #[test]
    fn short_pose_is_unknown() {
        let body = analyze_pose(&[Landmark::zero(); 5]);
        assert_eq!(body.posture, Posture::Unknown);
        assert!(body.joint_angles.is_empty());
    }

    #[test]
    fn frame_analyzer_fills_all_slots() {
        let mut frame = LandmarkFrame::default();
        frame.left_hand = Some(open_hand());
        frame.pose = Some(upright_pose());

        let signal = GestureAnalyzer::new().analyze(&frame);
        assert_eq!(signal.left_hand.gesture, HandGesture::Open);
        assert!(!signal.right_hand.detected);
        assert_eq!(signal.body.posture, Posture::Upright);
    }
}
