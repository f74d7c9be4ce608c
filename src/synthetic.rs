//! Synthetic landmark frames for tests, demos, and offline tuning.
//!
//! Builds geometrically consistent face/hand/pose landmark sets without a
//! camera or detector: a neutral face places every measured landmark at its
//! neutral reference position, and the builder methods displace exactly the
//! landmarks a given expression moves.

use crate::indices::{face, hand, pose};
use crate::types::{
    Landmark, LandmarkFrame, FACE_LANDMARK_COUNT, HAND_LANDMARK_COUNT, POSE_LANDMARK_COUNT,
    REFINED_FACE_LANDMARK_COUNT,
};

// Neutral face geometry (normalized image coordinates, y down).
const EYE_CENTER_Y: f32 = 0.42;
const EYE_WIDTH: f32 = 0.08;
const RIGHT_EYE_CENTER_X: f32 = 0.38;
const LEFT_EYE_CENTER_X: f32 = 0.62;
const NEUTRAL_EAR: f32 = 0.25;
const MOUTH_CENTER_Y: f32 = 0.62;
const MOUTH_WIDTH: f32 = 0.16;
const BROW_Y: f32 = 0.36;
const BROW_INNER_SEP: f32 = 0.12;
const NOSTRIL_WIDTH: f32 = 0.08;
const CHEEK_Y: f32 = 0.55;

/// Face expression builder over a neutral 468-point mesh.
#[derive(Debug, Clone)]
pub struct FaceBuilder {
    landmarks: Vec<Landmark>,
}

impl FaceBuilder {
    /// A neutral face: eyes at a normal EAR of 0.25, closed mouth, resting
    /// brows, head facing the camera.
    pub fn neutral() -> Self {
        let mut l = vec![Landmark::new(0.5, 0.5, 0.0); FACE_LANDMARK_COUNT];

        l[face::FOREHEAD] = Landmark::new(0.5, 0.2, 0.0);
        l[face::CHIN] = Landmark::new(0.5, 0.8, 0.0);
        l[face::RIGHT_CHEEK_EDGE] = Landmark::new(0.3, 0.5, 0.0);
        l[face::LEFT_CHEEK_EDGE] = Landmark::new(0.7, 0.5, 0.0);
        l[face::NOSE_TIP] = Landmark::new(0.5, 0.5, 0.0);

        l[face::RIGHT_NOSTRIL] = Landmark::new(0.5 - NOSTRIL_WIDTH / 2.0, 0.55, 0.0);
        l[face::LEFT_NOSTRIL] = Landmark::new(0.5 + NOSTRIL_WIDTH / 2.0, 0.55, 0.0);
        l[face::RIGHT_CHEEK] = Landmark::new(0.4, CHEEK_Y, 0.0);
        l[face::LEFT_CHEEK] = Landmark::new(0.6, CHEEK_Y, 0.0);

        l[face::RIGHT_EYE_OUTER] =
            Landmark::new(RIGHT_EYE_CENTER_X - EYE_WIDTH / 2.0, EYE_CENTER_Y, 0.0);
        l[face::RIGHT_EYE_INNER] =
            Landmark::new(RIGHT_EYE_CENTER_X + EYE_WIDTH / 2.0, EYE_CENTER_Y, 0.0);
        l[face::LEFT_EYE_INNER] =
            Landmark::new(LEFT_EYE_CENTER_X - EYE_WIDTH / 2.0, EYE_CENTER_Y, 0.0);
        l[face::LEFT_EYE_OUTER] =
            Landmark::new(LEFT_EYE_CENTER_X + EYE_WIDTH / 2.0, EYE_CENTER_Y, 0.0);

        l[face::RIGHT_BROW_OUTER] = Landmark::new(0.36, BROW_Y, 0.0);
        l[face::LEFT_BROW_OUTER] = Landmark::new(0.64, BROW_Y, 0.0);
        l[face::RIGHT_BROW_INNER] = Landmark::new(0.5 - BROW_INNER_SEP / 2.0, 0.38, 0.0);
        l[face::LEFT_BROW_INNER] = Landmark::new(0.5 + BROW_INNER_SEP / 2.0, 0.38, 0.0);

        l[face::MOUTH_RIGHT_CORNER] = Landmark::new(0.5 - MOUTH_WIDTH / 2.0, MOUTH_CENTER_Y, 0.0);
        l[face::MOUTH_LEFT_CORNER] = Landmark::new(0.5 + MOUTH_WIDTH / 2.0, MOUTH_CENTER_Y, 0.0);
        l[face::UPPER_LIP] = Landmark::new(0.5, MOUTH_CENTER_Y, 0.0);
        l[face::LOWER_LIP] = Landmark::new(0.5, MOUTH_CENTER_Y, 0.0);

        let mut b = Self { landmarks: l };
        b.set_ear(true, NEUTRAL_EAR);
        b.set_ear(false, NEUTRAL_EAR);
        b
    }

    /// Set one eye's aspect ratio (vertical gap / horizontal width).
    pub fn set_ear(&mut self, left: bool, ear: f32) -> &mut Self {
        let gap = ear * EYE_WIDTH;
        let (cx, top, bottom) = if left {
            (LEFT_EYE_CENTER_X, face::LEFT_EYE_TOP, face::LEFT_EYE_BOTTOM)
        } else {
            (RIGHT_EYE_CENTER_X, face::RIGHT_EYE_TOP, face::RIGHT_EYE_BOTTOM)
        };
        self.landmarks[top] = Landmark::new(cx, EYE_CENTER_Y - gap / 2.0, 0.0);
        self.landmarks[bottom] = Landmark::new(cx, EYE_CENTER_Y + gap / 2.0, 0.0);
        self
    }

    /// Open the lips so the analyzer reads the given mouth openness (0..1).
    pub fn set_mouth_openness(&mut self, openness: f32) -> &mut Self {
        // openness = (gap / width) * 8
        let gap = openness / 8.0 * MOUTH_WIDTH;
        self.landmarks[face::UPPER_LIP].y = MOUTH_CENTER_Y - gap / 2.0;
        self.landmarks[face::LOWER_LIP].y = MOUTH_CENTER_Y + gap / 2.0;
        self
    }

    /// Lift (positive) or drop (negative) the mouth corners toward a smile
    /// or frown of the given strength (0..1).
    pub fn set_corner_lift(&mut self, lift: f32) -> &mut Self {
        let dy = lift * MOUTH_WIDTH / 8.0;
        self.landmarks[face::MOUTH_RIGHT_CORNER].y = MOUTH_CENTER_Y - dy;
        self.landmarks[face::MOUTH_LEFT_CORNER].y = MOUTH_CENTER_Y - dy;
        self
    }

    /// Raise both outer brows toward the given intensity (0..1).
    pub fn set_brow_raise(&mut self, raise: f32) -> &mut Self {
        self.set_brow_raise_side(true, raise).set_brow_raise_side(false, raise)
    }

    /// Raise one outer brow only.
    pub fn set_brow_raise_side(&mut self, left: bool, raise: f32) -> &mut Self {
        // raise = (dist / face_width - neutral_ratio) * gain, face_width = 0.4
        let dist = (crate::expression::tuning::BROW_NEUTRAL_RATIO
            + raise / crate::expression::tuning::BROW_RAISE_GAIN)
            * 0.4;
        let idx = if left {
            face::LEFT_BROW_OUTER
        } else {
            face::RIGHT_BROW_OUTER
        };
        self.landmarks[idx].y = EYE_CENTER_Y - NEUTRAL_EAR * EYE_WIDTH / 2.0 - dist;
        self
    }

    /// Lower both outer brows (anger component) toward the given intensity.
    pub fn set_brow_lowering(&mut self, lowering: f32) -> &mut Self {
        let dist = (crate::expression::tuning::BROW_NEUTRAL_RATIO
            - lowering / crate::expression::tuning::BROW_LOWER_GAIN)
            * 0.4;
        let eye_top = EYE_CENTER_Y - NEUTRAL_EAR * EYE_WIDTH / 2.0;
        self.landmarks[face::LEFT_BROW_OUTER].y = eye_top - dist;
        self.landmarks[face::RIGHT_BROW_OUTER].y = eye_top - dist;
        self
    }

    /// Pull the inner brows together (furrow intensity 0..1).
    pub fn set_furrow(&mut self, furrow: f32) -> &mut Self {
        let sep = (crate::expression::tuning::FURROW_BASE_RATIO
            - furrow * crate::expression::tuning::FURROW_RANGE_RATIO)
            * 0.4;
        self.landmarks[face::RIGHT_BROW_INNER].x = 0.5 - sep / 2.0;
        self.landmarks[face::LEFT_BROW_INNER].x = 0.5 + sep / 2.0;
        self
    }

    /// Widen the nostrils toward the given flare intensity (needs a baseline
    /// to be read back by the analyzer).
    pub fn set_nostril_flare(&mut self, flare: f32) -> &mut Self {
        let width = NOSTRIL_WIDTH * (1.0 + flare / crate::expression::tuning::NOSTRIL_FLARE_GAIN);
        self.landmarks[face::RIGHT_NOSTRIL].x = 0.5 - width / 2.0;
        self.landmarks[face::LEFT_NOSTRIL].x = 0.5 + width / 2.0;
        self
    }

    /// Raise the mid-cheek points (needs a baseline to be read back).
    pub fn set_cheek_raise(&mut self, raise: f32) -> &mut Self {
        let dy = raise / crate::expression::tuning::CHEEK_RAISE_GAIN * 0.6;
        self.landmarks[face::RIGHT_CHEEK].y = CHEEK_Y - dy;
        self.landmarks[face::LEFT_CHEEK].y = CHEEK_Y - dy;
        self
    }

    /// Turn the head: positive yaw = nose toward the subject's left.
    pub fn set_head_yaw(&mut self, degrees: f32) -> &mut Self {
        let interocular = LEFT_EYE_CENTER_X - RIGHT_EYE_CENTER_X;
        self.landmarks[face::NOSE_TIP].x =
            0.5 + degrees / crate::expression::tuning::YAW_GAIN_DEG * interocular;
        self
    }

    /// Tilt the head up/down: positive pitch = looking down (nose drops).
    pub fn set_head_pitch(&mut self, degrees: f32) -> &mut Self {
        let interocular = LEFT_EYE_CENTER_X - RIGHT_EYE_CENTER_X;
        let ratio = crate::expression::tuning::PITCH_NEUTRAL_RATIO
            + degrees / crate::expression::tuning::PITCH_GAIN_DEG;
        self.landmarks[face::NOSE_TIP].y = EYE_CENTER_Y + ratio * interocular;
        self
    }

    /// Append refined iris landmarks with the given normalized gaze offsets
    /// (-1..1 of half an eye width/height).
    pub fn with_iris(&mut self, gaze_x: f32, gaze_y: f32) -> &mut Self {
        self.landmarks
            .resize(REFINED_FACE_LANDMARK_COUNT, Landmark::zero());
        // Gaze x is normalized by eye width, gaze y by the eyelid gap.
        let dx = gaze_x / crate::expression::tuning::GAZE_GAIN * EYE_WIDTH;
        let dy = gaze_y / crate::expression::tuning::GAZE_GAIN * (NEUTRAL_EAR * EYE_WIDTH);
        self.landmarks[face::RIGHT_IRIS_CENTER] =
            Landmark::new(RIGHT_EYE_CENTER_X + dx, EYE_CENTER_Y + dy, 0.0);
        self.landmarks[face::LEFT_IRIS_CENTER] =
            Landmark::new(LEFT_EYE_CENTER_X + dx, EYE_CENTER_Y + dy, 0.0);
        self
    }

    pub fn build(&self) -> Vec<Landmark> {
        self.landmarks.clone()
    }

    /// Wrap the face into a frame with no hands or pose.
    pub fn build_frame(&self) -> LandmarkFrame {
        LandmarkFrame {
            face: Some(self.landmarks.clone()),
            ..Default::default()
        }
    }
}

/// A neutral 468-point face frame.
pub fn neutral_face_frame() -> LandmarkFrame {
    FaceBuilder::neutral().build_frame()
}

// ============================================================================
// Hands
// ============================================================================

fn base_hand() -> Vec<Landmark> {
    // Wrist at the bottom, knuckle row above it, everything else neutral.
    let mut l = vec![Landmark::new(0.5, 0.6, 0.0); HAND_LANDMARK_COUNT];
    l[hand::WRIST] = Landmark::new(0.5, 0.8, 0.0);
    for (i, &(_, pip)) in hand::FINGERS.iter().enumerate() {
        l[pip] = Landmark::new(0.42 + i as f32 * 0.05, 0.55, 0.0);
    }
    l[hand::THUMB_MCP] = Landmark::new(0.38, 0.65, 0.0);
    l[hand::THUMB_TIP] = Landmark::new(0.34, 0.62, 0.0);
    l
}

fn set_finger(l: &mut [Landmark], tip: usize, pip: usize, extended: bool) {
    let pip_pos = l[pip];
    l[tip] = if extended {
        // Tip well above the proximal joint.
        Landmark::new(pip_pos.x, pip_pos.y - 0.15, 0.0)
    } else {
        // Curled: tip below the proximal joint.
        Landmark::new(pip_pos.x, pip_pos.y + 0.08, 0.0)
    };
}

fn hand_with(fingers_extended: [bool; 4], thumb_out: bool) -> Vec<Landmark> {
    let mut l = base_hand();
    for (&(tip, pip), &ext) in hand::FINGERS.iter().zip(fingers_extended.iter()) {
        set_finger(&mut l, tip, pip, ext);
    }
    if thumb_out {
        l[hand::THUMB_TIP] = Landmark::new(0.30, 0.58, 0.0);
    } else {
        l[hand::THUMB_TIP] = Landmark::new(0.44, 0.66, 0.0);
    }
    l
}

/// All four fingers extended, thumb out.
pub fn open_hand() -> Vec<Landmark> {
    hand_with([true, true, true, true], true)
}

/// All fingers curled.
pub fn fist_hand() -> Vec<Landmark> {
    hand_with([false, false, false, false], false)
}

/// Index finger only.
pub fn pointing_hand() -> Vec<Landmark> {
    hand_with([true, false, false, false], false)
}

/// Index and middle fingers.
pub fn peace_hand() -> Vec<Landmark> {
    hand_with([true, true, false, false], false)
}

/// Three fingers extended, thumb tucked.
pub fn partial_hand() -> Vec<Landmark> {
    hand_with([true, true, true, false], false)
}

// ============================================================================
// Body pose
// ============================================================================

/// A 33-point pose leaning by `lean_deg` from vertical (positive = toward the
/// subject's left shoulder, which is the image right under mirroring).
pub fn pose_with_lean(lean_deg: f32) -> Vec<Landmark> {
    let mut l = vec![Landmark::new(0.5, 0.5, 0.0); POSE_LANDMARK_COUNT];

    let hip_mid = Landmark::new(0.5, 0.7, 0.0);
    let torso_len = 0.3;
    let rad = lean_deg.to_radians();
    let shoulder_mid = Landmark::new(
        hip_mid.x + torso_len * rad.sin(),
        hip_mid.y - torso_len * rad.cos(),
        0.0,
    );

    l[pose::LEFT_SHOULDER] = Landmark::new(shoulder_mid.x + 0.12, shoulder_mid.y, 0.0);
    l[pose::RIGHT_SHOULDER] = Landmark::new(shoulder_mid.x - 0.12, shoulder_mid.y, 0.0);
    l[pose::LEFT_HIP] = Landmark::new(hip_mid.x + 0.08, hip_mid.y, 0.0);
    l[pose::RIGHT_HIP] = Landmark::new(hip_mid.x - 0.08, hip_mid.y, 0.0);

    // Arms hanging straight down, legs straight.
    l[pose::LEFT_ELBOW] = Landmark::new(shoulder_mid.x + 0.14, shoulder_mid.y + 0.15, 0.0);
    l[pose::RIGHT_ELBOW] = Landmark::new(shoulder_mid.x - 0.14, shoulder_mid.y + 0.15, 0.0);
    l[pose::LEFT_WRIST] = Landmark::new(shoulder_mid.x + 0.15, shoulder_mid.y + 0.3, 0.0);
    l[pose::RIGHT_WRIST] = Landmark::new(shoulder_mid.x - 0.15, shoulder_mid.y + 0.3, 0.0);
    l[pose::LEFT_KNEE] = Landmark::new(0.56, 0.85, 0.0);
    l[pose::RIGHT_KNEE] = Landmark::new(0.44, 0.85, 0.0);
    l[pose::LEFT_ANKLE] = Landmark::new(0.56, 0.98, 0.0);
    l[pose::RIGHT_ANKLE] = Landmark::new(0.44, 0.98, 0.0);

    l
}

/// An upright 33-point pose.
pub fn upright_pose() -> Vec<Landmark> {
    pose_with_lean(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_face_has_full_mesh() {
        let frame = neutral_face_frame();
        assert!(frame.has_full_face());
        assert!(!frame.has_iris());
    }

    #[test]
    fn iris_extension_produces_refined_set() {
        let frame = FaceBuilder::neutral().with_iris(0.0, 0.0).build_frame();
        assert!(frame.has_iris());
    }

    #[test]
    fn hands_have_21_points() {
        for h in [open_hand(), fist_hand(), pointing_hand(), peace_hand()] {
            assert_eq!(h.len(), HAND_LANDMARK_COUNT);
        }
    }

    #[test]
    fn pose_has_33_points() {
        assert_eq!(upright_pose().len(), POSE_LANDMARK_COUNT);
    }
}
