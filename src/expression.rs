//! Facial expression analysis.
//!
//! Derives normalized [0,1] expression signals from a 468/478-point face
//! mesh: per-eye openness and gaze, mouth openness/shape/speaking, brow
//! raise and furrow, head rotation, and priority-gated composite
//! expressions (anger, disgust, surprise, concentration).
//!
//! All thresholds live in [`tuning`] as named constants. They are
//! empirically tuned starting values and depend on camera placement and
//! lighting; treat them as calibration parameters, not ground truth.

use serde::{Deserialize, Serialize};

use crate::calibration::Baseline;
use crate::indices::face;
use crate::types::{Landmark, LandmarkFrame, FACE_LANDMARK_COUNT};

/// Calibration parameters for the expression heuristics.
pub mod tuning {
    // Eye aspect ratio piecewise remap: closed / normal / wide-open segments.
    pub const EAR_CLOSED_MAX: f32 = 0.08;
    pub const EAR_NORMAL_MAX: f32 = 0.25;
    pub const EAR_WIDE_MAX: f32 = 0.40;
    pub const OPENNESS_CLOSED_MAX: f32 = 0.1;
    pub const OPENNESS_NORMAL_MAX: f32 = 0.7;

    // Eye state classification. Identical for both eyes.
    pub const BLINK_THRESHOLD: f32 = 0.3;
    pub const WINK_CLOSED_MAX: f32 = 0.35;
    pub const WINK_OPEN_MIN: f32 = 0.65;
    pub const WINK_GAP_MIN: f32 = 0.30;
    pub const SQUINT_MIN: f32 = 0.1;
    pub const SQUINT_MAX: f32 = 0.45;

    /// Previous-value weight for eyelid channels. Kept low so blinks stay sharp.
    pub const EYELID_SMOOTHING: f32 = 0.3;
    /// Previous-value weight for mouth-style channels.
    pub const MOUTH_SMOOTHING: f32 = 0.6;

    /// Iris offset to gaze amplification.
    pub const GAZE_GAIN: f32 = 4.0;

    // Mouth.
    pub const MOUTH_OPEN_GAIN: f32 = 8.0;
    pub const MOUTH_OPEN_THRESHOLD: f32 = 0.4;
    pub const MOUTH_PARTIAL_THRESHOLD: f32 = 0.15;
    /// Higher than the partial-open threshold so a resting half-open mouth
    /// does not read as speech.
    pub const SPEAKING_THRESHOLD: f32 = 0.25;
    pub const LIP_SYNC_GAIN: f32 = 0.9;
    pub const SMILE_GAIN: f32 = 8.0;
    pub const MOUTH_CURVE_MIN: f32 = 0.1;

    // Brows. Ratios are relative to face width.
    pub const BROW_NEUTRAL_RATIO: f32 = 0.125;
    pub const BROW_RAISE_GAIN: f32 = 5.0;
    pub const BROW_LOWER_GAIN: f32 = 8.0;
    pub const FURROW_BASE_RATIO: f32 = 0.30;
    pub const FURROW_RANGE_RATIO: f32 = 0.15;

    // Micro-expressions (baseline-relative).
    pub const NOSTRIL_FLARE_GAIN: f32 = 4.0;
    pub const CHEEK_RAISE_GAIN: f32 = 10.0;

    // Head rotation.
    pub const YAW_GAIN_DEG: f32 = 90.0;
    pub const PITCH_GAIN_DEG: f32 = 90.0;
    /// Nose-tip drop below the eye line on a neutral face, as a fraction of
    /// the interocular distance.
    pub const PITCH_NEUTRAL_RATIO: f32 = 1.0 / 3.0;

    // Composite expression gates, evaluated in priority order.
    pub const COMPOSITE_SUPPRESS: f32 = 0.1;
    pub const ANGER_BROW_MIN: f32 = 0.3;
    pub const ANGER_FLARE_MIN: f32 = 0.2;
    pub const ANGER_BROW_WEIGHT: f32 = 0.8;
    pub const DISGUST_FLARE_MIN: f32 = 0.3;
    pub const DISGUST_CHEEK_MIN: f32 = 0.2;
    pub const SURPRISE_BROW_MIN: f32 = 0.4;
    pub const SURPRISE_JAW_MIN: f32 = 0.25;
    pub const FLAG_THRESHOLD: f32 = 0.2;
}

/// Per-eye measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeMetrics {
    /// Remapped openness in [0,1] (0 closed, ~0.7 normal, 1 wide open).
    pub openness: f32,
    /// Horizontal gaze in [-1,1]; positive = subject's left.
    pub gaze_x: f32,
    /// Vertical gaze in [-1,1]; positive = down.
    pub gaze_y: f32,
}

/// Combined eye state with symmetric wink/blink/squint classification.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeState {
    pub left: EyeMetrics,
    pub right: EyeMetrics,
    pub blinking: bool,
    pub left_wink: bool,
    pub right_wink: bool,
    pub squinting: bool,
}

/// Mouth shape buckets, classified in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthShape {
    #[default]
    Closed,
    PartiallyOpen,
    Open,
    Smile,
    Frown,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MouthState {
    pub openness: f32,
    pub shape: MouthShape,
    pub speaking: bool,
    /// Smoothed amplitude for lip-sync driving, in [0,1].
    pub lip_sync: f32,
}

/// Per-side brow detail.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowState {
    pub left_raise: f32,
    pub right_raise: f32,
    pub furrow: f32,
    /// Absolute raise difference between sides.
    pub asymmetry: f32,
}

/// Baseline-relative micro-expression measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MicroExpressions {
    pub nostril_flare: f32,
    pub cheek_raise: f32,
    pub brow_lowering: f32,
}

/// Boolean views over the composite values, thresholded at
/// [`tuning::FLAG_THRESHOLD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpressionFlags {
    pub smiling: bool,
    pub frowning: bool,
    pub angry: bool,
    pub disgusted: bool,
    pub surprised: bool,
    pub concentrating: bool,
}

/// Head rotation in degrees. Pitch is rotation about x (positive = looking
/// down), yaw about y (positive = turned toward the subject's left), roll
/// about z (positive = tilted toward the subject's left shoulder).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Full expression signal bundle, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionSignal {
    pub smile: f32,
    pub frown: f32,
    pub anger: f32,
    pub disgust: f32,
    pub surprise: f32,
    pub eyebrow_raise: f32,
    pub jaw_drop: f32,
    pub concentration: f32,
    pub brows: BrowState,
    pub micro: MicroExpressions,
    pub flags: ExpressionFlags,
    pub eyes: EyeState,
    pub mouth: MouthState,
    pub head: HeadRotation,
}

/// Remap a raw eye aspect ratio through the three-segment piecewise curve.
///
/// Closed range [0, 0.08] → [0, 0.1]; normal range (0.08, 0.25] → (0.1, 0.7];
/// wide-open range (0.25, 0.40] → (0.7, 1.0]. Preserves sensitivity near
/// "closed" while still expressing a full wide-open range.
pub fn eye_openness_from_ear(ear: f32) -> f32 {
    use tuning::*;
    let ear = ear.max(0.0);
    let openness = if ear <= EAR_CLOSED_MAX {
        ear / EAR_CLOSED_MAX * OPENNESS_CLOSED_MAX
    } else if ear <= EAR_NORMAL_MAX {
        OPENNESS_CLOSED_MAX
            + (ear - EAR_CLOSED_MAX) / (EAR_NORMAL_MAX - EAR_CLOSED_MAX)
                * (OPENNESS_NORMAL_MAX - OPENNESS_CLOSED_MAX)
    } else {
        OPENNESS_NORMAL_MAX
            + (ear - EAR_NORMAL_MAX) / (EAR_WIDE_MAX - EAR_NORMAL_MAX)
                * (1.0 - OPENNESS_NORMAL_MAX)
    };
    openness.clamp(0.0, 1.0)
}

/// Derives an [`ExpressionSignal`] from each frame.
///
/// Holds only private exponential-smoothing state; create one per tracking
/// session and drop it when tracking stops.
#[derive(Debug, Default)]
pub struct ExpressionAnalyzer {
    prev_left_openness: Option<f32>,
    prev_right_openness: Option<f32>,
    prev_mouth_openness: Option<f32>,
}

impl ExpressionAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear smoothing state (e.g. when tracking restarts).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Analyze one frame. A missing or sub-468 face yields an all-zero
    /// bundle rather than an error.
    pub fn analyze(&mut self, frame: &LandmarkFrame, baseline: Option<&Baseline>) -> ExpressionSignal {
        let lm = match frame.face.as_deref() {
            Some(l) if l.len() >= FACE_LANDMARK_COUNT => l,
            Some(l) => {
                log::debug!(
                    "expression: face has {} landmarks, need {}; emitting zero bundle",
                    l.len(),
                    FACE_LANDMARK_COUNT
                );
                return ExpressionSignal::default();
            }
            None => return ExpressionSignal::default(),
        };

        let face_width = lm[face::RIGHT_CHEEK_EDGE]
            .distance_2d(&lm[face::LEFT_CHEEK_EDGE])
            .max(1e-4);
        let face_height = lm[face::FOREHEAD].distance_2d(&lm[face::CHIN]).max(1e-4);

        let eyes = self.analyze_eyes(lm, frame.has_iris());
        let mouth_raw = self.analyze_mouth(lm, baseline);
        let (mouth, smile, frown) = mouth_raw;
        let brows = analyze_brows(lm, face_width, baseline);
        let micro = analyze_micro(lm, face_width, face_height, baseline);
        let head = analyze_head(lm);

        let jaw_drop = mouth.openness;
        let eyebrow_raise = brows.left_raise.max(brows.right_raise);

        // Composites are mutually exclusive: guards are evaluated in
        // priority order (anger, disgust, surprise, concentration) and each
        // requires the earlier ones to be suppressed.
        use tuning::*;
        let curve_neutral = smile < COMPOSITE_SUPPRESS && frown < COMPOSITE_SUPPRESS;

        let anger = if curve_neutral
            && (micro.brow_lowering > ANGER_BROW_MIN || micro.nostril_flare > ANGER_FLARE_MIN)
        {
            (ANGER_BROW_WEIGHT * micro.brow_lowering)
                .max(micro.nostril_flare)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };

        let disgust = if curve_neutral
            && anger < COMPOSITE_SUPPRESS
            && micro.nostril_flare > DISGUST_FLARE_MIN
            && micro.cheek_raise > DISGUST_CHEEK_MIN
        {
            (0.5 * micro.nostril_flare + 0.5 * micro.cheek_raise).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let surprise = if anger < COMPOSITE_SUPPRESS
            && disgust < COMPOSITE_SUPPRESS
            && eyebrow_raise > SURPRISE_BROW_MIN
            && jaw_drop > SURPRISE_JAW_MIN
        {
            (0.6 * eyebrow_raise + 0.4 * jaw_drop).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let concentration = if eyes.squinting
            && !eyes.blinking
            && curve_neutral
            && anger < COMPOSITE_SUPPRESS
            && disgust < COMPOSITE_SUPPRESS
        {
            let avg_open = (eyes.left.openness + eyes.right.openness) / 2.0;
            let squint_depth = (SQUINT_MAX - avg_open) / (SQUINT_MAX - SQUINT_MIN);
            (0.6 * brows.furrow + 0.4 * squint_depth).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let flags = ExpressionFlags {
            smiling: smile > FLAG_THRESHOLD,
            frowning: frown > FLAG_THRESHOLD,
            angry: anger > FLAG_THRESHOLD,
            disgusted: disgust > FLAG_THRESHOLD,
            surprised: surprise > FLAG_THRESHOLD,
            concentrating: concentration > FLAG_THRESHOLD,
        };

        ExpressionSignal {
            smile,
            frown,
            anger,
            disgust,
            surprise,
            eyebrow_raise,
            jaw_drop,
            concentration,
            brows,
            micro,
            flags,
            eyes,
            mouth,
            head,
        }
    }

    fn analyze_eyes(&mut self, lm: &[Landmark], has_iris: bool) -> EyeState {
        use tuning::*;

        let right_width = lm[face::RIGHT_EYE_INNER]
            .distance_2d(&lm[face::RIGHT_EYE_OUTER])
            .max(1e-4);
        let left_width = lm[face::LEFT_EYE_OUTER]
            .distance_2d(&lm[face::LEFT_EYE_INNER])
            .max(1e-4);

        let right_ear =
            (lm[face::RIGHT_EYE_BOTTOM].y - lm[face::RIGHT_EYE_TOP].y).abs() / right_width;
        let left_ear = (lm[face::LEFT_EYE_BOTTOM].y - lm[face::LEFT_EYE_TOP].y).abs() / left_width;

        let left_raw = eye_openness_from_ear(left_ear);
        let right_raw = eye_openness_from_ear(right_ear);

        // Fast blend for eyelids so blinks stay sharp.
        let left = blend(&mut self.prev_left_openness, left_raw, EYELID_SMOOTHING);
        let right = blend(&mut self.prev_right_openness, right_raw, EYELID_SMOOTHING);

        let blinking = left < BLINK_THRESHOLD && right < BLINK_THRESHOLD;
        let gap = (left - right).abs();
        let left_wink =
            !blinking && left < WINK_CLOSED_MAX && right > WINK_OPEN_MIN && gap > WINK_GAP_MIN;
        let right_wink =
            !blinking && right < WINK_CLOSED_MAX && left > WINK_OPEN_MIN && gap > WINK_GAP_MIN;
        let squinting = !blinking
            && !left_wink
            && !right_wink
            && left > SQUINT_MIN
            && left < SQUINT_MAX
            && right > SQUINT_MIN
            && right < SQUINT_MAX;

        let (left_gaze, right_gaze) = if has_iris {
            (
                gaze(
                    lm,
                    face::LEFT_IRIS_CENTER,
                    face::LEFT_EYE_INNER,
                    face::LEFT_EYE_OUTER,
                    face::LEFT_EYE_TOP,
                    face::LEFT_EYE_BOTTOM,
                ),
                gaze(
                    lm,
                    face::RIGHT_IRIS_CENTER,
                    face::RIGHT_EYE_OUTER,
                    face::RIGHT_EYE_INNER,
                    face::RIGHT_EYE_TOP,
                    face::RIGHT_EYE_BOTTOM,
                ),
            )
        } else {
            ((0.0, 0.0), (0.0, 0.0))
        };

        EyeState {
            left: EyeMetrics {
                openness: left,
                gaze_x: left_gaze.0,
                gaze_y: left_gaze.1,
            },
            right: EyeMetrics {
                openness: right,
                gaze_x: right_gaze.0,
                gaze_y: right_gaze.1,
            },
            blinking,
            left_wink,
            right_wink,
            squinting,
        }
    }

    fn analyze_mouth(
        &mut self,
        lm: &[Landmark],
        baseline: Option<&Baseline>,
    ) -> (MouthState, f32, f32) {
        use tuning::*;

        let width = lm[face::MOUTH_RIGHT_CORNER]
            .distance_2d(&lm[face::MOUTH_LEFT_CORNER])
            .max(1e-4);
        let gap = (lm[face::LOWER_LIP].y - lm[face::UPPER_LIP].y).abs();
        let raw = (gap / width * MOUTH_OPEN_GAIN).clamp(0.0, 1.0);
        let openness = blend(&mut self.prev_mouth_openness, raw, MOUTH_SMOOTHING);

        // Corner lift relative to the calibrated neutral corner height when
        // available, otherwise to the lip center.
        let corner_y =
            (lm[face::MOUTH_RIGHT_CORNER].y + lm[face::MOUTH_LEFT_CORNER].y) / 2.0;
        let reference_y = baseline
            .map(|b| b.neutral_mouth_corner_y)
            .unwrap_or_else(|| lm[face::UPPER_LIP].midpoint(&lm[face::LOWER_LIP]).y);
        let lift = (reference_y - corner_y) / width * SMILE_GAIN;
        let smile = lift.clamp(0.0, 1.0);
        let frown = (-lift).clamp(0.0, 1.0);

        let shape = if openness > MOUTH_OPEN_THRESHOLD {
            MouthShape::Open
        } else if openness > MOUTH_PARTIAL_THRESHOLD {
            MouthShape::PartiallyOpen
        } else if smile > MOUTH_CURVE_MIN {
            MouthShape::Smile
        } else if frown > MOUTH_CURVE_MIN {
            MouthShape::Frown
        } else {
            MouthShape::Closed
        };

        let mouth = MouthState {
            openness,
            shape,
            speaking: openness > SPEAKING_THRESHOLD,
            lip_sync: (openness * LIP_SYNC_GAIN).clamp(0.0, 1.0),
        };
        (mouth, smile, frown)
    }
}

/// Exponential blend with the stored previous value; first sample passes raw.
fn blend(prev: &mut Option<f32>, raw: f32, prev_weight: f32) -> f32 {
    let value = match *prev {
        Some(p) => prev_weight * p + (1.0 - prev_weight) * raw,
        None => raw,
    };
    *prev = Some(value);
    value
}

fn gaze(
    lm: &[Landmark],
    iris: usize,
    corner_a: usize,
    corner_b: usize,
    top: usize,
    bottom: usize,
) -> (f32, f32) {
    use tuning::GAZE_GAIN;
    let center = lm[corner_a].midpoint(&lm[corner_b]);
    let width = lm[corner_a].distance_2d(&lm[corner_b]).max(1e-4);
    let height = (lm[bottom].y - lm[top].y).abs().max(1e-4);
    let gx = ((lm[iris].x - center.x) / width * GAZE_GAIN).clamp(-1.0, 1.0);
    let gy = ((lm[iris].y - center.y) / height * GAZE_GAIN).clamp(-1.0, 1.0);
    (gx, gy)
}

fn analyze_brows(lm: &[Landmark], face_width: f32, baseline: Option<&Baseline>) -> BrowState {
    use tuning::*;

    let neutral_ratio = baseline
        .map(|b| b.neutral_brow_distance / b.face_width.max(1e-4))
        .unwrap_or(BROW_NEUTRAL_RATIO);

    // Same threshold and gain for both sides; symmetry is load-bearing for
    // the wink-vs-raise heuristics downstream.
    let side = |eye_top: usize, brow: usize| -> f32 {
        let dist = (lm[eye_top].y - lm[brow].y).abs();
        ((dist / face_width - neutral_ratio) * BROW_RAISE_GAIN).clamp(0.0, 1.0)
    };
    let left_raise = side(face::LEFT_EYE_TOP, face::LEFT_BROW_OUTER);
    let right_raise = side(face::RIGHT_EYE_TOP, face::RIGHT_BROW_OUTER);

    let sep = (lm[face::LEFT_BROW_INNER].x - lm[face::RIGHT_BROW_INNER].x).abs() / face_width;
    let furrow = ((FURROW_BASE_RATIO - sep) / FURROW_RANGE_RATIO).clamp(0.0, 1.0);

    BrowState {
        left_raise,
        right_raise,
        furrow,
        asymmetry: (left_raise - right_raise).abs(),
    }
}

fn analyze_micro(
    lm: &[Landmark],
    face_width: f32,
    face_height: f32,
    baseline: Option<&Baseline>,
) -> MicroExpressions {
    use tuning::*;

    let neutral_ratio = baseline
        .map(|b| b.neutral_brow_distance / b.face_width.max(1e-4))
        .unwrap_or(BROW_NEUTRAL_RATIO);
    let brow_dist = ((lm[face::LEFT_EYE_TOP].y - lm[face::LEFT_BROW_OUTER].y).abs()
        + (lm[face::RIGHT_EYE_TOP].y - lm[face::RIGHT_BROW_OUTER].y).abs())
        / 2.0;
    let brow_lowering =
        ((neutral_ratio - brow_dist / face_width) * BROW_LOWER_GAIN).clamp(0.0, 1.0);

    // Nostril flare and cheek raise are absolute-position measurements and
    // only meaningful against a calibrated neutral.
    let (nostril_flare, cheek_raise) = match baseline {
        Some(b) => {
            let nostril_width = lm[face::RIGHT_NOSTRIL].distance_2d(&lm[face::LEFT_NOSTRIL]);
            let flare = ((nostril_width - b.neutral_nostril_width)
                / b.neutral_nostril_width.max(1e-4)
                * NOSTRIL_FLARE_GAIN)
                .clamp(0.0, 1.0);

            let cheek_y = (lm[face::RIGHT_CHEEK].y + lm[face::LEFT_CHEEK].y) / 2.0;
            let raise = ((b.neutral_cheek_y - cheek_y) / face_height * CHEEK_RAISE_GAIN)
                .clamp(0.0, 1.0);
            (flare, raise)
        }
        None => (0.0, 0.0),
    };

    MicroExpressions {
        nostril_flare,
        cheek_raise,
        brow_lowering,
    }
}

fn analyze_head(lm: &[Landmark]) -> HeadRotation {
    use tuning::*;

    let right_center = lm[face::RIGHT_EYE_OUTER].midpoint(&lm[face::RIGHT_EYE_INNER]);
    let left_center = lm[face::LEFT_EYE_INNER].midpoint(&lm[face::LEFT_EYE_OUTER]);
    let eye_center = right_center.midpoint(&left_center);
    let interocular = right_center.distance_2d(&left_center).max(1e-4);
    let nose = lm[face::NOSE_TIP];

    let yaw = (nose.x - eye_center.x) / interocular * YAW_GAIN_DEG;
    let pitch =
        ((nose.y - eye_center.y) / interocular - PITCH_NEUTRAL_RATIO) * PITCH_GAIN_DEG;
    let roll = (left_center.y - right_center.y)
        .atan2(left_center.x - right_center.x)
        .to_degrees();

    HeadRotation { pitch, yaw, roll }
}
