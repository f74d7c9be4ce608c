//! Personalized neutral-face calibration.
//!
//! The first [`CALIBRATION_FRAMES`] frames with a detected face are averaged
//! into a [`Baseline`]: a per-user neutral reference the expression analyzer
//! uses to normalize its measurements. Once complete the baseline is treated
//! as read-only for the rest of the tracking session.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::indices::face;
use crate::types::{Landmark, LandmarkFrame, FACE_LANDMARK_COUNT};

/// Number of accepted frames averaged into the baseline.
pub const CALIBRATION_FRAMES: usize = 30;

/// Personalized neutral-face reference distances.
///
/// All values are in normalized image units, measured on the user's resting
/// face during the calibration phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Distance between the outer cheek contour points.
    pub face_width: f32,
    /// Forehead-to-chin distance.
    pub face_height: f32,
    /// Distance between the two eye centers.
    pub interocular_distance: f32,
    /// Average vertical position of the two mouth corners.
    pub neutral_mouth_corner_y: f32,
    /// Vertical gap between upper and lower lip.
    pub neutral_mouth_height: f32,
    /// Distance between the mouth corners.
    pub neutral_mouth_width: f32,
    /// Average outer-brow-to-eyelid vertical distance (both sides).
    pub neutral_brow_distance: f32,
    /// Average vertical position of the two mid-cheek points.
    pub neutral_cheek_y: f32,
    /// Distance between the nostril outer edges.
    pub neutral_nostril_width: f32,
    /// Timestamp of the last frame folded into the average.
    pub frame_timestamp: f64,
}

impl Baseline {
    fn sample(landmarks: &[Landmark], timestamp_ms: f64) -> Self {
        let eye_center_r = landmarks[face::RIGHT_EYE_OUTER].midpoint(&landmarks[face::RIGHT_EYE_INNER]);
        let eye_center_l = landmarks[face::LEFT_EYE_INNER].midpoint(&landmarks[face::LEFT_EYE_OUTER]);

        let brow_dist_r = (landmarks[face::RIGHT_EYE_TOP].y - landmarks[face::RIGHT_BROW_OUTER].y).abs();
        let brow_dist_l = (landmarks[face::LEFT_EYE_TOP].y - landmarks[face::LEFT_BROW_OUTER].y).abs();

        Self {
            face_width: landmarks[face::RIGHT_CHEEK_EDGE].distance_2d(&landmarks[face::LEFT_CHEEK_EDGE]),
            face_height: landmarks[face::FOREHEAD].distance_2d(&landmarks[face::CHIN]),
            interocular_distance: eye_center_r.distance_2d(&eye_center_l),
            neutral_mouth_corner_y: (landmarks[face::MOUTH_RIGHT_CORNER].y
                + landmarks[face::MOUTH_LEFT_CORNER].y)
                / 2.0,
            neutral_mouth_height: (landmarks[face::LOWER_LIP].y - landmarks[face::UPPER_LIP].y).abs(),
            neutral_mouth_width: landmarks[face::MOUTH_RIGHT_CORNER]
                .distance_2d(&landmarks[face::MOUTH_LEFT_CORNER]),
            neutral_brow_distance: (brow_dist_r + brow_dist_l) / 2.0,
            neutral_cheek_y: (landmarks[face::RIGHT_CHEEK].y + landmarks[face::LEFT_CHEEK].y) / 2.0,
            neutral_nostril_width: landmarks[face::RIGHT_NOSTRIL]
                .distance_2d(&landmarks[face::LEFT_NOSTRIL]),
            frame_timestamp: timestamp_ms,
        }
    }

    /// Fold a new sample into the running average: `avg' = (avg + sample) / 2`.
    fn fold(&mut self, sample: &Baseline) {
        self.face_width = (self.face_width + sample.face_width) / 2.0;
        self.face_height = (self.face_height + sample.face_height) / 2.0;
        self.interocular_distance =
            (self.interocular_distance + sample.interocular_distance) / 2.0;
        self.neutral_mouth_corner_y =
            (self.neutral_mouth_corner_y + sample.neutral_mouth_corner_y) / 2.0;
        self.neutral_mouth_height =
            (self.neutral_mouth_height + sample.neutral_mouth_height) / 2.0;
        self.neutral_mouth_width =
            (self.neutral_mouth_width + sample.neutral_mouth_width) / 2.0;
        self.neutral_brow_distance =
            (self.neutral_brow_distance + sample.neutral_brow_distance) / 2.0;
        self.neutral_cheek_y = (self.neutral_cheek_y + sample.neutral_cheek_y) / 2.0;
        self.neutral_nostril_width =
            (self.neutral_nostril_width + sample.neutral_nostril_width) / 2.0;
        self.frame_timestamp = sample.frame_timestamp;
    }
}

/// Progress of the calibration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationState {
    /// Still averaging; `accepted` frames folded in so far.
    Collecting { accepted: usize },
    /// Baseline locked for the session.
    Complete,
}

/// Averages the first [`CALIBRATION_FRAMES`] face detections into a
/// [`Baseline`]. Owned by one tracking session; dropped when tracking stops.
#[derive(Debug, Default)]
pub struct BaselineCalibrator {
    baseline: Option<Baseline>,
    accepted: usize,
}

impl BaselineCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame.
    ///
    /// Frames without a face are skipped (not counted). A face with fewer
    /// than 468 landmarks is rejected with [`Error::MalformedLandmarks`] and
    /// does not advance calibration.
    pub fn accumulate(&mut self, frame: &LandmarkFrame) -> Result<CalibrationState> {
        if self.is_complete() {
            return Ok(CalibrationState::Complete);
        }

        let landmarks = match frame.face.as_deref() {
            Some(l) => l,
            None => {
                return Ok(CalibrationState::Collecting {
                    accepted: self.accepted,
                })
            }
        };

        if landmarks.len() < FACE_LANDMARK_COUNT {
            return Err(Error::MalformedLandmarks {
                expected: FACE_LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }

        let sample = Baseline::sample(landmarks, frame.timestamp_ms);
        match self.baseline.as_mut() {
            Some(avg) => avg.fold(&sample),
            None => self.baseline = Some(sample),
        }
        self.accepted += 1;

        if self.is_complete() {
            Ok(CalibrationState::Complete)
        } else {
            Ok(CalibrationState::Collecting {
                accepted: self.accepted,
            })
        }
    }

    pub fn is_complete(&self) -> bool {
        self.accepted >= CALIBRATION_FRAMES
    }

    /// Frames accepted so far, capped at [`CALIBRATION_FRAMES`].
    pub fn accepted_frames(&self) -> usize {
        self.accepted
    }

    /// The locked baseline. `None` until calibration completes.
    pub fn baseline(&self) -> Option<&Baseline> {
        if self.is_complete() {
            self.baseline.as_ref()
        } else {
            None
        }
    }
}
