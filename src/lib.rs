//! # mimic-rig
//!
//! A motion-to-rig retargeting engine: per-frame face, hand, and body
//! landmark sets (MediaPipe topology) go in; bone rotations and morph
//! target weights on an arbitrary skinned scene graph come out.
//!
//! The pipeline has four stages, orchestrated by [`TrackingSession`]:
//!
//! 1. **Calibration** ([`calibration`]) averages the user's resting face
//!    into a neutral [`Baseline`].
//! 2. **Analysis** ([`expression`], [`gesture`]) turns raw landmarks into
//!    semantic signals: smile intensity, eye openness, hand gestures,
//!    posture.
//! 3. **Resolution** ([`resolve`]) maps semantic channel names onto
//!    whatever the loaded asset actually calls its bones and morphs.
//! 4. **Retargeting** ([`retarget`]) writes rotations and influence
//!    weights into the scene, throttled by the plan's
//!    [`CapabilityBudget`].
//!
//! ## Quick start
//!
//! ```
//! use mimic_rig::{PlanTier, Scene, TrackingSession};
//! use mimic_rig::synthetic::neutral_face_frame;
//!
//! let mut session = TrackingSession::new(PlanTier::Pro);
//! session.attach_scene(Scene::new(1));
//! session.start();
//!
//! let snapshot = session.advance(&neutral_face_frame(), 0.0).unwrap();
//! assert!(snapshot.expression.eyes.left.openness > 0.5);
//! ```

pub mod calibration;
pub mod capability;
pub mod error;
pub mod expression;
pub mod gesture;
pub mod indices;
pub mod resolve;
pub mod retarget;
pub mod scene;
pub mod schedule;
pub mod session;
pub mod synthetic;
pub mod types;

pub use calibration::{Baseline, BaselineCalibrator, CalibrationState, CALIBRATION_FRAMES};
pub use capability::{select_bones, CapabilityBudget, PlanTier, BONE_PRIORITY};
pub use error::{Error, Result};
pub use expression::{ExpressionAnalyzer, ExpressionSignal};
pub use gesture::{GestureAnalyzer, GestureSignal, HandGesture, Posture};
pub use resolve::{ChannelBinding, RigResolver};
pub use retarget::{ApplyStats, RetargetEngine, MORPH_CHANNELS};
pub use scene::{Node, NodeId, Scene};
pub use schedule::FrameScheduler;
pub use session::{FrameSignals, TrackingSession};
pub use types::{load_recording, Landmark, LandmarkFrame};
