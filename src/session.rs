//! End-to-end tracking session: calibration, analysis, capability gating,
//! and retargeting behind one frame-rate gate.
//!
//! The host owns the camera and the renderer; the session owns everything
//! in between. Analyzer state is created on `start` and destroyed on
//! `stop`, so two consecutive sessions never share smoothing history or a
//! baseline. The rig binding cache is per-asset, not per-session, and
//! survives stop/start as long as the same scene stays attached.

use serde::Serialize;

use crate::calibration::{BaselineCalibrator, CalibrationState};
use crate::capability::{select_bones, CapabilityBudget, PlanTier, BONE_PRIORITY};
use crate::error::{Error, Result};
use crate::expression::{ExpressionAnalyzer, ExpressionSignal};
use crate::gesture::{GestureAnalyzer, GestureSignal};
use crate::resolve::RigResolver;
use crate::retarget::{ApplyStats, RetargetEngine};
use crate::scene::Scene;
use crate::types::LandmarkFrame;

/// Read-only snapshot of one admitted frame's outputs, for UIs and
/// recording tools. The scene mutations have already happened by the time
/// the host sees this.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSignals {
    pub expression: ExpressionSignal,
    pub gesture: GestureSignal,
    pub calibration: CalibrationState,
    #[serde(skip)]
    pub stats: ApplyStats,
}

/// Orchestrator wiring the pipeline stages together for one plan tier.
pub struct TrackingSession {
    budget: CapabilityBudget,
    calibrator: BaselineCalibrator,
    expression: ExpressionAnalyzer,
    gesture: GestureAnalyzer,
    resolver: RigResolver,
    engine: RetargetEngine,
    scheduler: crate::schedule::FrameScheduler,
    scene: Option<Scene>,
    bound_bones: Vec<String>,
    last_signals: Option<FrameSignals>,
}

impl TrackingSession {
    pub fn new(plan: PlanTier) -> Self {
        let budget = CapabilityBudget::allocate(plan);
        // Bound channels are semantic names; the resolver maps each one
        // onto whatever the attached asset calls its bones.
        let channels: Vec<String> = BONE_PRIORITY.iter().map(|s| s.to_string()).collect();
        Self {
            calibrator: BaselineCalibrator::new(),
            expression: ExpressionAnalyzer::new(),
            gesture: GestureAnalyzer::new(),
            resolver: RigResolver::new(),
            engine: RetargetEngine::new(budget),
            scheduler: crate::schedule::FrameScheduler::new(budget.max_frame_rate),
            scene: None,
            bound_bones: select_bones(&channels, &budget),
            last_signals: None,
            budget,
        }
    }

    pub fn budget(&self) -> &CapabilityBudget {
        &self.budget
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Semantic bone channels the budget selected. Each one is resolved
    /// onto the attached asset's own bone names per tick.
    pub fn bound_bones(&self) -> &[String] {
        &self.bound_bones
    }

    /// Mount a scene graph. Assets with no skeleton at all get a
    /// placeholder rig so head motion still lands somewhere. A different
    /// asset id drops all cached bindings.
    pub fn attach_scene(&mut self, mut scene: Scene) {
        if scene.skeleton_bones().is_empty() {
            scene.add_placeholder_rig(&self.budget);
            log::info!(
                "asset {} has no rig; synthesized {} placeholder bones",
                scene.asset_id(),
                scene.bone_names().len()
            );
        }
        self.resolver.invalidate();
        self.scene = Some(scene);
    }

    /// Unmount and return the scene, leaving the session sceneless.
    pub fn detach_scene(&mut self) -> Option<Scene> {
        self.resolver.invalidate();
        self.scene.take()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable access for the rendering host, e.g. to clear dirty flags
    /// after a draw.
    pub fn scene_mut(&mut self) -> Result<&mut Scene> {
        self.scene.as_mut().ok_or(Error::SceneUnavailable)
    }

    /// Begin tracking with fresh calibration and smoothing state.
    pub fn start(&mut self) {
        self.calibrator = BaselineCalibrator::new();
        self.expression.reset();
        self.last_signals = None;
        self.scheduler.start();
        log::info!(
            "tracking started ({} bones, {} morphs, {:.0} fps cap)",
            self.bound_bones.len(),
            self.budget.max_morph_targets,
            self.budget.max_frame_rate
        );
    }

    /// End tracking and drop per-session analysis state. The baseline does
    /// not carry over to the next start.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.calibrator = BaselineCalibrator::new();
        self.expression.reset();
        self.last_signals = None;
        log::info!("tracking stopped");
    }

    pub fn calibration_state(&self) -> CalibrationState {
        if self.calibrator.is_complete() {
            CalibrationState::Complete
        } else {
            CalibrationState::Collecting {
                accepted: self.calibrator.accepted_frames(),
            }
        }
    }

    /// Feed one tracker frame at host time `now_ms`. Returns the frame's
    /// signal snapshot when the scheduler admits it, `None` when the frame
    /// is dropped or the session is stopped.
    pub fn advance(&mut self, frame: &LandmarkFrame, now_ms: f64) -> Option<&FrameSignals> {
        if !self.scheduler.should_tick(now_ms) {
            return None;
        }

        if !self.calibrator.is_complete() {
            if let Err(e) = self.calibrator.accumulate(frame) {
                log::warn!("calibration frame rejected: {e}");
            }
        }

        let expression = self.expression.analyze(frame, self.calibrator.baseline());
        let gesture = self.gesture.analyze(frame);

        let stats = match self.scene.as_mut() {
            Some(scene) => self.engine.apply(
                scene,
                &mut self.resolver,
                &expression,
                &gesture,
                &self.bound_bones,
            ),
            None => {
                log::debug!("no scene attached; signals computed but not applied");
                ApplyStats::default()
            }
        };

        self.last_signals = Some(FrameSignals {
            expression,
            gesture,
            calibration: self.calibration_state(),
            stats,
        });
        self.last_signals.as_ref()
    }

    /// Most recent admitted frame's snapshot.
    pub fn signals(&self) -> Option<&FrameSignals> {
        self.last_signals.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CALIBRATION_FRAMES;
    use crate::synthetic::neutral_face_frame;

    fn started_session(plan: PlanTier) -> TrackingSession {
        let mut session = TrackingSession::new(plan);
        session.attach_scene(Scene::new(1));
        session.start();
        session
    }

    #[test]
    fn stopped_session_ignores_frames() {
        let mut session = TrackingSession::new(PlanTier::Pro);
        assert!(session.advance(&neutral_face_frame(), 0.0).is_none());
        assert!(session.signals().is_none());
    }

    #[test]
    fn rigless_scene_gets_placeholder_bones() {
        let session = started_session(PlanTier::Free);
        assert_eq!(session.bound_bones().len(), 8);
        assert_eq!(session.bound_bones()[0], "head");
    }

    #[test]
    fn bound_channels_are_semantic_not_asset_names() {
        // Channel selection never depends on how the asset spells its
        // bones; that mapping happens in the resolver.
        let mut session = TrackingSession::new(PlanTier::Free);
        let before = session.bound_bones().to_vec();
        assert_eq!(before, crate::capability::placeholder_bones(session.budget()));

        let mut scene = Scene::new(2);
        let root = scene.root();
        let head = scene.add_node(root, "mixamorig:Head");
        scene.attach_skeleton(root, vec![head]);
        session.attach_scene(scene);
        assert_eq!(session.bound_bones(), before.as_slice());
    }

    #[test]
    fn calibration_progresses_then_completes() {
        let mut session = started_session(PlanTier::Studio);
        let interval = 1000.0 / 60.0;
        for i in 0..CALIBRATION_FRAMES {
            let snapshot = session
                .advance(&neutral_face_frame(), f64::from(i as u32) * interval)
                .expect("frame admitted");
            if i + 1 < CALIBRATION_FRAMES {
                assert_eq!(
                    snapshot.calibration,
                    CalibrationState::Collecting { accepted: i + 1 }
                );
            } else {
                assert_eq!(snapshot.calibration, CalibrationState::Complete);
            }
        }
    }

    #[test]
    fn stop_discards_session_state() {
        let mut session = started_session(PlanTier::Studio);
        let interval = 1000.0 / 60.0;
        for i in 0..CALIBRATION_FRAMES {
            session.advance(&neutral_face_frame(), f64::from(i as u32) * interval);
        }
        assert!(session.calibrator.is_complete());

        session.stop();
        assert!(!session.is_running());
        assert!(session.signals().is_none());

        // A restarted session calibrates from scratch.
        session.start();
        let snapshot = session.advance(&neutral_face_frame(), 10_000.0).unwrap();
        assert_eq!(
            snapshot.calibration,
            CalibrationState::Collecting { accepted: 1 }
        );
    }

    #[test]
    fn frames_faster_than_the_budget_are_dropped() {
        let mut session = started_session(PlanTier::Free); // 15 fps cap
        assert!(session.advance(&neutral_face_frame(), 0.0).is_some());
        assert!(session.advance(&neutral_face_frame(), 16.0).is_none());
        assert!(session.advance(&neutral_face_frame(), 33.0).is_none());
        assert!(session.advance(&neutral_face_frame(), 67.0).is_some());
    }

    #[test]
    fn scene_access_errors_without_an_asset() {
        let mut session = TrackingSession::new(PlanTier::Free);
        assert!(matches!(
            session.scene_mut(),
            Err(Error::SceneUnavailable)
        ));

        session.attach_scene(Scene::new(1));
        session.scene_mut().unwrap().clear_dirty();
    }

    #[test]
    fn sceneless_session_still_produces_signals() {
        let mut session = TrackingSession::new(PlanTier::Pro);
        session.start();
        let snapshot = session.advance(&neutral_face_frame(), 0.0).unwrap();
        assert_eq!(snapshot.stats, ApplyStats::default());
        assert!(snapshot.expression.eyes.left.openness > 0.0);
    }
}
