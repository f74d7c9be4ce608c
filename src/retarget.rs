//! Application of expression and gesture signals onto a scene graph.
//!
//! Morph-driven channels set influence weights (clamped to [0,1]) and limb
//! channels set bone rotations in radians. Bone rotations move toward their
//! targets at the plan's responsiveness factor, so lower tiers animate the
//! same pose more sluggishly rather than dropping channels.

use crate::capability::CapabilityBudget;
use crate::expression::ExpressionSignal;
use crate::gesture::GestureSignal;
use crate::resolve::RigResolver;
use crate::scene::Scene;

/// Morph channels in application priority order; the budget's
/// `max_morph_targets` keeps a prefix of this list.
pub const MORPH_CHANNELS: [&str; 8] = [
    "jawOpen",
    "smile",
    "frown",
    "blinkLeft",
    "blinkRight",
    "browUp",
    "surprised",
    "angry",
];

/// Fraction of an elbow or knee bend carried by the upper limb segment;
/// the lower segment takes the remainder.
pub const UPPER_LIMB_SHARE: f32 = 0.3;

/// Fraction of the head rotation echoed into the neck bone.
const NECK_SHARE: f32 = 0.3;

fn morph_channel_value(name: &str, expression: &ExpressionSignal) -> f32 {
    match name {
        "jawOpen" => expression.mouth.openness,
        "smile" => expression.smile,
        "frown" => expression.frown,
        "blinkLeft" => 1.0 - expression.eyes.left.openness,
        "blinkRight" => 1.0 - expression.eyes.right.openness,
        "browUp" => expression.eyebrow_raise,
        "surprised" => expression.surprise,
        "angry" => expression.anger,
        _ => 0.0,
    }
}

/// Counts of channels that actually reached the scene this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub bones_driven: usize,
    pub morphs_driven: usize,
}

/// Stateless per-frame retargeter parameterized by a capability budget.
#[derive(Debug)]
pub struct RetargetEngine {
    budget: CapabilityBudget,
}

impl RetargetEngine {
    pub fn new(budget: CapabilityBudget) -> Self {
        Self { budget }
    }

    /// Drive the scene from one frame's signals. `bound_bones` is the
    /// budget-selected semantic bone list; unresolved channels are skipped.
    pub fn apply(
        &self,
        scene: &mut Scene,
        resolver: &mut RigResolver,
        expression: &ExpressionSignal,
        gesture: &GestureSignal,
        bound_bones: &[String],
    ) -> ApplyStats {
        let mut stats = ApplyStats::default();

        for name in MORPH_CHANNELS.iter().take(self.budget.max_morph_targets) {
            if let Some((node, index)) = resolver.resolve_morph(scene, name) {
                let weight = morph_channel_value(name, expression).clamp(0.0, 1.0);
                scene.set_morph_influence(node, index, weight);
                stats.morphs_driven += 1;
            }
        }

        for name in bound_bones {
            if let Some(target) = self.bone_target(name, expression, gesture) {
                if let Some(id) = resolver.resolve_bone(scene, name) {
                    let current = scene.node(id).rotation;
                    let k = self.budget.animation_responsiveness;
                    let next = [
                        current[0] + (target[0] - current[0]) * k,
                        current[1] + (target[1] - current[1]) * k,
                        current[2] + (target[2] - current[2]) * k,
                    ];
                    scene.set_bone_rotation(id, next);
                    stats.bones_driven += 1;
                }
            }
        }

        stats
    }

    /// Target rotation in radians for one semantic bone, or `None` when no
    /// signal drives it.
    fn bone_target(
        &self,
        name: &str,
        expression: &ExpressionSignal,
        gesture: &GestureSignal,
    ) -> Option<[f32; 3]> {
        let head = &expression.head;
        match name {
            "head" => Some([
                head.pitch.to_radians(),
                head.yaw.to_radians(),
                head.roll.to_radians(),
            ]),
            "neck" => Some([
                (head.pitch * NECK_SHARE).to_radians(),
                (head.yaw * NECK_SHARE).to_radians(),
                (head.roll * NECK_SHARE).to_radians(),
            ]),
            "spine" => Some([0.0, 0.0, gesture.body.lean_deg.to_radians()]),
            "leftUpperArm" => limb_segment(gesture, "leftElbow", UPPER_LIMB_SHARE),
            "leftLowerArm" => limb_segment(gesture, "leftElbow", 1.0 - UPPER_LIMB_SHARE),
            "rightUpperArm" => limb_segment(gesture, "rightElbow", UPPER_LIMB_SHARE),
            "rightLowerArm" => limb_segment(gesture, "rightElbow", 1.0 - UPPER_LIMB_SHARE),
            "leftUpperLeg" => limb_segment(gesture, "leftKnee", UPPER_LIMB_SHARE),
            "leftLowerLeg" => limb_segment(gesture, "leftKnee", 1.0 - UPPER_LIMB_SHARE),
            "rightUpperLeg" => limb_segment(gesture, "rightKnee", UPPER_LIMB_SHARE),
            "rightLowerLeg" => limb_segment(gesture, "rightKnee", 1.0 - UPPER_LIMB_SHARE),
            _ => None,
        }
    }
}

/// Split a joint's bend (180° minus the measured angle) across a limb
/// segment. Missing joint data drives nothing.
fn limb_segment(gesture: &GestureSignal, joint: &str, share: f32) -> Option<[f32; 3]> {
    let angle = gesture.body.joint_angles.get(joint)?;
    let bend = (180.0 - angle).max(0.0);
    Some([0.0, 0.0, (bend * share).to_radians()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{placeholder_bones, PlanTier};
    use crate::expression::ExpressionSignal;
    use crate::gesture::GestureSignal;
    use crate::scene::Scene;

    fn full_scene() -> Scene {
        let mut scene = Scene::new(1);
        let root = scene.root();
        let mut bones = Vec::new();
        for name in crate::capability::BONE_PRIORITY {
            bones.push(scene.add_node(root, name));
        }
        scene.attach_skeleton(root, bones);
        let face = scene.add_node(root, "Face");
        scene.attach_morphs(face, &MORPH_CHANNELS);
        scene
    }

    fn studio_engine() -> RetargetEngine {
        RetargetEngine::new(CapabilityBudget::allocate(PlanTier::Studio))
    }

    #[test]
    fn morph_weights_follow_the_expression() {
        let mut scene = full_scene();
        let mut resolver = RigResolver::new();
        let mut expression = ExpressionSignal::default();
        expression.mouth.openness = 0.8;
        expression.smile = 0.5;
        expression.eyes.left.openness = 1.0;
        expression.eyes.right.openness = 1.0;

        let stats = studio_engine().apply(
            &mut scene,
            &mut resolver,
            &expression,
            &GestureSignal::default(),
            &[],
        );
        assert_eq!(stats.morphs_driven, MORPH_CHANNELS.len());

        let face = *scene.traverse().last().unwrap();
        let morphs = scene.node(face).morphs.as_ref().unwrap();
        assert!((morphs.influences[morphs.dictionary["jawOpen"]] - 0.8).abs() < 1e-6);
        assert!((morphs.influences[morphs.dictionary["smile"]] - 0.5).abs() < 1e-6);
        // Fully open eyes mean zero blink weight.
        assert_eq!(morphs.influences[morphs.dictionary["blinkLeft"]], 0.0);
        assert!(morphs.influences_dirty);
    }

    #[test]
    fn morph_budget_keeps_a_channel_prefix() {
        let mut scene = full_scene();
        let mut resolver = RigResolver::new();
        let engine = RetargetEngine::new(CapabilityBudget {
            max_morph_targets: 2,
            animation_responsiveness: 1.0,
            ..CapabilityBudget::default()
        });

        let mut expression = ExpressionSignal::default();
        expression.eyes.left.openness = 0.0; // blinkLeft would be 1.0

        let stats = engine.apply(
            &mut scene,
            &mut resolver,
            &expression,
            &GestureSignal::default(),
            &[],
        );
        assert_eq!(stats.morphs_driven, 2);

        // blinkLeft sits past the budget prefix and stays untouched.
        let face = *scene.traverse().last().unwrap();
        let morphs = scene.node(face).morphs.as_ref().unwrap();
        assert_eq!(morphs.influences[morphs.dictionary["blinkLeft"]], 0.0);
    }

    #[test]
    fn head_rotation_lands_in_radians() {
        let mut scene = full_scene();
        let mut resolver = RigResolver::new();
        let mut expression = ExpressionSignal::default();
        expression.head.yaw = 45.0;

        studio_engine().apply(
            &mut scene,
            &mut resolver,
            &expression,
            &GestureSignal::default(),
            &["head".to_string(), "neck".to_string()],
        );

        let head = resolver.resolve_bone(&scene, "head").unwrap();
        let neck = resolver.resolve_bone(&scene, "neck").unwrap();
        assert!((scene.node(head).rotation[1] - 45.0_f32.to_radians()).abs() < 1e-5);
        assert!((scene.node(neck).rotation[1] - 13.5_f32.to_radians()).abs() < 1e-5);
        assert!(scene.node(head).needs_pose_update);
    }

    #[test]
    fn elbow_bend_splits_across_arm_segments() {
        let mut scene = full_scene();
        let mut resolver = RigResolver::new();
        let mut gesture = GestureSignal::default();
        gesture
            .body
            .joint_angles
            .insert("leftElbow".to_string(), 90.0);

        studio_engine().apply(
            &mut scene,
            &mut resolver,
            &ExpressionSignal::default(),
            &gesture,
            &["leftUpperArm".to_string(), "leftLowerArm".to_string()],
        );

        let upper = resolver.resolve_bone(&scene, "leftUpperArm").unwrap();
        let lower = resolver.resolve_bone(&scene, "leftLowerArm").unwrap();
        assert!((scene.node(upper).rotation[2] - 27.0_f32.to_radians()).abs() < 1e-5);
        assert!((scene.node(lower).rotation[2] - 63.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn responsiveness_eases_toward_the_target() {
        let mut scene = full_scene();
        let mut resolver = RigResolver::new();
        let engine = RetargetEngine::new(CapabilityBudget {
            animation_responsiveness: 0.5,
            ..CapabilityBudget::allocate(PlanTier::Studio)
        });
        let mut expression = ExpressionSignal::default();
        expression.head.yaw = 40.0;

        let bones = vec!["head".to_string()];
        engine.apply(
            &mut scene,
            &mut resolver,
            &expression,
            &GestureSignal::default(),
            &bones,
        );
        let head = resolver.resolve_bone(&scene, "head").unwrap();
        let after_one = scene.node(head).rotation[1];
        assert!((after_one - 20.0_f32.to_radians()).abs() < 1e-5);

        engine.apply(
            &mut scene,
            &mut resolver,
            &expression,
            &GestureSignal::default(),
            &bones,
        );
        let after_two = scene.node(head).rotation[1];
        assert!((after_two - 30.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn unresolved_channels_are_skipped_quietly() {
        // Scene with no morphs and no bones at all.
        let mut scene = Scene::new(9);
        let mut resolver = RigResolver::new();
        let stats = studio_engine().apply(
            &mut scene,
            &mut resolver,
            &ExpressionSignal::default(),
            &GestureSignal::default(),
            &placeholder_bones(&CapabilityBudget::allocate(PlanTier::Free)),
        );
        assert_eq!(stats, ApplyStats::default());
    }
}
