//! Plan-tier capability gating.
//!
//! A subscription tier maps to a [`CapabilityBudget`] that caps how many
//! bones and morph channels the engine animates and how fast it ticks.
//! Selection is a pure, priority-stable truncation so the same plan always
//! animates the same subset regardless of how an asset enumerates its bones.

use serde::{Deserialize, Serialize};

/// Subscription tiers supplied by the external plan service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Creator,
    Pro,
    Studio,
}

/// Per-tier animation budget. The engine never creates or animates more
/// bones/morphs than this allows, even when the asset supports more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapabilityBudget {
    pub max_bones: usize,
    pub max_morph_targets: usize,
    /// Smoothing responsiveness multiplier in (0,1].
    pub animation_responsiveness: f32,
    /// Target retargeting rate in frames per second.
    pub max_frame_rate: f32,
}

impl CapabilityBudget {
    /// Budget for a plan tier.
    pub fn allocate(plan: PlanTier) -> Self {
        match plan {
            PlanTier::Free => Self {
                max_bones: 8,
                max_morph_targets: 4,
                animation_responsiveness: 0.5,
                max_frame_rate: 15.0,
            },
            PlanTier::Creator => Self {
                max_bones: 16,
                max_morph_targets: 12,
                animation_responsiveness: 0.7,
                max_frame_rate: 24.0,
            },
            PlanTier::Pro => Self {
                max_bones: 32,
                max_morph_targets: 32,
                animation_responsiveness: 0.85,
                max_frame_rate: 30.0,
            },
            PlanTier::Studio => Self {
                max_bones: 64,
                max_morph_targets: 64,
                animation_responsiveness: 1.0,
                max_frame_rate: 60.0,
            },
        }
    }
}

impl Default for CapabilityBudget {
    fn default() -> Self {
        Self::allocate(PlanTier::Free)
    }
}

/// Fixed animation priority for semantic bones: head first, extremities
/// last. Truncation by budget always keeps a prefix of this order.
pub const BONE_PRIORITY: [&str; 16] = [
    "head",
    "neck",
    "spine",
    "leftShoulder",
    "rightShoulder",
    "leftUpperArm",
    "rightUpperArm",
    "leftLowerArm",
    "rightLowerArm",
    "leftHand",
    "rightHand",
    "hips",
    "leftUpperLeg",
    "rightUpperLeg",
    "leftLowerLeg",
    "rightLowerLeg",
];

/// Select the bones to animate: candidates reordered into the fixed
/// priority order (unknown names keep their relative order after the known
/// ones), truncated to `budget.max_bones`. Matching is case-insensitive
/// and known names come back in their semantic spelling. Zero budget
/// yields no bones.
pub fn select_bones(candidates: &[String], budget: &CapabilityBudget) -> Vec<String> {
    let mut selected: Vec<String> = Vec::with_capacity(candidates.len());
    for name in BONE_PRIORITY {
        if candidates.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            selected.push(name.to_string());
        }
    }
    for c in candidates {
        if !BONE_PRIORITY.iter().any(|p| p.eq_ignore_ascii_case(c)) {
            selected.push(c.clone());
        }
    }
    selected.truncate(budget.max_bones);
    selected
}

/// Semantic bone names synthesized for assets that expose no rig at all:
/// the budget-sized prefix of the priority list.
pub fn placeholder_bones(budget: &CapabilityBudget) -> Vec<String> {
    BONE_PRIORITY
        .iter()
        .take(budget.max_bones)
        .map(|s| s.to_string())
        .collect()
}
