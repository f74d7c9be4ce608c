//! Name resolution from semantic animation channels to scene graph targets.
//!
//! Rig assets name their bones and morphs freely ("mixamorig:Head",
//! "Fcl_MTH_A", ...). The resolver walks the scene once per channel,
//! matching case-insensitively against the semantic name and a small
//! synonym set, and caches the outcome so steady-state retargeting does
//! no traversal at all. Misses cache as [`ChannelBinding::Unbound`] and
//! are logged once per asset.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::scene::{NodeId, Scene};

/// Resolved target of one animation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBinding {
    /// No matching bone or morph in the asset. Driving this channel is a
    /// silent no-op, never an error.
    Unbound,
    Bone(NodeId),
    Morph { node: NodeId, index: usize },
}

/// Per-asset binding cache. The cache lives as long as the asset: a scene
/// with a different asset id clears it on the next lookup.
#[derive(Debug, Default)]
pub struct RigResolver {
    asset_id: u64,
    cache: HashMap<String, ChannelBinding>,
}

/// Alternate spellings tried after the semantic name itself.
fn synonyms(name: &str) -> [String; 5] {
    [
        name.to_string(),
        format!("morph_{name}"),
        format!("{name}Shape"),
        format!("blend_{name}"),
        format!("face_{name}"),
    ]
}

/// Case-insensitive match with substring tolerance in both directions, so
/// "mixamorig:Head" matches "head" and "jaw" matches "jawOpen".
fn name_matches(candidate: &str, wanted: &str) -> bool {
    let c = candidate.to_lowercase();
    let w = wanted.to_lowercase();
    c == w || c.contains(&w) || w.contains(&c)
}

impl RigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached binding. Called when the attached asset changes.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    fn sync_asset(&mut self, scene: &Scene) {
        if self.asset_id != scene.asset_id() {
            self.asset_id = scene.asset_id();
            self.cache.clear();
        }
    }

    /// Resolve a semantic bone name to a skeleton node, consulting the
    /// cache first. Returns `None` when the asset has no such bone.
    pub fn resolve_bone(&mut self, scene: &Scene, name: &str) -> Option<NodeId> {
        self.sync_asset(scene);
        let key = format!("bone:{name}");
        if let Some(binding) = self.cache.get(&key) {
            return match binding {
                ChannelBinding::Bone(id) => Some(*id),
                _ => None,
            };
        }

        let binding = search_bone(scene, name)
            .map(ChannelBinding::Bone)
            .unwrap_or(ChannelBinding::Unbound);
        if binding == ChannelBinding::Unbound {
            log::debug!(
                "asset {}: no bone for '{}' (available: {:?})",
                scene.asset_id(),
                name,
                scene.bone_names()
            );
        }
        self.cache.insert(key, binding);
        match binding {
            ChannelBinding::Bone(id) => Some(id),
            _ => None,
        }
    }

    /// Resolve a semantic morph channel to a (mesh node, influence index)
    /// pair, consulting the cache first.
    pub fn resolve_morph(&mut self, scene: &Scene, name: &str) -> Option<(NodeId, usize)> {
        self.sync_asset(scene);
        let key = format!("morph:{name}");
        if let Some(binding) = self.cache.get(&key) {
            return match binding {
                ChannelBinding::Morph { node, index } => Some((*node, *index)),
                _ => None,
            };
        }

        let binding = search_morph(scene, name)
            .map(|(node, index)| ChannelBinding::Morph { node, index })
            .unwrap_or(ChannelBinding::Unbound);
        if binding == ChannelBinding::Unbound {
            log::debug!(
                "asset {}: no morph target for '{}'",
                scene.asset_id(),
                name
            );
        }
        self.cache.insert(key, binding);
        match binding {
            ChannelBinding::Morph { node, index } => Some((node, index)),
            _ => None,
        }
    }

    /// Like [`Self::resolve_bone`] for hosts that treat a missing channel
    /// as a hard failure (asset validation tooling) rather than the
    /// silent-skip default.
    pub fn require_bone(&mut self, scene: &Scene, name: &str) -> Result<NodeId> {
        self.resolve_bone(scene, name)
            .ok_or_else(|| Error::BindingNotFound {
                channel: name.to_string(),
                asset_id: scene.asset_id(),
            })
    }

    /// Strict counterpart of [`Self::resolve_morph`].
    pub fn require_morph(&mut self, scene: &Scene, name: &str) -> Result<(NodeId, usize)> {
        self.resolve_morph(scene, name)
            .ok_or_else(|| Error::BindingNotFound {
                channel: name.to_string(),
                asset_id: scene.asset_id(),
            })
    }
}

fn search_bone(scene: &Scene, name: &str) -> Option<NodeId> {
    let wanted = synonyms(name);
    let order = scene.traverse();

    // Skeleton bone lists first: a skinned mesh's rig is the authoritative
    // place for semantic bones.
    let bones = scene.skeleton_bones();
    for w in &wanted {
        if let Some(&id) = bones
            .iter()
            .find(|&&id| scene.node(id).name.eq_ignore_ascii_case(w))
        {
            return Some(id);
        }
    }
    for w in &wanted {
        if let Some(&id) = bones.iter().find(|&&id| name_matches(&scene.node(id).name, w)) {
            return Some(id);
        }
    }

    // Fall back to plain nodes for rigless assets, exact match first.
    for w in &wanted {
        if let Some(&id) = order
            .iter()
            .find(|&&id| scene.node(id).name.eq_ignore_ascii_case(w))
        {
            return Some(id);
        }
    }
    for w in &wanted {
        if let Some(&id) = order
            .iter()
            .find(|&&id| name_matches(&scene.node(id).name, w))
        {
            return Some(id);
        }
    }
    None
}

fn search_morph(scene: &Scene, name: &str) -> Option<(NodeId, usize)> {
    let wanted = synonyms(name);
    for id in scene.traverse() {
        let Some(morphs) = &scene.node(id).morphs else {
            continue;
        };
        // Exact (case-insensitive) dictionary hits beat substring hits.
        for w in &wanted {
            if let Some((_, &index)) = morphs
                .dictionary
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(w))
            {
                return Some((id, index));
            }
        }
        for w in &wanted {
            let mut hits: Vec<(&String, usize)> = morphs
                .dictionary
                .iter()
                .filter(|(k, _)| name_matches(k, w))
                .map(|(k, &v)| (k, v))
                .collect();
            // Deterministic pick when several keys contain the name.
            hits.sort();
            if let Some(&(_, index)) = hits.first() {
                return Some((id, index));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rigged_scene(asset_id: u64) -> Scene {
        let mut scene = Scene::new(asset_id);
        let root = scene.root();
        let armature = scene.add_node(root, "Armature");
        let head = scene.add_node(armature, "mixamorig:Head");
        let neck = scene.add_node(armature, "mixamorig:Neck");
        scene.attach_skeleton(armature, vec![head, neck]);
        let face = scene.add_node(root, "Face");
        scene.attach_morphs(face, &["jawOpen", "blend_smile", "Mouth_Open_L"]);
        scene
    }

    #[test]
    fn bone_matches_by_substring_ignoring_case() {
        let scene = rigged_scene(1);
        let mut resolver = RigResolver::new();
        let head = resolver.resolve_bone(&scene, "head").unwrap();
        assert_eq!(scene.node(head).name, "mixamorig:Head");
    }

    #[test]
    fn rigless_node_matches_by_substring() {
        // No skeleton at all: the plain-node walk still tolerates naming
        // like "Head_01".
        let mut scene = Scene::new(4);
        let root = scene.root();
        let head = scene.add_node(root, "Head_01");
        let mut resolver = RigResolver::new();
        assert_eq!(resolver.resolve_bone(&scene, "head"), Some(head));
    }

    #[test]
    fn morph_matches_exact_then_synonym() {
        let scene = rigged_scene(1);
        let mut resolver = RigResolver::new();
        assert!(resolver.resolve_morph(&scene, "jawOpen").is_some());
        // "smile" only exists as "blend_smile".
        assert!(resolver.resolve_morph(&scene, "smile").is_some());
    }

    #[test]
    fn unmatched_channel_is_unbound_not_an_error() {
        let scene = rigged_scene(1);
        let mut resolver = RigResolver::new();
        assert!(resolver.resolve_morph(&scene, "cheekPuff").is_none());
        assert!(resolver.resolve_bone(&scene, "tail").is_none());
    }

    #[test]
    fn strict_lookup_names_the_channel_and_asset() {
        let scene = rigged_scene(11);
        let mut resolver = RigResolver::new();
        assert!(resolver.require_bone(&scene, "head").is_ok());

        let err = resolver.require_morph(&scene, "cheekPuff").unwrap_err();
        match err {
            Error::BindingNotFound { channel, asset_id } => {
                assert_eq!(channel, "cheekPuff");
                assert_eq!(asset_id, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn second_lookup_comes_from_cache() {
        let mut scene = rigged_scene(1);
        let mut resolver = RigResolver::new();
        let head = resolver.resolve_bone(&scene, "head").unwrap();

        // Rename the node; the cached binding must survive unchanged
        // because no traversal happens for the same asset.
        scene.node_mut(head).name = "renamed".to_string();
        assert_eq!(resolver.resolve_bone(&scene, "head"), Some(head));
    }

    #[test]
    fn new_asset_id_invalidates_cache() {
        let scene_a = rigged_scene(1);
        let mut resolver = RigResolver::new();
        assert!(resolver.resolve_bone(&scene_a, "head").is_some());

        // A fresh asset without a head bone must resolve to nothing even
        // though the old asset cached a hit for the same channel.
        let mut scene_b = Scene::new(2);
        let root = scene_b.root();
        let limb = scene_b.add_node(root, "leftHand");
        scene_b.attach_skeleton(root, vec![limb]);
        assert!(resolver.resolve_bone(&scene_b, "head").is_none());
    }

    #[test]
    fn mismatched_vocabulary_stays_quiet() {
        // Asset ships "Mouth_Open_L"; the engine drives "jawDrop". Nothing
        // matches, and repeated lookups stay cheap no-ops.
        let mut scene = Scene::new(7);
        let root = scene.root();
        let face = scene.add_node(root, "Face");
        scene.attach_morphs(face, &["Mouth_Open_L", "Eye_Close_R"]);

        let mut resolver = RigResolver::new();
        for _ in 0..3 {
            assert!(resolver.resolve_morph(&scene, "jawDrop").is_none());
        }
    }
}
