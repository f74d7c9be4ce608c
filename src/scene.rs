//! In-memory model of the rendering host's scene graph.
//!
//! The real renderer owns the mesh; this module mirrors the slice of it the
//! engine needs: a traversable node hierarchy with names, optional skeleton
//! bone lists, and per-mesh morph target dictionaries with influence
//! weights. Nodes live in an arena and reference each other by index.

use std::collections::HashMap;

use crate::capability::{placeholder_bones, CapabilityBudget};

/// Index of a node within its [`Scene`] arena.
pub type NodeId = usize;

/// A skinned mesh's bone list (node ids into the owning scene).
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub bones: Vec<NodeId>,
}

/// Morph target table of one mesh: name → index dictionary plus the
/// influence weights array the renderer reads.
#[derive(Debug, Clone, Default)]
pub struct MorphTargets {
    pub dictionary: HashMap<String, usize>,
    pub influences: Vec<f32>,
    /// Set when an influence changed since the renderer last drew.
    pub influences_dirty: bool,
}

impl MorphTargets {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut dictionary = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            dictionary.insert(name.as_ref().to_string(), i);
        }
        Self {
            influences: vec![0.0; names.len()],
            dictionary,
            influences_dirty: false,
        }
    }
}

/// One scene graph node.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub children: Vec<NodeId>,
    pub skeleton: Option<Skeleton>,
    pub morphs: Option<MorphTargets>,
    /// Local rotation in radians (x, y, z).
    pub rotation: [f32; 3],
    /// Set when the rotation changed and the skeleton needs a repose.
    pub needs_pose_update: bool,
}

/// Arena-backed scene graph keyed by an asset id; loading a new asset means
/// building a new `Scene` (which invalidates resolver caches).
#[derive(Debug, Clone)]
pub struct Scene {
    asset_id: u64,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Scene {
    pub fn new(asset_id: u64) -> Self {
        let root = Node {
            name: "root".to_string(),
            ..Default::default()
        };
        Self {
            asset_id,
            nodes: vec![root],
            root: 0,
        }
    }

    /// Fresh scene holding only the budget's placeholder bone hierarchy,
    /// for assets that ship no rig at all.
    pub fn with_placeholder_rig(asset_id: u64, budget: &CapabilityBudget) -> Self {
        let mut scene = Self::new(asset_id);
        scene.add_placeholder_rig(budget);
        scene
    }

    /// Attach the budget-sized semantic bone prefix under the root and
    /// register it as this scene's skeleton.
    pub fn add_placeholder_rig(&mut self, budget: &CapabilityBudget) {
        let root = self.root;
        let bones: Vec<NodeId> = placeholder_bones(budget)
            .iter()
            .map(|name| self.add_node(root, name))
            .collect();
        self.attach_skeleton(root, bones);
    }

    pub fn asset_id(&self) -> u64 {
        self.asset_id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a child node under `parent` and return its id.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            ..Default::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn attach_skeleton(&mut self, id: NodeId, bones: Vec<NodeId>) {
        self.nodes[id].skeleton = Some(Skeleton { bones });
    }

    pub fn attach_morphs<S: AsRef<str>>(&mut self, id: NodeId, names: &[S]) {
        self.nodes[id].morphs = Some(MorphTargets::new(names));
    }

    /// Depth-first preorder traversal from the root.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            // Push children reversed so they pop in insertion order.
            for &child in self.nodes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Node ids of every skeleton bone in the scene, traversal order.
    pub fn skeleton_bones(&self) -> Vec<NodeId> {
        let mut bones = Vec::new();
        for id in self.traverse() {
            if let Some(skeleton) = &self.nodes[id].skeleton {
                bones.extend_from_slice(&skeleton.bones);
            }
        }
        bones
    }

    /// Names of every skeleton bone, traversal order.
    pub fn bone_names(&self) -> Vec<String> {
        self.skeleton_bones()
            .into_iter()
            .map(|id| self.nodes[id].name.clone())
            .collect()
    }

    /// Set a bone's local rotation (radians) and flag it for repose.
    pub fn set_bone_rotation(&mut self, id: NodeId, rotation: [f32; 3]) {
        let node = &mut self.nodes[id];
        node.rotation = rotation;
        node.needs_pose_update = true;
    }

    /// Set one morph influence, clamped to [0,1], and flag the mesh dirty.
    /// Out-of-range indices are ignored.
    pub fn set_morph_influence(&mut self, id: NodeId, index: usize, weight: f32) {
        if let Some(morphs) = self.nodes[id].morphs.as_mut() {
            if let Some(slot) = morphs.influences.get_mut(index) {
                *slot = weight.clamp(0.0, 1.0);
                morphs.influences_dirty = true;
            }
        }
    }

    /// Clear all dirty flags (the renderer calls this after drawing).
    pub fn clear_dirty(&mut self) {
        for node in &mut self.nodes {
            node.needs_pose_update = false;
            if let Some(m) = node.morphs.as_mut() {
                m.influences_dirty = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_scene() -> Scene {
        let mut scene = Scene::new(1);
        let root = scene.root();
        let armature = scene.add_node(root, "Armature");
        let head = scene.add_node(armature, "Head");
        let neck = scene.add_node(armature, "Neck");
        scene.attach_skeleton(armature, vec![head, neck]);
        let body = scene.add_node(root, "Body");
        scene.attach_morphs(body, &["jawOpen", "smile"]);
        scene
    }

    #[test]
    fn placeholder_rig_holds_the_priority_prefix() {
        let budget = crate::capability::CapabilityBudget {
            max_bones: 3,
            ..Default::default()
        };
        let scene = Scene::with_placeholder_rig(5, &budget);
        assert_eq!(scene.bone_names(), ["head", "neck", "spine"]);
        assert_eq!(scene.asset_id(), 5);
    }

    #[test]
    fn traversal_is_preorder() {
        let scene = small_scene();
        let names: Vec<&str> = scene
            .traverse()
            .into_iter()
            .map(|id| scene.node(id).name.as_str())
            .collect();
        assert_eq!(names, ["root", "Armature", "Head", "Neck", "Body"]);
    }

    #[test]
    fn bone_names_follow_skeleton() {
        let scene = small_scene();
        assert_eq!(scene.bone_names(), ["Head", "Neck"]);
    }

    #[test]
    fn rotation_marks_pose_dirty() {
        let mut scene = small_scene();
        let head = scene.traverse()[2];
        scene.set_bone_rotation(head, [0.1, 0.2, 0.3]);
        assert!(scene.node(head).needs_pose_update);
        assert_eq!(scene.node(head).rotation, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn morph_influence_clamped_and_dirty() {
        let mut scene = small_scene();
        let body = *scene.traverse().last().unwrap();
        scene.set_morph_influence(body, 0, 1.5);

        let morphs = scene.node(body).morphs.as_ref().unwrap();
        assert_eq!(morphs.influences[0], 1.0);
        assert!(morphs.influences_dirty);

        // Out-of-range index is a no-op.
        scene.clear_dirty();
        scene.set_morph_influence(body, 99, 0.5);
        assert!(!scene.node(body).morphs.as_ref().unwrap().influences_dirty);
    }
}
