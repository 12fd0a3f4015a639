//! In-memory scene graph
//!
//! A small arena-backed implementation of [`SceneGraph`] and [`AssetTree`]
//! for headless sessions and tests. Real render engines provide their own.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::bounds::{Aabb, AssetMetrics};
use crate::point::{Point3f, Vector3f};
use crate::pose::Pose;
use crate::traits::{AssetTree, Attachment, LoadedAsset, NodeId, SceneGraph};

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    children: Vec<NodeId>,
    geometry: Option<Aabb>,
    pose: Pose,
    scale: f32,
    visible: bool,
    attachment: Option<Attachment>,
}

/// Arena of named nodes with geometry bounds, poses and attachments
#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    nodes: Vec<SceneNode>,
    offset_frames: HashMap<NodeId, AssetMetrics>,
}

impl InMemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node, optionally below `parent`
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: name.into(),
            children: Vec::new(),
            geometry: None,
            pose: Pose::identity(),
            scale: 1.0,
            visible: true,
            attachment: None,
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0 as usize)) {
            parent.children.push(id);
        }
        id
    }

    /// Add a node carrying geometry with the given asset-space bounds
    pub fn add_mesh(&mut self, name: impl Into<String>, parent: Option<NodeId>, bounds: Aabb) -> NodeId {
        let id = self.add_node(name, parent);
        self.nodes[id.0 as usize].geometry = Some(bounds);
        id
    }

    /// Package a subtree as the asset loader would hand it over
    pub fn loaded_asset(&self, root: NodeId) -> Option<LoadedAsset> {
        self.subtree_bounds(root).map(|bounds| LoadedAsset { root, bounds })
    }

    /// Find the first node with exactly this name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let node = self.nodes.get_mut(id.0 as usize);
        if node.is_none() {
            tracing::warn!(node = %id, "write to unknown scene node ignored");
        }
        node
    }

    fn compose_position(&self, id: NodeId, depth: usize) -> Option<Point3f> {
        let node = self.node(id)?;
        let Some(attachment) = node.attachment else {
            return Some(node.pose.position);
        };
        if depth > self.nodes.len() {
            return None;
        }

        let owner = self.node(attachment.owner)?;
        let owner_position = self.compose_position(attachment.owner, depth + 1)?;
        let local = match self.offset_frames.get(&attachment.owner) {
            Some(frame) => frame.denormalize(&attachment.local_offset),
            None => Point3f::from(attachment.local_offset),
        };
        let rotated: Vector3<f32> = owner.pose.transform_vector(&(local.coords * owner.scale));
        Some(owner_position + rotated)
    }
}

impl SceneGraph for InMemoryScene {
    fn set_pose(&mut self, node: NodeId, pose: Pose) {
        if let Some(n) = self.node_mut(node) {
            n.pose = pose;
        }
    }

    fn pose(&self, node: NodeId) -> Option<Pose> {
        self.node(node).map(|n| n.pose)
    }

    fn set_uniform_scale(&mut self, node: NodeId, scale: f32) {
        if let Some(n) = self.node_mut(node) {
            n.scale = scale;
        }
    }

    fn uniform_scale(&self, node: NodeId) -> Option<f32> {
        self.node(node).map(|n| n.scale)
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.node_mut(node) {
            n.visible = visible;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.visible)
    }

    fn attach(&mut self, child: NodeId, owner: NodeId, local_offset: Vector3f) {
        if let Some(n) = self.node_mut(child) {
            n.attachment = Some(Attachment { owner, local_offset });
        }
    }

    fn attachment(&self, node: NodeId) -> Option<Attachment> {
        self.node(node).and_then(|n| n.attachment)
    }

    fn world_position(&self, node: NodeId) -> Option<Point3f> {
        self.compose_position(node, 0)
    }

    fn set_offset_frame(&mut self, owner: NodeId, metrics: AssetMetrics) {
        self.offset_frames.insert(owner, metrics);
    }
}

impl AssetTree for InMemoryScene {
    fn name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn subtree_bounds(&self, node: NodeId) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.node(id) else { continue };
            if let Some(geometry) = n.geometry {
                bounds = Some(match bounds {
                    Some(b) => b.union(&geometry),
                    None => geometry,
                });
            }
            stack.extend(n.children.iter().copied());
        }
        bounds
    }
}
