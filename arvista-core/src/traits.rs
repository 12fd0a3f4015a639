//! Collaborator traits: the render engine's scene graph, the loaded asset
//! tree, the platform AR session and the engine's ray picker.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::bounds::{Aabb, AssetMetrics};
use crate::error::PlatformError;
use crate::point::{Point3f, Vector3f};
use crate::pose::Pose;

/// Handle of a node owned by the render engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// "Attached to" relation: `local_offset` is a normalized offset in the
/// owner's asset frame. The engine composes the resulting world transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub owner: NodeId,
    pub local_offset: Vector3f,
}

/// Transform and visibility access to nodes the core explicitly owns
pub trait SceneGraph {
    /// Set a node's world position and orientation
    fn set_pose(&mut self, node: NodeId, pose: Pose);

    /// Current world position and orientation of a node
    fn pose(&self, node: NodeId) -> Option<Pose>;

    /// Set a node's uniform scale
    fn set_uniform_scale(&mut self, node: NodeId, scale: f32);

    /// Current uniform scale of a node
    fn uniform_scale(&self, node: NodeId) -> Option<f32>;

    /// Show or hide a node and its attached content
    fn set_visible(&mut self, node: NodeId, visible: bool);

    /// Whether a node is currently visible
    fn is_visible(&self, node: NodeId) -> bool;

    /// Record that `child` follows `owner` at a normalized local offset
    fn attach(&mut self, child: NodeId, owner: NodeId, local_offset: Vector3f);

    /// Attachment of a node, if any
    fn attachment(&self, node: NodeId) -> Option<Attachment>;

    /// Move an attached node within its owner's frame
    fn set_local_offset(&mut self, node: NodeId, offset: Vector3f) {
        if let Some(attachment) = self.attachment(node) {
            self.attach(node, attachment.owner, offset);
        }
    }

    /// Normalized local offset of an attached node
    fn local_offset(&self, node: NodeId) -> Option<Vector3f> {
        self.attachment(node).map(|a| a.local_offset)
    }

    /// World position after composing attachments
    fn world_position(&self, node: NodeId) -> Option<Point3f>;

    /// Declare how normalized offsets of nodes attached to `owner` map into
    /// the owner's asset space
    fn set_offset_frame(&mut self, owner: NodeId, metrics: AssetMetrics);
}

/// Read-only view of a loaded asset's node tree
pub trait AssetTree {
    /// Authored name of a node
    fn name(&self, node: NodeId) -> Option<&str>;

    /// Direct children in declaration order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Bounding box of a node's whole subtree in asset coordinates
    fn subtree_bounds(&self, node: NodeId) -> Option<Aabb>;
}

/// Flatten a tree into `(node, name)` pairs.
///
/// Iterative depth-first pre-order: a node comes before its children and
/// siblings keep declaration order. Unnamed nodes are skipped.
pub fn flatten_named<T>(tree: &T, root: NodeId) -> Vec<(NodeId, String)>
where
    T: AssetTree + ?Sized,
{
    let mut named = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let Some(name) = tree.name(node).filter(|n| !n.is_empty()) {
            named.push((node, name.to_string()));
        }
        stack.extend(tree.children(node).into_iter().rev());
    }

    named
}

/// Output of the asset loader collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedAsset {
    /// Root node of the asset tree
    pub root: NodeId,
    /// Whole-asset bounding box before any placement scale
    pub bounds: Aabb,
}

/// Reference space a hit-test ray is cast from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpace {
    /// Ray through the centre of the viewer
    Viewer,
    /// Floor-aligned local space
    Local,
}

/// Platform handle for a running hit-test subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSource {
    id: u64,
}

impl HitTestSource {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Pending hit-test acquisition; resolves outside the frame callback
pub type HitTestSourceRequest = oneshot::Receiver<Result<HitTestSource, PlatformError>>;

/// The platform AR session's hit-test capability
pub trait HitTestPlatform {
    /// Ask for a hit-test source against `space`. The platform chains the
    /// reference-space request itself and answers on the returned channel.
    fn request_hit_test_source(&mut self, space: ReferenceSpace) -> HitTestSourceRequest;
}

/// A single platform frame
pub trait HitTestFrame {
    /// Surface intersections for `source`, nearest first, as column-major
    /// homogeneous matrices in the session's reference space
    fn hit_test_results(&self, source: &HitTestSource) -> Vec<Matrix4<f32>>;
}

/// The render engine's screen-space ray intersection
pub trait Picker {
    /// Node hit by a ray through the given screen pixel
    fn pick(&self, scene: &dyn SceneGraph, screen_x: f32, screen_y: f32) -> Option<NodeId>;
}
