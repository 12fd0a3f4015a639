//! One-shot placement of the virtual scene onto a detected surface

use arvista_core::{AssetMetrics, NodeId, Pose, SceneGraph};

use crate::pose_tracker::{PoseTracker, ReticleSample};

/// Whether the scene has been bound to a surface this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementState {
    #[default]
    Unplaced,
    Placed,
}

/// What gets placed and how large it should appear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTarget {
    /// Root anchor node of the loaded asset
    pub node: NodeId,
    /// Metrics captured at load time, before any scaling
    pub metrics: AssetMetrics,
    /// World size in metres of the asset's longest edge once placed
    pub world_size: f32,
}

impl PlacementTarget {
    /// Uniform scale applied on placement
    pub fn scale(&self) -> f32 {
        self.metrics.scale_for(self.world_size)
    }
}

/// The transform committed by a successful placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRecord {
    pub pose: Pose,
    pub scale: f32,
}

/// Result of a placement attempt. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// The transaction ran on this call
    Placed(PlacementRecord),
    /// A placement already happened this session
    AlreadyPlaced,
    /// No confirm, no visible surface, or nothing usable to place yet
    NotReady,
}

/// Runs the at-most-once placement transaction
#[derive(Debug, Default)]
pub struct PlacementController {
    state: PlacementState,
    record: Option<PlacementRecord>,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    /// Transform committed this session, if placed
    pub fn record(&self) -> Option<&PlacementRecord> {
        self.record.as_ref()
    }

    /// Place `target` at the sampled surface if the user confirmed this frame.
    ///
    /// Everything is validated before the scene is touched, so either the
    /// pose, scale, visibility and state all change or none do. On success
    /// the tracker's hit-test source is released.
    pub fn try_place(
        &mut self,
        sample: &ReticleSample,
        confirm: bool,
        target: &PlacementTarget,
        scene: &mut dyn SceneGraph,
        tracker: &mut PoseTracker,
    ) -> PlacementOutcome {
        if self.state == PlacementState::Placed {
            return PlacementOutcome::AlreadyPlaced;
        }
        if !confirm || !sample.visible {
            return PlacementOutcome::NotReady;
        }
        let Some(pose) = sample.pose.filter(Pose::is_finite) else {
            return PlacementOutcome::NotReady;
        };
        let scale = target.scale();
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!(scale, world_size = target.world_size, "refusing placement with unusable scale");
            return PlacementOutcome::NotReady;
        }

        scene.set_pose(target.node, pose);
        scene.set_uniform_scale(target.node, scale);
        scene.set_visible(target.node, true);

        let record = PlacementRecord { pose, scale };
        self.state = PlacementState::Placed;
        self.record = Some(record);
        tracker.release();

        tracing::info!(
            node = %target.node,
            x = pose.position.x,
            y = pose.position.y,
            z = pose.position.z,
            scale,
            "scene placed"
        );
        PlacementOutcome::Placed(record)
    }

    /// Back to `Unplaced`; only the session coordinator calls this
    pub fn reset(&mut self) {
        self.state = PlacementState::Unplaced;
        self.record = None;
    }
}
