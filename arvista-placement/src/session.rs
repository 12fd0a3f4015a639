//! AR session boundaries: what resets on start, what shows on end

use arvista_core::{Aabb, HitTestFrame, HitTestPlatform, NodeId, Pose, PreviewCamera, SceneGraph};

use crate::placement::{PlacementController, PlacementOutcome, PlacementState, PlacementTarget};
use crate::pose_tracker::{PoseTracker, ReticleSample};

/// Whether an immersive session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Non-AR preview: content visible, camera orbit controls active
    #[default]
    Preview,
    /// Immersive session running
    Active,
}

/// Per-session state shared by the placement components. Owned by the
/// coordinator instead of living in module-level globals.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub tracker: PoseTracker,
    pub placement: PlacementController,
    phase: SessionPhase,
    generation: u64,
}

impl SessionContext {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of sessions started so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn placement_state(&self) -> PlacementState {
        self.placement.state()
    }
}

/// Reacts to session start/end and drives the search-then-place flow
#[derive(Debug)]
pub struct SessionLifecycleCoordinator {
    context: SessionContext,
    content: Vec<NodeId>,
    root: Option<NodeId>,
    camera: PreviewCamera,
    preview_bounds: Option<Aabb>,
    preview_distance: f32,
}

impl SessionLifecycleCoordinator {
    pub fn new(preview_distance: f32) -> Self {
        Self {
            context: SessionContext::default(),
            content: Vec::new(),
            root: None,
            camera: PreviewCamera::default(),
            preview_bounds: None,
            preview_distance,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn camera(&self) -> &PreviewCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PreviewCamera {
        &mut self.camera
    }

    /// Register the asset root: hidden during search, restored to its
    /// authored transform for the preview
    pub fn set_root(&mut self, root: NodeId, bounds: Aabb) {
        self.root = Some(root);
        self.preview_bounds = Some(bounds);
        self.register_content(root);
        self.camera.frame_bounds(&bounds, self.preview_distance);
    }

    /// Register a node that is only shown once placed (markers, avatar)
    pub fn register_content(&mut self, node: NodeId) {
        if !self.content.contains(&node) {
            self.content.push(node);
        }
    }

    pub fn content(&self) -> &[NodeId] {
        &self.content
    }

    /// Hide placed content and restart surface search
    pub fn on_session_start(&mut self, scene: &mut dyn SceneGraph) {
        for node in &self.content {
            scene.set_visible(*node, false);
        }
        self.context.placement.reset();
        self.context.tracker.release();
        self.context.phase = SessionPhase::Active;
        self.context.generation += 1;
        tracing::info!(generation = self.context.generation, "AR session started; searching for a surface");
    }

    /// Show content for the non-AR preview and reset the preview framing
    pub fn on_session_end(&mut self, scene: &mut dyn SceneGraph) {
        self.context.tracker.release();
        if let Some(root) = self.root {
            scene.set_pose(root, Pose::identity());
            scene.set_uniform_scale(root, 1.0);
        }
        for node in &self.content {
            scene.set_visible(*node, true);
        }
        if let Some(bounds) = self.preview_bounds {
            self.camera.frame_bounds(&bounds, self.preview_distance);
        }
        self.context.phase = SessionPhase::Preview;
        tracing::info!(generation = self.context.generation, "AR session ended; preview restored");
    }

    /// Per-frame search step: (re)acquire while unplaced, sample, and
    /// attempt placement. Returns the sample and the placement outcome.
    pub fn search_frame(
        &mut self,
        platform: &mut dyn HitTestPlatform,
        frame: &dyn HitTestFrame,
        confirm: bool,
        target: Option<&PlacementTarget>,
        scene: &mut dyn SceneGraph,
    ) -> (ReticleSample, PlacementOutcome) {
        let context = &mut self.context;
        if context.phase != SessionPhase::Active {
            return (ReticleSample::hidden(), PlacementOutcome::NotReady);
        }
        if context.placement.state() == PlacementState::Placed {
            return (ReticleSample::hidden(), PlacementOutcome::AlreadyPlaced);
        }

        context.tracker.acquire(platform);
        let sample = context.tracker.sample(frame);
        let outcome = match target {
            Some(target) => context
                .placement
                .try_place(&sample, confirm, target, scene, &mut context.tracker),
            None => PlacementOutcome::NotReady,
        };
        (sample, outcome)
    }
}

impl Default for SessionLifecycleCoordinator {
    fn default() -> Self {
        Self::new(2.5)
    }
}
