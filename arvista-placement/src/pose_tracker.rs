//! Per-session hit-test source acquisition and per-frame reticle sampling

use arvista_core::{
    HitTestFrame, HitTestPlatform, HitTestSource, HitTestSourceRequest, PlatformError, Pose,
    ReferenceSpace,
};
use tokio::sync::oneshot::error::TryRecvError;

/// Outcome of hit-testing for one frame. Recomputed every frame, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReticleSample {
    pub visible: bool,
    pub pose: Option<Pose>,
}

impl ReticleSample {
    /// No surface this frame
    pub fn hidden() -> Self {
        Self { visible: false, pose: None }
    }

    /// Surface found at `pose`
    pub fn at(pose: Pose) -> Self {
        Self { visible: true, pose: Some(pose) }
    }
}

/// Public view of the acquisition state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    NotRequested,
    Requesting,
    Ready,
    Failed,
}

#[derive(Debug)]
enum SourceState {
    NotRequested,
    Requesting(HitTestSourceRequest),
    Ready(HitTestSource),
    Failed(PlatformError),
}

/// Wraps the platform hit-test capability for one AR session at a time
#[derive(Debug)]
pub struct PoseTracker {
    space: ReferenceSpace,
    state: SourceState,
    unreported_failure: Option<PlatformError>,
}

impl PoseTracker {
    /// Tracker casting hit-test rays from the viewer
    pub fn new() -> Self {
        Self::with_space(ReferenceSpace::Viewer)
    }

    pub fn with_space(space: ReferenceSpace) -> Self {
        Self {
            space,
            state: SourceState::NotRequested,
            unreported_failure: None,
        }
    }

    /// Request the hit-test source unless a request has already been made
    /// this session. A failed request is not retried until [`release`].
    ///
    /// [`release`]: PoseTracker::release
    pub fn acquire(&mut self, platform: &mut dyn HitTestPlatform) {
        if matches!(self.state, SourceState::NotRequested) {
            tracing::debug!(space = ?self.space, "requesting hit-test source");
            self.state = SourceState::Requesting(platform.request_hit_test_source(self.space));
        }
    }

    /// Sample the nearest surface for this frame
    pub fn sample(&mut self, frame: &dyn HitTestFrame) -> ReticleSample {
        self.poll();

        let SourceState::Ready(source) = &self.state else {
            return ReticleSample::hidden();
        };

        // nearest first by platform ordering; no re-ranking
        match frame.hit_test_results(source).first() {
            Some(matrix) => match Pose::from_matrix(matrix) {
                Some(pose) => ReticleSample::at(pose),
                None => {
                    tracing::debug!("discarding degenerate hit-test pose");
                    ReticleSample::hidden()
                }
            },
            None => ReticleSample::hidden(),
        }
    }

    /// Drop the cached source (or the pending request). The next
    /// [`acquire`](PoseTracker::acquire) asks the platform again.
    pub fn release(&mut self) {
        if !matches!(self.state, SourceState::NotRequested) {
            tracing::debug!(status = ?self.status(), "releasing hit-test source");
        }
        self.state = SourceState::NotRequested;
        self.unreported_failure = None;
    }

    pub fn status(&self) -> TrackerStatus {
        match self.state {
            SourceState::NotRequested => TrackerStatus::NotRequested,
            SourceState::Requesting(_) => TrackerStatus::Requesting,
            SourceState::Ready(_) => TrackerStatus::Ready,
            SourceState::Failed(_) => TrackerStatus::Failed,
        }
    }

    /// Cached source, if acquisition has completed
    pub fn source(&self) -> Option<&HitTestSource> {
        match &self.state {
            SourceState::Ready(source) => Some(source),
            _ => None,
        }
    }

    /// Failure of this session's acquisition, if any
    pub fn failure(&self) -> Option<&PlatformError> {
        match &self.state {
            SourceState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// One-shot notice of a newly failed acquisition
    pub fn take_failure(&mut self) -> Option<PlatformError> {
        self.unreported_failure.take()
    }

    fn poll(&mut self) {
        let SourceState::Requesting(request) = &mut self.state else {
            return;
        };

        let next = match request.try_recv() {
            Err(TryRecvError::Empty) => return,
            Ok(Ok(source)) => {
                tracing::info!(source = source.id(), "hit-test source ready");
                SourceState::Ready(source)
            }
            Ok(Err(e)) => Self::fail(&mut self.unreported_failure, e),
            Err(TryRecvError::Closed) => Self::fail(
                &mut self.unreported_failure,
                PlatformError("hit-test request abandoned by platform".to_string()),
            ),
        };
        self.state = next;
    }

    fn fail(slot: &mut Option<PlatformError>, e: PlatformError) -> SourceState {
        tracing::warn!(error = %e, "hit-test source unavailable; placement disabled for this session");
        *slot = Some(e.clone());
        SourceState::Failed(e)
    }
}

impl Default for PoseTracker {
    fn default() -> Self {
        Self::new()
    }
}
