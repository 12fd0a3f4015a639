//! Time-based transitions of attached nodes between two offsets

use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::time::{Duration, Instant};

use arvista_core::{NodeId, SceneGraph, Vector3f};

/// Symmetric quadratic ease-in/ease-out on `p` in `[0, 1]`
pub fn ease_in_out_quad(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        1.0 - 2.0 * (1.0 - p) * (1.0 - p)
    }
}

/// Offset of a transition at normalized progress `p`: eased linear
/// interpolation plus a vertical hop peaking halfway
pub fn interpolate(from: &Vector3f, to: &Vector3f, hop_height: f32, p: f32) -> Vector3f {
    let p = p.clamp(0.0, 1.0);
    let mut offset = from.lerp(to, ease_in_out_quad(p));
    offset.y += hop_height * (PI * p).sin();
    offset
}

/// What happened to a node during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    /// Intermediate offset written
    Tick { owner: NodeId, offset: Vector3f },
    /// Final offset written; fires once per transition
    Completed { owner: NodeId, offset: Vector3f },
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: Vector3f,
    to: Vector3f,
    started: Instant,
    duration: Duration,
}

impl Transition {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Single-flight tween engine: at most one transition per node, the newest
/// request replacing any in flight
#[derive(Debug, Clone, Default)]
pub struct TransitionAnimator {
    hop_height: f32,
    active: BTreeMap<NodeId, Transition>,
    offsets: BTreeMap<NodeId, Vector3f>,
}

impl TransitionAnimator {
    pub fn new(hop_height: f32) -> Self {
        Self {
            hop_height,
            ..Default::default()
        }
    }

    /// Record where a node currently is without animating it
    pub fn set_offset(&mut self, owner: NodeId, offset: Vector3f) {
        self.active.remove(&owner);
        self.offsets.insert(owner, offset);
    }

    /// Last offset written for a node
    pub fn offset(&self, owner: NodeId) -> Option<Vector3f> {
        self.offsets.get(&owner).copied()
    }

    /// Start moving `owner` from `from` to `to` over `duration`, starting
    /// at `now`. Returns true if an unfinished transition was superseded.
    pub fn animate(&mut self, owner: NodeId, from: Vector3f, to: Vector3f, duration: Duration, now: Instant) -> bool {
        let superseded = self
            .active
            .insert(
                owner,
                Transition {
                    from,
                    to,
                    started: now,
                    duration,
                },
            )
            .is_some();
        if superseded {
            tracing::debug!(node = %owner, "transition superseded");
        }
        self.offsets.insert(owner, from);
        superseded
    }

    pub fn is_animating(&self, owner: NodeId) -> bool {
        self.active.contains_key(&owner)
    }

    /// Whether any transition is in flight
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every transition to `now` and write the offsets to the scene.
    /// Finished transitions land exactly on their target and are dropped.
    pub fn tick(&mut self, now: Instant, scene: &mut dyn SceneGraph) -> Vec<AnimationEvent> {
        let mut events = Vec::with_capacity(self.active.len());
        let mut finished = Vec::new();

        for (&owner, transition) in &self.active {
            let p = transition.progress(now);
            let (offset, event) = if p >= 1.0 {
                finished.push(owner);
                (transition.to, AnimationEvent::Completed { owner, offset: transition.to })
            } else {
                let offset = interpolate(&transition.from, &transition.to, self.hop_height, p);
                (offset, AnimationEvent::Tick { owner, offset })
            };
            scene.set_local_offset(owner, offset);
            self.offsets.insert(owner, offset);
            events.push(event);
        }

        for owner in finished {
            self.active.remove(&owner);
        }
        events
    }
}
