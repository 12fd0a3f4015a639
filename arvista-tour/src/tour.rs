//! Guided tour over the resolved POIs

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use arvista_core::{Error, ExperienceConfig, NodeId, Result, SceneGraph, Vector3f};

use crate::animator::{AnimationEvent, TransitionAnimator};
use crate::poi::{PoiCatalog, PoiId, PointOfInterest};

/// Tour position and progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourState {
    current_index: usize,
    visited: BTreeSet<PoiId>,
}

impl TourState {
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn visited(&self) -> &BTreeSet<PoiId> {
        &self.visited
    }
}

/// State changes for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    /// The current POI changed
    CurrentChanged { index: usize, id: PoiId },
    /// A POI was visited for the first time
    Visited { id: PoiId, visited: usize, total: usize },
    /// Show the detail card of a POI
    ShowDetail(PoiId),
    /// Close any open detail card
    CloseDetail,
    /// Every POI has been visited; fires once
    TourComplete,
}

/// Tunables for tour transitions and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourSettings {
    pub transition: Duration,
    pub hop_height: f32,
    pub pick_tolerance: f32,
}

impl TourSettings {
    pub fn from_config(config: &ExperienceConfig) -> Self {
        Self {
            transition: Duration::from_millis(config.transition_duration_ms),
            hop_height: config.hop_height,
            pick_tolerance: config.pick_tolerance,
        }
    }
}

impl Default for TourSettings {
    fn default() -> Self {
        Self::from_config(&ExperienceConfig::default())
    }
}

/// Sequential navigation, visit tracking and completion detection.
///
/// Every mutation goes through two primitives: `visit` (grow the visited
/// set, maybe signal completion) and `move_to` (change the current POI and
/// request a transition of the avatar).
#[derive(Debug)]
pub struct TourController {
    catalog: PoiCatalog,
    offsets: Vec<Vector3f>,
    state: TourState,
    avatar: NodeId,
    settings: TourSettings,
    animator: TransitionAnimator,
    completion_reported: bool,
    events: Vec<TourEvent>,
}

impl TourController {
    /// Start a tour at the first POI. The catalog must already be resolved.
    pub fn new(catalog: PoiCatalog, avatar: NodeId, settings: TourSettings) -> Result<Self> {
        let offsets = catalog
            .iter()
            .map(PointOfInterest::offset)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidData("POI offsets have not been resolved".to_string()))?;
        if offsets.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let mut animator = TransitionAnimator::new(settings.hop_height);
        animator.set_offset(avatar, offsets[0]);

        Ok(Self {
            catalog,
            offsets,
            state: TourState::default(),
            avatar,
            settings,
            animator,
            completion_reported: false,
            events: Vec::new(),
        })
    }

    pub fn catalog(&self) -> &PoiCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &TourState {
        &self.state
    }

    pub fn avatar(&self) -> NodeId {
        self.avatar
    }

    pub fn current(&self) -> &PointOfInterest {
        // index is kept in [0, len) and the catalog is never empty
        &self.catalog.as_slice()[self.state.current_index]
    }

    pub fn total(&self) -> usize {
        self.catalog.len()
    }

    pub fn visited_count(&self) -> usize {
        self.state.visited.len()
    }

    pub fn is_complete(&self) -> bool {
        self.visited_count() == self.total()
    }

    pub fn animator(&self) -> &TransitionAnimator {
        &self.animator
    }

    /// Visit the current POI, then advance with wraparound
    pub fn next(&mut self, now: Instant) {
        let id = self.current().id;
        self.visit(id);
        let index = (self.state.current_index + 1) % self.total();
        self.move_to(index, now);
        self.events.push(TourEvent::CloseDetail);
    }

    /// Step back with wraparound; nothing is marked visited
    pub fn previous(&mut self, now: Instant) {
        let total = self.total();
        let index = (self.state.current_index + total - 1) % total;
        self.move_to(index, now);
        self.events.push(TourEvent::CloseDetail);
    }

    /// Visit the current POI and ask the UI to show its details
    pub fn show_current(&mut self) {
        let id = self.current().id;
        self.visit(id);
        self.events.push(TourEvent::ShowDetail(id));
    }

    /// Select the POI whose offset is nearest to `hit` (within the pick
    /// tolerance): visit it, move the avatar there and show its details
    pub fn select_by_offset_hit(&mut self, hit: Vector3f, now: Instant) -> Option<PoiId> {
        let (index, distance) = self
            .offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| (i, (offset - hit).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if !(distance <= self.settings.pick_tolerance) {
            tracing::debug!(distance, "pick did not land on a POI");
            return None;
        }
        self.select_index(index, now)
    }

    /// Select a POI by id, as if its marker had been picked
    pub fn select(&mut self, id: PoiId, now: Instant) -> Option<PoiId> {
        let index = self.catalog.index_of(id)?;
        self.select_index(index, now)
    }

    /// Advance the avatar transition and write it to the scene
    pub fn tick(&mut self, now: Instant, scene: &mut dyn SceneGraph) -> Vec<AnimationEvent> {
        self.animator.tick(now, scene)
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        std::mem::take(&mut self.events)
    }

    fn select_index(&mut self, index: usize, now: Instant) -> Option<PoiId> {
        let id = self.catalog.get(index)?.id;
        self.visit(id);
        self.move_to(index, now);
        self.events.push(TourEvent::ShowDetail(id));
        Some(id)
    }

    fn visit(&mut self, id: PoiId) {
        if !self.state.visited.insert(id) {
            return;
        }
        let (visited, total) = (self.visited_count(), self.total());
        tracing::debug!(poi = id, visited, total, "POI visited");
        self.events.push(TourEvent::Visited { id, visited, total });

        if visited == total && !self.completion_reported {
            self.completion_reported = true;
            tracing::info!(total, "tour complete");
            self.events.push(TourEvent::TourComplete);
        }
    }

    fn move_to(&mut self, index: usize, now: Instant) {
        let from = self
            .animator
            .offset(self.avatar)
            .unwrap_or(self.offsets[self.state.current_index]);
        self.state.current_index = index;
        self.animator
            .animate(self.avatar, from, self.offsets[index], self.settings.transition, now);
        let id = self.current().id;
        self.events.push(TourEvent::CurrentChanged { index, id });
    }
}
