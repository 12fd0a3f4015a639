//! Frame-driven orchestration of placement and tour
//!
//! Per frame, in order: hit-test sampling and the placement attempt while
//! unplaced, then the tour transition tick. Rendering is left to the engine.

use std::time::Instant;

use arvista_core::{
    AssetMetrics, AssetTree, Error, ExperienceConfig, HitTestFrame, HitTestPlatform, LoadedAsset,
    NodeId, Picker, PreviewCamera, Result, SceneGraph,
};
use arvista_placement::{
    PlacementOutcome, PlacementState, PlacementTarget, SessionLifecycleCoordinator, SessionPhase,
    TrackerStatus,
};
use arvista_tour::{
    FallbackLayout, LocatorReport, PoiCatalog, PoiLocator, PointOfInterest, TourController,
    TourEvent, TourSettings,
};

use crate::ui::{UiCommand, UiEvent};

/// Engine nodes the experience drives. Markers pair with POIs in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNodes {
    pub reticle: NodeId,
    pub avatar: NodeId,
    pub markers: Vec<NodeId>,
}

#[derive(Debug)]
enum AssetPhase {
    /// Waiting for the loader, or it failed
    NoAsset,
    Ready { target: PlacementTarget },
}

/// One AR placement-and-tour experience over a scene
pub struct Experience<S> {
    config: ExperienceConfig,
    scene: S,
    nodes: ContentNodes,
    coordinator: SessionLifecycleCoordinator,
    catalog: Option<PoiCatalog>,
    tour: Option<TourController>,
    asset: AssetPhase,
    picker: Option<Box<dyn Picker>>,
    confirm_pending: bool,
    events: Vec<UiEvent>,
}

impl<S> Experience<S>
where
    S: SceneGraph + AssetTree,
{
    pub fn new(config: ExperienceConfig, mut scene: S, nodes: ContentNodes) -> Result<Self> {
        config.validate()?;
        let catalog = PoiCatalog::from_config(&config)?;
        if nodes.markers.len() != catalog.len() {
            return Err(Error::InvalidData(format!(
                "{} markers for {} POIs",
                nodes.markers.len(),
                catalog.len()
            )));
        }

        scene.set_visible(nodes.reticle, false);
        let coordinator = SessionLifecycleCoordinator::new(config.preview_distance);

        Ok(Self {
            config,
            scene,
            nodes,
            coordinator,
            catalog: Some(catalog),
            tour: None,
            asset: AssetPhase::NoAsset,
            picker: None,
            confirm_pending: false,
            events: Vec::new(),
        })
    }

    /// Install the engine's ray picker used by [`UiCommand::PickAt`]
    pub fn set_picker(&mut self, picker: Box<dyn Picker>) {
        self.picker = Some(picker);
    }

    /// Bind the loaded asset: capture its metrics, resolve POI offsets once
    /// and attach markers and avatar. A load failure leaves the experience
    /// without an asset; placement and tour stay unreachable.
    pub fn on_asset_loaded(&mut self, loaded: Result<LoadedAsset>) -> Option<LocatorReport> {
        let asset = match loaded {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(error = %e, "asset failed to load");
                return None;
            }
        };
        if matches!(self.asset, AssetPhase::Ready { .. }) {
            tracing::warn!(root = %asset.root, "asset already bound; ignoring second load");
            return None;
        }

        match self.bind_asset(asset) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "loaded asset is unusable");
                None
            }
        }
    }

    fn bind_asset(&mut self, asset: LoadedAsset) -> Result<LocatorReport> {
        let metrics = AssetMetrics::from_bounds(&asset.bounds)?;
        let mut catalog = self.catalog.take().ok_or(Error::AlreadyResolved)?;

        let layout = FallbackLayout {
            radius: self.config.fallback_radius,
            height: self.config.fallback_height,
        };
        let report = match PoiLocator::new(layout).resolve(&mut catalog, &self.scene, asset.root, &metrics) {
            Ok(report) => report,
            Err(e) => {
                self.catalog = Some(catalog);
                return Err(e);
            }
        };

        self.scene.set_offset_frame(asset.root, metrics);
        for (poi, marker) in catalog.iter().zip(&self.nodes.markers) {
            if let Some(offset) = poi.offset() {
                self.scene.attach(*marker, asset.root, offset);
            }
        }
        if let Some(first) = catalog.get(0).and_then(PointOfInterest::offset) {
            self.scene.attach(self.nodes.avatar, asset.root, first);
        }

        self.coordinator.set_root(asset.root, asset.bounds);
        for node in self.nodes.markers.iter().chain([&self.nodes.avatar]) {
            self.coordinator.register_content(*node);
        }
        let searching = self.coordinator.context().phase() == SessionPhase::Active
            && self.placement_state() == PlacementState::Unplaced;
        for node in self.coordinator.content() {
            self.scene.set_visible(*node, !searching);
        }

        let settings = TourSettings::from_config(&self.config);
        let tour = TourController::new(catalog, self.nodes.avatar, settings)?;
        self.events.push(UiEvent::CurrentPoi { index: 0, id: tour.current().id });
        self.events.push(UiEvent::VisitedCount { visited: 0, total: tour.total() });
        self.tour = Some(tour);

        self.asset = AssetPhase::Ready {
            target: PlacementTarget {
                node: asset.root,
                metrics,
                world_size: self.config.ar_target_size,
            },
        };
        tracing::info!(root = %asset.root, max_dimension = metrics.max_dimension(), "asset bound");
        Ok(report)
    }

    pub fn on_session_start(&mut self) {
        self.coordinator.on_session_start(&mut self.scene);
        self.scene.set_visible(self.nodes.reticle, false);
        self.confirm_pending = false;
        self.events.push(UiEvent::PlacementChanged(PlacementState::Unplaced));
    }

    pub fn on_session_end(&mut self) {
        self.coordinator.on_session_end(&mut self.scene);
        self.scene.set_visible(self.nodes.reticle, false);
        self.confirm_pending = false;
    }

    /// Run one display frame
    pub fn on_frame(&mut self, now: Instant, platform: &mut dyn HitTestPlatform, frame: &dyn HitTestFrame) {
        if self.coordinator.context().phase() == SessionPhase::Active
            && self.placement_state() == PlacementState::Unplaced
        {
            self.search(platform, frame);
        }

        if let Some(tour) = self.tour.as_mut() {
            tour.tick(now, &mut self.scene);
        }
    }

    fn search(&mut self, platform: &mut dyn HitTestPlatform, frame: &dyn HitTestFrame) {
        let target = match &self.asset {
            AssetPhase::Ready { target } => Some(*target),
            AssetPhase::NoAsset => None,
        };
        // a confirm only counts for the frame it arrived in
        let confirm = std::mem::take(&mut self.confirm_pending);
        let (sample, outcome) =
            self.coordinator
                .search_frame(platform, frame, confirm, target.as_ref(), &mut self.scene);

        if let Some(failure) = self.coordinator.context_mut().tracker.take_failure() {
            self.events.push(UiEvent::ArUnavailable(failure.to_string()));
        }

        match outcome {
            PlacementOutcome::Placed(_) => {
                self.scene.set_visible(self.nodes.reticle, false);
                for node in self.coordinator.content() {
                    self.scene.set_visible(*node, true);
                }
                self.events.push(UiEvent::PlacementChanged(PlacementState::Placed));
            }
            _ => {
                self.scene.set_visible(self.nodes.reticle, sample.visible);
                if let Some(pose) = sample.pose {
                    self.scene.set_pose(self.nodes.reticle, pose);
                }
            }
        }
    }

    /// Apply a UI command. Tour commands only act while the tour content is
    /// on screen: in the preview, or once placed in AR.
    pub fn handle(&mut self, command: UiCommand, now: Instant) {
        if command == UiCommand::ConfirmPlacement {
            if self.coordinator.context().phase() == SessionPhase::Active
                && self.placement_state() == PlacementState::Unplaced
            {
                self.confirm_pending = true;
            }
            return;
        }
        if !self.tour_visible() {
            tracing::debug!(?command, "tour command ignored while searching");
            return;
        }

        let picked = match command {
            UiCommand::PickAt { x, y } => self.picked_marker(x, y),
            _ => None,
        };
        let Some(tour) = self.tour.as_mut() else {
            return;
        };
        match command {
            UiCommand::Next => tour.next(now),
            UiCommand::Previous => tour.previous(now),
            UiCommand::ShowCurrent => tour.show_current(),
            UiCommand::PickAt { .. } => {
                let id = picked.and_then(|index| tour.catalog().get(index)).map(|poi| poi.id);
                if let Some(id) = id {
                    tour.select(id, now);
                }
            }
            UiCommand::ConfirmPlacement => {}
        }
        self.forward_tour_events();
    }

    /// Catalog index of the marker under a screen point
    fn picked_marker(&self, x: f32, y: f32) -> Option<usize> {
        let picker = self.picker.as_ref()?;
        let node = picker.pick(&self.scene, x, y)?;
        self.nodes.markers.iter().position(|marker| *marker == node)
    }

    fn forward_tour_events(&mut self) {
        let Some(tour) = self.tour.as_mut() else {
            return;
        };
        for event in tour.drain_events() {
            let event = match event {
                TourEvent::CurrentChanged { index, id } => UiEvent::CurrentPoi { index, id },
                TourEvent::Visited { visited, total, .. } => UiEvent::VisitedCount { visited, total },
                TourEvent::ShowDetail(id) => match tour.catalog().by_id(id) {
                    Some(poi) => UiEvent::ShowDetail {
                        id,
                        title: poi.display_name.clone(),
                        description: poi.description.clone(),
                        icon: poi.icon.clone(),
                    },
                    None => continue,
                },
                TourEvent::CloseDetail => UiEvent::CloseDetail,
                TourEvent::TourComplete => UiEvent::TourComplete,
            };
            self.events.push(event);
        }
    }

    fn tour_visible(&self) -> bool {
        match self.coordinator.context().phase() {
            SessionPhase::Preview => true,
            SessionPhase::Active => self.placement_state() == PlacementState::Placed,
        }
    }

    /// Take the UI events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn placement_state(&self) -> PlacementState {
        self.coordinator.context().placement_state()
    }

    pub fn tracker_status(&self) -> TrackerStatus {
        self.coordinator.context().tracker.status()
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.coordinator.context().phase()
    }

    pub fn has_asset(&self) -> bool {
        matches!(self.asset, AssetPhase::Ready { .. })
    }

    pub fn current_poi(&self) -> Option<&PointOfInterest> {
        self.tour.as_ref().map(TourController::current)
    }

    /// `(visited, total)`
    pub fn visited_count(&self) -> (usize, usize) {
        match &self.tour {
            Some(tour) => (tour.visited_count(), tour.total()),
            None => (0, self.catalog.as_ref().map_or(0, PoiCatalog::len)),
        }
    }

    pub fn tour(&self) -> Option<&TourController> {
        self.tour.as_ref()
    }

    pub fn nodes(&self) -> &ContentNodes {
        &self.nodes
    }

    pub fn preview_camera(&self) -> &PreviewCamera {
        self.coordinator.camera()
    }

    pub fn preview_camera_mut(&mut self) -> &mut PreviewCamera {
        self.coordinator.camera_mut()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn config(&self) -> &ExperienceConfig {
        &self.config
    }
}
